//! Field registry: which text fields currently carry a controller.
//!
//! Keyed by element identity (the `Rc` allocation the host hands out)
//! and holding elements only weakly: the registry never keeps a field
//! alive, and entries for dropped elements are pruned on the next
//! discovery batch.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use super::{DropContext, FieldController, FieldState};
use crate::host::{CHAT_INPUT_SELECTOR, HostElement, ListenerId};

/// Identity key for a host element.
fn element_key(element: &Rc<dyn HostElement>) -> usize {
    Rc::as_ptr(element) as *const () as usize
}

#[derive(Debug)]
struct Attachment {
    element: Weak<dyn HostElement>,
    state: Rc<FieldState>,
    listener: ListenerId,
}

impl Attachment {
    fn is_live(&self) -> bool {
        self.element.strong_count() > 0
    }
}

/// Tracks attached fields and owns their [`FieldState`].
pub struct FieldRegistry {
    fields: HashMap<usize, Attachment>,
    ctx: DropContext,
}

impl FieldRegistry {
    pub fn new(ctx: DropContext) -> Self {
        Self {
            fields: HashMap::new(),
            ctx,
        }
    }

    /// Attach a controller to every chat input in a batch of newly
    /// inserted subtrees: the roots themselves and all matching
    /// descendants. Returns how many fields were newly attached.
    pub fn discover(&mut self, batch: &[Rc<dyn HostElement>]) -> usize {
        self.prune();
        let mut attached = 0;
        for node in batch {
            if node.matches(CHAT_INPUT_SELECTOR) && self.attach(node) {
                attached += 1;
            }
            for field in node.query_selector_all(CHAT_INPUT_SELECTOR) {
                if self.attach(&field) {
                    attached += 1;
                }
            }
        }
        if attached > 0 {
            tracing::debug!(attached, total = self.fields.len(), "attached chat inputs");
        }
        attached
    }

    /// Instrument `element`. Idempotent: returns `false` if the element
    /// is already attached.
    pub fn attach(&mut self, element: &Rc<dyn HostElement>) -> bool {
        let key = element_key(element);
        if self.fields.get(&key).is_some_and(Attachment::is_live) {
            return false;
        }

        let state = Rc::new(FieldState::new());
        let controller = FieldController::new(Rc::downgrade(element), state.clone(), self.ctx.clone());
        let listener = element.add_drag_listener(Rc::new(controller));
        self.fields.insert(
            key,
            Attachment {
                element: Rc::downgrade(element),
                state,
                listener,
            },
        );
        true
    }

    /// Remove the controller from `element` and destroy its state.
    /// Returns `false` if the element was not attached.
    pub fn detach(&mut self, element: &Rc<dyn HostElement>) -> bool {
        let Some(attachment) = self.fields.remove(&element_key(element)) else {
            return false;
        };
        attachment.state.release();
        element.remove_drag_listener(attachment.listener);
        element.set_drag_feedback(false);
        true
    }

    /// Detach and immediately re-attach every live field, so that no
    /// controller created before a settings change survives it. Any
    /// in-progress drag on those fields is reset.
    pub fn reattach_all(&mut self) -> usize {
        self.prune();
        let live: Vec<Rc<dyn HostElement>> = self
            .fields
            .values()
            .filter_map(|a| a.element.upgrade())
            .collect();
        for element in &live {
            self.detach(element);
            self.attach(element);
        }
        tracing::debug!(count = live.len(), "re-attached fields");
        live.len()
    }

    /// State of an attached field.
    pub fn state(&self, element: &Rc<dyn HostElement>) -> Option<Rc<FieldState>> {
        self.fields
            .get(&element_key(element))
            .filter(|a| a.is_live())
            .map(|a| a.state.clone())
    }

    pub fn is_attached(&self, element: &Rc<dyn HostElement>) -> bool {
        self.state(element).is_some()
    }

    /// Number of tracked fields, including any not yet pruned.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn prune(&mut self) {
        self.fields.retain(|_, a| {
            let live = a.is_live();
            if !live {
                a.state.release();
            }
            live
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{DragEvent, DragKind};
    use crate::testing::{FakeElement, Harness};

    fn dyn_el(el: &Rc<FakeElement>) -> Rc<dyn HostElement> {
        el.clone()
    }

    #[test]
    fn attach_is_idempotent() {
        let mut h = Harness::new();
        let field = FakeElement::chat_input();
        assert!(h.registry.attach(&dyn_el(&field)));
        assert!(!h.registry.attach(&dyn_el(&field)));
        assert_eq!(field.listener_count(), 1);
        assert_eq!(h.registry.len(), 1);
    }

    #[test]
    fn discover_matches_roots_and_descendants() {
        let mut h = Harness::new();
        let direct = FakeElement::chat_input();
        let wrapper = FakeElement::plain("section");
        let nested = FakeElement::chat_input();
        let inner = FakeElement::plain("div");
        let deep = FakeElement::chat_input();
        inner.append(deep.clone());
        wrapper.append(nested.clone());
        wrapper.append(inner);
        let unrelated = FakeElement::plain("span");

        let batch = vec![dyn_el(&direct), dyn_el(&wrapper), dyn_el(&unrelated)];
        assert_eq!(h.registry.discover(&batch), 3);
        assert!(h.registry.is_attached(&dyn_el(&direct)));
        assert!(h.registry.is_attached(&dyn_el(&nested)));
        assert!(h.registry.is_attached(&dyn_el(&deep)));
        assert!(!h.registry.is_attached(&dyn_el(&wrapper)));
        assert_eq!(wrapper.listener_count(), 0);

        // Rediscovering the same subtree attaches nothing new.
        assert_eq!(h.registry.discover(&batch), 0);
        assert_eq!(nested.listener_count(), 1);
    }

    #[test]
    fn detach_removes_listener_and_state() {
        let mut h = Harness::new();
        let field = FakeElement::chat_input();
        h.registry.attach(&dyn_el(&field));
        field.fire(DragEvent::new(DragKind::Enter));
        let state = h.registry.state(&dyn_el(&field)).unwrap();

        assert!(h.registry.detach(&dyn_el(&field)));
        assert_eq!(field.listener_count(), 0);
        assert!(!field.armed());
        assert!(!state.is_attached());
        assert!(!h.registry.is_attached(&dyn_el(&field)));
        assert!(!h.registry.detach(&dyn_el(&field)));

        // Events after detach reach nobody.
        let (ev, _) = field.fire(DragEvent::new(DragKind::Enter));
        assert!(!ev.default_prevented());
    }

    #[test]
    fn reattach_resets_drag_state() {
        let mut h = Harness::new();
        let a = FakeElement::chat_input();
        let b = FakeElement::chat_input();
        h.registry.discover(&[dyn_el(&a), dyn_el(&b)]);
        a.fire(DragEvent::new(DragKind::Enter));
        a.fire(DragEvent::new(DragKind::Enter));
        let old = h.registry.state(&dyn_el(&a)).unwrap();

        assert_eq!(h.registry.reattach_all(), 2);

        let fresh = h.registry.state(&dyn_el(&a)).unwrap();
        assert!(!Rc::ptr_eq(&old, &fresh));
        assert!(!old.is_attached());
        assert_eq!(fresh.drag_depth(), 0);
        assert!(!a.armed());
        assert_eq!(a.listener_count(), 1);
        assert_eq!(b.listener_count(), 1);
    }

    #[test]
    fn dropped_elements_are_pruned() {
        let mut h = Harness::new();
        let gone = FakeElement::chat_input();
        let kept = FakeElement::chat_input();
        h.registry.discover(&[dyn_el(&gone), dyn_el(&kept)]);
        assert_eq!(h.registry.len(), 2);

        // The element's listener list holds the controller, which holds
        // the element weakly, so dropping the last handle frees it.
        drop(gone);
        h.registry.discover(&[]);
        assert_eq!(h.registry.len(), 1);
        assert_eq!(h.registry.reattach_all(), 1);
    }
}

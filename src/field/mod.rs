//! Field controller: per-field drag state machine.
//!
//! States are `Idle` (`drag_depth == 0`) and `Hovering` (`drag_depth >= 1`).
//! Nested children of a field fire their own enter/leave pairs, so the
//! hover state is a signed counter, clamped and cleared once it drops to
//! zero or below.
//!
//! While `settings.enabled` is false every handler leaves the native
//! event alone, clears feedback and resets the depth, so toggling the
//! feature off mid-drag never leaves a field armed.

pub mod registry;

use std::cell::Cell;
use std::rc::{Rc, Weak};

use futures::FutureExt;

pub use registry::FieldRegistry;

use crate::emote::classify;
use crate::host::{DragEvent, DragKind, DragListener, DropEffect, DropTask, HostElement};
use crate::insert::Inserter;
use crate::resolver::ResolverSet;
use crate::settings::SharedSettings;

/// Per-field bookkeeping. Created fresh on every attach.
#[derive(Debug)]
pub struct FieldState {
    drag_depth: Cell<i32>,
    attached: Cell<bool>,
}

impl FieldState {
    fn new() -> Self {
        Self {
            drag_depth: Cell::new(0),
            attached: Cell::new(true),
        }
    }

    pub fn drag_depth(&self) -> i32 {
        self.drag_depth.get()
    }

    /// False once the registry has detached this field.
    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    fn release(&self) {
        self.attached.set(false);
        self.drag_depth.set(0);
    }
}

/// Collaborators every controller needs. Cheap to clone.
#[derive(Clone)]
pub struct DropContext {
    pub settings: SharedSettings,
    pub resolvers: Rc<ResolverSet>,
    pub inserter: Inserter,
}

/// Drag handlers for one text field.
///
/// Holds the element weakly; the host document owns it.
pub struct FieldController {
    field: Weak<dyn HostElement>,
    state: Rc<FieldState>,
    ctx: DropContext,
}

impl FieldController {
    fn new(field: Weak<dyn HostElement>, state: Rc<FieldState>, ctx: DropContext) -> Self {
        Self { field, state, ctx }
    }

    fn disarm(&self, field: &dyn HostElement) {
        self.state.drag_depth.set(0);
        field.set_drag_feedback(false);
    }

    fn on_enter(&self, field: &dyn HostElement, event: &mut DragEvent) {
        event.prevent_default();
        event.stop_propagation();
        self.state.drag_depth.set(self.state.drag_depth.get() + 1);
        field.set_drag_feedback(true);
    }

    fn on_leave(&self, field: &dyn HostElement, event: &mut DragEvent) {
        event.prevent_default();
        event.stop_propagation();
        let depth = self.state.drag_depth.get() - 1;
        if depth <= 0 {
            self.disarm(field);
        } else {
            self.state.drag_depth.set(depth);
        }
    }

    fn on_over(&self, event: &mut DragEvent) {
        event.prevent_default();
        event.stop_propagation();
        event.set_drop_effect(DropEffect::Copy);
    }

    fn on_drop(&self, field: &dyn HostElement, event: &mut DragEvent) -> Option<DropTask> {
        let Some(emote) = classify(event.text()) else {
            // Not an emote: let the browser perform its native drop.
            self.disarm(field);
            return None;
        };

        event.prevent_default();
        event.stop_propagation();
        self.disarm(field);

        if !self.ctx.settings.provider_enabled(emote.provider) {
            tracing::debug!(provider = %emote.provider, "provider disabled, ignoring drop");
            return None;
        }

        let settings = self.ctx.settings.clone();
        let resolvers = self.ctx.resolvers.clone();
        let inserter = self.ctx.inserter.clone();
        let state = self.state.clone();
        let target = self.field.clone();

        let task = async move {
            // A settings push may land before the host first polls us.
            if !settings.provider_enabled(emote.provider) {
                tracing::debug!(provider = %emote.provider, "provider disabled before resolution");
                return;
            }
            let resolver = resolvers.get(emote.provider);
            let Some(keyword) = resolver.resolve(&emote.id).await else {
                return;
            };
            if !state.is_attached() {
                tracing::debug!(%keyword, "field detached during resolution, discarding");
                return;
            }
            let Some(field) = target.upgrade() else {
                return;
            };
            inserter.insert(&*field, &keyword).await;
        };
        Some(task.boxed_local())
    }
}

impl DragListener for FieldController {
    fn handle(&self, event: &mut DragEvent) -> Option<DropTask> {
        let field = self.field.upgrade()?;

        if !self.ctx.settings.enabled() {
            self.disarm(&*field);
            return None;
        }

        match event.kind() {
            DragKind::Enter => {
                self.on_enter(&*field, event);
                None
            }
            DragKind::Leave => {
                self.on_leave(&*field, event);
                None
            }
            DragKind::Over => {
                self.on_over(event);
                None
            }
            DragKind::Drop => self.on_drop(&*field, event),
        }
    }
}

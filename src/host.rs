//! Host page seam.
//!
//! The core never touches a concrete DOM. The host adapter implements
//! [`HostElement`] for its elements and [`Clipboard`] for the page
//! clipboard, delivers drag events to installed [`DragListener`]s, and
//! drives any [`DropTask`] a listener hands back.

use std::collections::HashMap;
use std::rc::Rc;

use futures::future::LocalBoxFuture;

/// Attribute selector identifying chat input fields.
pub const CHAT_INPUT_SELECTOR: &str = r#"div[data-a-target="chat-input"]"#;

/// Errors reported by the host adapter.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("clipboard: {0}")]
    Clipboard(String),
    #[error("dispatch: {0}")]
    Dispatch(String),
}

/// Handle identifying one installed listener on one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// An element of the host document.
pub trait HostElement {
    /// Whether this element matches a CSS selector.
    fn matches(&self, selector: &str) -> bool;

    /// All descendants matching a CSS selector, in document order.
    fn query_selector_all(&self, selector: &str) -> Vec<Rc<dyn HostElement>>;

    /// Whether the element accepts rich text input.
    fn is_content_editable(&self) -> bool;

    /// Show or clear the "armed" drop-target styling. Idempotent.
    fn set_drag_feedback(&self, armed: bool);

    fn focus(&self);

    /// Install a capture-phase listener for dragenter, dragleave,
    /// dragover and drop.
    fn add_drag_listener(&self, listener: Rc<dyn DragListener>) -> ListenerId;

    /// Remove a listener previously returned by [`add_drag_listener`].
    ///
    /// [`add_drag_listener`]: HostElement::add_drag_listener
    fn remove_drag_listener(&self, id: ListenerId);

    /// Dispatch a synthetic paste event at this element.
    fn dispatch_paste(&self, event: PasteEvent) -> Result<(), HostError>;
}

/// The page clipboard.
pub trait Clipboard {
    fn write_text<'a>(&'a self, text: &'a str) -> LocalBoxFuture<'a, Result<(), HostError>>;
}

/// The asynchronous remainder of a drop, resolved after the
/// synchronous handler returns. The host must poll it to completion.
pub type DropTask = LocalBoxFuture<'static, ()>;

/// Receives drag events for one element.
pub trait DragListener {
    fn handle(&self, event: &mut DragEvent) -> Option<DropTask>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Enter,
    Leave,
    Over,
    Drop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropEffect {
    Copy,
}

/// A drag event in flight, mirroring the platform's mutable event
/// object: handlers record their decisions on it and the host applies
/// them after dispatch.
#[derive(Debug, Clone)]
pub struct DragEvent {
    kind: DragKind,
    data: HashMap<String, String>,
    default_prevented: bool,
    propagation_stopped: bool,
    drop_effect: Option<DropEffect>,
}

impl DragEvent {
    pub fn new(kind: DragKind) -> Self {
        Self {
            kind,
            data: HashMap::new(),
            default_prevented: false,
            propagation_stopped: false,
            drop_effect: None,
        }
    }

    /// Attach a payload entry in the given format.
    pub fn with_data(mut self, format: &str, value: &str) -> Self {
        self.data.insert(format.to_string(), value.to_string());
        self
    }

    pub fn kind(&self) -> DragKind {
        self.kind
    }

    /// Payload in the given format, if any.
    pub fn data(&self, format: &str) -> Option<&str> {
        self.data.get(format).map(String::as_str)
    }

    /// Dropped plain text: `text`, falling back to `text/plain`.
    pub fn text(&self) -> &str {
        self.data("text")
            .filter(|s| !s.is_empty())
            .or_else(|| self.data("text/plain"))
            .unwrap_or_default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn set_drop_effect(&mut self, effect: DropEffect) {
        self.drop_effect = Some(effect);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn drop_effect(&self) -> Option<DropEffect> {
        self.drop_effect
    }
}

/// A synthetic paste carrying `text/plain` content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteEvent {
    pub text: String,
    pub bubbles: bool,
    pub cancelable: bool,
}

impl PasteEvent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bubbles: true,
            cancelable: true,
        }
    }
}

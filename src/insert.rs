//! Insertion engine: hands a keyword to the host's own paste path.
//!
//! The keyword plus a trailing space is staged on the clipboard and a
//! synthetic paste is dispatched at the field, so the host page applies
//! its native insertion, formatting and mention parsing.

use std::rc::Rc;

use crate::host::{Clipboard, HostElement, HostError, PasteEvent};

/// Stages keywords into text fields via clipboard + paste.
#[derive(Clone)]
pub struct Inserter {
    clipboard: Rc<dyn Clipboard>,
}

impl Inserter {
    pub fn new(clipboard: Rc<dyn Clipboard>) -> Self {
        Self { clipboard }
    }

    /// Insert `keyword` into `field`.
    ///
    /// No-op unless the field accepts rich text. Failures are logged and
    /// swallowed; nothing is retried.
    pub async fn insert(&self, field: &dyn HostElement, keyword: &str) -> bool {
        if !field.is_content_editable() {
            tracing::debug!("insert target is not editable");
            return false;
        }
        match self.stage(field, keyword).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "insert failed");
                false
            }
        }
    }

    async fn stage(&self, field: &dyn HostElement, keyword: &str) -> Result<(), HostError> {
        field.focus();
        let text = format!("{keyword} ");
        self.clipboard.write_text(&text).await?;
        field.dispatch_paste(PasteEvent::new(text))
    }
}

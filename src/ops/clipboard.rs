// Clipboard seam. The real sink opens the system clipboard fresh on
// every write; holding one open across calls keeps other applications
// locked out on some platforms.

use arboard::Clipboard;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClipboardError {
    #[error("Could not open clipboard: {0}")]
    Unavailable(String),
    #[error("Could not write clipboard: {0}")]
    WriteFailed(String),
}

pub trait ClipboardSink: Send + Sync {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Clipboard sink backed by arboard.
#[derive(Default)]
pub struct ArboardClipboard;

impl ArboardClipboard {
    pub fn new() -> Self {
        Self
    }
}

impl ClipboardSink for ArboardClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|e| ClipboardError::WriteFailed(e.to_string()))
    }
}

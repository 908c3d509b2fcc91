use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(#[from] arboard::Error),

    #[error("Clipboard task failed: {0}")]
    Task(String),
}

/// Host clipboard-write primitive used by the copy action.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClipboardWriter: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// System clipboard through `arboard`.
///
/// The handle is opened on first use and kept for the life of the process; on X11
/// the copied text is only served while a handle exists.
#[derive(Clone, Default)]
pub struct SystemClipboard {
    clipboard: Arc<Mutex<Option<arboard::Clipboard>>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClipboardWriter for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let slot = Arc::clone(&self.clipboard);
        let text = text.to_owned();

        tokio::task::spawn_blocking(move || -> Result<(), ClipboardError> {
            let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
            let mut clipboard = match guard.take() {
                Some(clipboard) => clipboard,
                None => arboard::Clipboard::new()?,
            };
            let result = clipboard.set_text(text);
            *guard = Some(clipboard);
            result?;
            Ok(())
        })
        .await
        .map_err(|e| ClipboardError::Task(e.to_string()))?
    }
}

//! Services module - the external collaborators of the session core.
//!
//! Everything here is reached through a trait so the session core never depends on a
//! concrete engine, file system or clipboard:
//!
//! - [`OcrBackend`]: accepts a batch of paths plus the session's event sender and
//!   reports one event per path. [`CommandOcrBackend`] runs an external program per
//!   file (by default the `llm` CLI with an OCR-to-Markdown prompt).
//! - [`FileExporter`]: writes recognized text to disk ([`FsExporter`]).
//! - [`ClipboardWriter`]: puts recognized text on the clipboard ([`SystemClipboard`]).
//!
//! The traits use `async_trait` so they stay object-safe behind `Arc<dyn _>`.

pub mod clipboard;
pub mod export;
pub mod ocr;

pub use clipboard::{ClipboardError, ClipboardWriter, SystemClipboard};
pub use export::{ExportError, FileExporter, FsExporter};
pub use ocr::{CommandOcrBackend, InvocationError, OcrBackend, OcrError};

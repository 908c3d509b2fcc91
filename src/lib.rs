// ocrdrop - drop files, get OCR'd Markdown
//
// This is the library crate containing job tracking, event reconciliation and the
// collaborator adapters. The binary crate (main.rs) serves a host shell over stdio.

pub mod actions;
pub mod channel;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use actions::{ActionError, ActionGate};
pub use channel::{ChannelClosed, EventChannel, EventSender};
pub use config::ConfigManager;
pub use dispatch::{Dispatcher, PendingBatch};
pub use metrics::Metrics;
pub use models::{JobPath, JobStatus, OcrEvent, SessionId, UserConfig};
pub use state::{Reconciliation, SessionController, StateChange};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

//! Data models for the ocrdrop client.
//!
//! - [`JobPath`], [`JobStatus`], [`OcrEvent`] and the pure [`apply`] transition function
//! - [`ActionKind`], [`ActionState`], [`ActionSlots`]: post-completion export/copy slots
//! - [`Session`], [`PathRegistry`], [`SessionId`]: one session's registry and job map
//! - [`UserConfig`] and its sections, loaded from `OcrDrop Config.yaml`
//!
//! # Architecture Note
//!
//! Models hold no locks and spawn nothing. [`Session`] is owned by the
//! [`SessionController`](crate::state::SessionController), which serializes every
//! mutation and broadcasts the resulting changes.

pub mod action;
pub mod config;
pub mod job;
pub mod session;

pub use action::{ActionKind, ActionSlots, ActionState};
pub use config::{DEFAULT_OCR_PROMPT, ExportSettings, LogSettings, OcrSettings, UserConfig};
pub use job::{JobPath, JobStatus, OcrEvent, apply};
pub use session::{JobEntry, JobView, PathRegistry, Session, SessionId};

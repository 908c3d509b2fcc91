//! Export and copy actions on completed jobs.

use crate::models::{ActionKind, ActionState, ExportSettings, JobPath};
use crate::services::{ClipboardError, ClipboardWriter, ExportError, FileExporter};
use crate::state::{ActionUnavailable, SessionController};
use camino::Utf8PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ActionError {
    #[error(transparent)]
    Unavailable(#[from] ActionUnavailable),

    #[error("Export failed: {0}")]
    Export(#[source] ExportError),

    #[error("Copy failed: {0}")]
    Clipboard(#[source] ClipboardError),

    #[error("session was reset while the action was running")]
    SessionChanged,
}

/// Runs export/copy for a job and records the outcome in its action slot.
///
/// Only `Complete` jobs are accepted. A failed attempt marks the slot `Failed` but
/// leaves it invocable; the next attempt overwrites the state.
pub struct ActionGate {
    controller: SessionController,
    exporter: Arc<dyn FileExporter>,
    clipboard: Arc<dyn ClipboardWriter>,
    extension: String,
}

impl ActionGate {
    pub fn new(
        controller: SessionController,
        exporter: Arc<dyn FileExporter>,
        clipboard: Arc<dyn ClipboardWriter>,
        settings: &ExportSettings,
    ) -> Self {
        Self {
            controller,
            exporter,
            clipboard,
            extension: settings.extension.clone(),
        }
    }

    /// File the export of `path` is written to.
    pub fn export_target(&self, path: &JobPath) -> Utf8PathBuf {
        path.export_target(&self.extension)
    }

    pub async fn invoke(
        &self,
        kind: ActionKind,
        path: &JobPath,
    ) -> Result<ActionState, ActionError> {
        let input = self.controller.action_input(path, kind).inspect_err(|e| {
            tracing::warn!("Rejected {} for {}: {}", kind, path, e);
        })?;

        let outcome = match kind {
            ActionKind::Export => {
                let target = self.export_target(path);
                tracing::info!("Exporting {} to {}", path, target);
                self.exporter
                    .write_file(&target, &input.text)
                    .await
                    .map_err(ActionError::Export)
            }
            ActionKind::Copy => {
                tracing::info!("Copying text of {} to clipboard", path);
                self.clipboard
                    .write_text(&input.text)
                    .await
                    .map_err(ActionError::Clipboard)
            }
        };

        let recorded = match &outcome {
            Ok(()) => self.controller.record_action(input.session, path, kind, &Ok(())),
            Err(e) => {
                tracing::error!("{} of {} failed: {}", kind, path, e);
                self.controller
                    .record_action(input.session, path, kind, &Err(e.to_string()))
            }
        };

        match (outcome, recorded) {
            (Err(e), _) => Err(e),
            (Ok(()), Some(state)) => Ok(state),
            (Ok(()), None) => Err(ActionError::SessionChanged),
        }
    }
}

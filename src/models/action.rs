use crate::models::JobStatus;
use serde::Serialize;
use std::fmt;

/// Post-completion action offered on a finished job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    /// Write the recognized text next to the source file as Markdown.
    Export,
    /// Put the recognized text on the system clipboard.
    Copy,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Export => f.write_str("export"),
            ActionKind::Copy => f.write_str("copy"),
        }
    }
}

/// Visual state of one action slot.
///
/// `Succeeded` and `Failed` only record the outcome of the latest attempt; neither
/// locks the slot, so a completed job's actions stay invocable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ActionState {
    #[default]
    Disabled,
    Enabled,
    Succeeded,
    Failed,
}

impl ActionState {
    pub fn is_invocable(self) -> bool {
        !matches!(self, ActionState::Disabled)
    }
}

/// Export and copy slots of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct ActionSlots {
    pub export: ActionState,
    pub copy: ActionState,
}

impl ActionSlots {
    /// Slots derived from a job status: enabled only once the job is complete.
    pub fn for_status(status: &JobStatus) -> Self {
        let state = match status {
            JobStatus::Complete { .. } => ActionState::Enabled,
            JobStatus::Processing | JobStatus::Failed { .. } => ActionState::Disabled,
        };
        Self {
            export: state,
            copy: state,
        }
    }

    pub fn get(&self, kind: ActionKind) -> ActionState {
        match kind {
            ActionKind::Export => self.export,
            ActionKind::Copy => self.copy,
        }
    }

    pub fn set(&mut self, kind: ActionKind, state: ActionState) {
        match kind {
            ActionKind::Export => self.export = state,
            ActionKind::Copy => self.copy = state,
        }
    }
}

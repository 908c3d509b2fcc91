use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one submitted file.
///
/// Equality is exact-string: `a.png` and `./a.png` are different jobs. The path is the
/// only key correlating registry membership, job status and channel events, so it is
/// never normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobPath(String);

impl JobPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display name: the last component after either `/` or `\`.
    ///
    /// Both separators are honored on every platform.
    pub fn file_name(&self) -> &str {
        match self.0.rfind(['/', '\\']) {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Where the exported Markdown for this job is written.
    ///
    /// The extension of the source file is replaced by `extension`. A path without an
    /// extension gets one appended, so the export never overwrites the source file.
    /// The file name is split off at the last `/` or `\` on every platform, so dots
    /// in directory names never count as an extension.
    pub fn export_target(&self, extension: &str) -> Utf8PathBuf {
        let (dir, name) = match self.0.rfind(['/', '\\']) {
            Some(idx) => self.0.split_at(idx + 1),
            None => ("", self.0.as_str()),
        };
        let stem = match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name,
        };
        Utf8PathBuf::from(format!("{dir}{stem}.{extension}"))
    }
}

impl fmt::Display for JobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobPath {
    fn from(path: String) -> Self {
        Self(path)
    }
}

impl From<&str> for JobPath {
    fn from(path: &str) -> Self {
        Self(path.to_string())
    }
}

impl AsRef<str> for JobPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Per-path job state.
///
/// `Processing` is the only non-terminal state. `Complete` and `Failed` never
/// transition again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum JobStatus {
    Processing,
    Complete { text: String },
    Failed { message: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Processing)
    }

    /// Recognized text, only for completed jobs.
    pub fn text(&self) -> Option<&str> {
        match self {
            JobStatus::Complete { text } => Some(text),
            _ => None,
        }
    }

    /// Failure annotation, only for failed jobs.
    pub fn failure(&self) -> Option<&str> {
        match self {
            JobStatus::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Complete { .. } => "complete",
            JobStatus::Failed { .. } => "failed",
        }
    }
}

/// Progress event delivered by the OCR backend on the event channel.
///
/// Wire shape: `{"event":"success","data":{"path":..,"ocrText":..}}` or
/// `{"event":"error","data":{"path":..,"message":..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "event", content = "data")]
pub enum OcrEvent {
    #[serde(rename_all = "camelCase")]
    Success { path: JobPath, ocr_text: String },
    #[serde(rename_all = "camelCase")]
    Error { path: JobPath, message: String },
}

impl OcrEvent {
    pub fn success(path: impl Into<JobPath>, ocr_text: impl Into<String>) -> Self {
        OcrEvent::Success {
            path: path.into(),
            ocr_text: ocr_text.into(),
        }
    }

    pub fn error(path: impl Into<JobPath>, message: impl Into<String>) -> Self {
        OcrEvent::Error {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn path(&self) -> &JobPath {
        match self {
            OcrEvent::Success { path, .. } | OcrEvent::Error { path, .. } => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OcrEvent::Success { .. } => "success",
            OcrEvent::Error { .. } => "error",
        }
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Pure transition function of the per-path state machine.
///
/// Total over all inputs: a terminal status is returned unchanged whatever the event,
/// and `Processing` moves to exactly one terminal state. The event's path is not
/// consulted; matching an event to its job is the caller's concern.
pub fn apply(status: JobStatus, event: &OcrEvent) -> JobStatus {
    match status {
        JobStatus::Processing => match event {
            OcrEvent::Success { ocr_text, .. } => JobStatus::Complete {
                text: ocr_text.clone(),
            },
            OcrEvent::Error { message, .. } => JobStatus::Failed {
                message: message.clone(),
            },
        },
        terminal => terminal,
    }
}

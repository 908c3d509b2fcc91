use crate::channel::EventSender;
use crate::models::{JobPath, OcrEvent, OcrSettings};
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

/// The processing request itself failed; no event will arrive for its paths.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvocationError {
    #[error("OCR engine is not configured")]
    EngineNotConfigured,

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Per-file engine failure, delivered as an `error` event.
#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Failed to start OCR engine '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("OCR engine timed out after {0:?}")]
    Timeout(Duration),

    #[error("OCR engine failed ({status}): {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("OCR engine output is not valid UTF-8")]
    InvalidOutput,
}

/// Out-of-process text recognition.
///
/// A request carries a batch of paths and the session's event sender. It returns once
/// the work is handed off; results arrive later as one event per path. An `Err` means
/// the request was rejected as a whole.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OcrBackend: Send + Sync {
    async fn process_files(
        &self,
        paths: Vec<JobPath>,
        events: EventSender,
    ) -> Result<(), InvocationError>;
}

/// Runs an external OCR program once per file.
///
/// Each path gets its own tokio task, so a slow file never holds up its siblings. The
/// program's trimmed stdout is the recognized text.
#[derive(Debug, Clone)]
pub struct CommandOcrBackend {
    settings: Arc<OcrSettings>,
}

impl CommandOcrBackend {
    pub fn new(settings: OcrSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &OcrSettings {
        &self.settings
    }

    /// Expand the argument template for one file.
    pub fn build_args(settings: &OcrSettings, path: &JobPath) -> Vec<String> {
        settings
            .args
            .iter()
            .map(|arg| {
                arg.replace("{model}", &settings.model)
                    .replace("{prompt}", &settings.prompt)
                    .replace("{path}", path.as_str())
            })
            .collect()
    }

    /// Run the engine on one file and return its text.
    pub async fn recognize(settings: &OcrSettings, path: &JobPath) -> Result<String, OcrError> {
        let args = Self::build_args(settings, path);
        tracing::debug!("Running OCR engine: {} {:?}", settings.program, args);

        let mut cmd = Command::new(&settings.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let output = timeout(settings.timeout(), cmd.output())
            .await
            .map_err(|_| {
                tracing::warn!("OCR engine timed out on {} after {:?}", path, settings.timeout());
                OcrError::Timeout(settings.timeout())
            })?
            .map_err(|source| OcrError::Spawn {
                program: settings.program.clone(),
                source,
            })?;

        tracing::info!(
            "OCR engine finished {} in {:.2}s with {}",
            path,
            start.elapsed().as_secs_f32(),
            output.status
        );

        if !output.status.success() {
            return Err(OcrError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8(output.stdout).map_err(|_| OcrError::InvalidOutput)?;
        Ok(text.trim().to_string())
    }

    /// Why the engine cannot be run on `path`, if it cannot.
    fn path_problem(path: &JobPath) -> Option<&'static str> {
        if path.as_str().is_empty() {
            Some("path is empty")
        } else if path.as_str().contains('\0') {
            Some("path contains a NUL byte")
        } else {
            None
        }
    }
}

#[async_trait]
impl OcrBackend for CommandOcrBackend {
    async fn process_files(
        &self,
        paths: Vec<JobPath>,
        events: EventSender,
    ) -> Result<(), InvocationError> {
        tracing::info!("Processing {} file(s) for session {}", paths.len(), events.session());
        if self.settings.program.trim().is_empty() {
            return Err(InvocationError::EngineNotConfigured);
        }
        if events.is_closed() {
            return Err(InvocationError::Unavailable(
                "event channel is closed".to_string(),
            ));
        }

        let count = paths.len();
        for path in paths {
            if let Some(problem) = Self::path_problem(&path) {
                tracing::warn!("Rejecting {:?}: {}", path.as_str(), problem);
                if let Err(e) = events.send(OcrEvent::error(path, problem)) {
                    tracing::warn!("Dropping result for {:?}: {}", e.event.path().as_str(), e);
                }
                continue;
            }

            let settings = Arc::clone(&self.settings);
            let events = events.clone();

            tokio::spawn(async move {
                let event = match Self::recognize(&settings, &path).await {
                    Ok(ocr_text) => {
                        tracing::info!("Success for {} (text length: {})", path, ocr_text.len());
                        OcrEvent::Success { path, ocr_text }
                    }
                    Err(e) => {
                        tracing::warn!("OCR failed for {}: {}", path, e);
                        OcrEvent::Error {
                            path,
                            message: e.to_string(),
                        }
                    }
                };

                if let Err(e) = events.send(event) {
                    tracing::warn!("Dropping result for {}: {}", e.event.path(), e);
                }
            });
        }

        tracing::debug!("Spawned OCR tasks for {} file(s)", count);
        Ok(())
    }
}

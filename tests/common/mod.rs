//! Shared fakes for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use ocrdrop::models::JobStatus;
use ocrdrop::services::{ClipboardError, ClipboardWriter, InvocationError, OcrBackend};
use ocrdrop::{EventSender, JobPath, OcrEvent, SessionController};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, sleep, timeout};

/// What the scripted backend reports for one path
#[derive(Debug, Clone)]
pub enum Outcome {
    Success(String),
    Error(String),
    /// Never reports; the test sends events through a captured sender
    Silent,
}

/// Backend that answers from a script instead of running an engine
#[derive(Default)]
pub struct ScriptedBackend {
    script: HashMap<String, Outcome>,
    reject_with: Option<InvocationError>,
    /// Report events in reverse submission order
    reverse: bool,
    requests: Mutex<Vec<Vec<JobPath>>>,
    senders: Mutex<Vec<EventSender>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, outcome: Outcome) -> Self {
        self.script.insert(path.to_string(), outcome);
        self
    }

    pub fn rejecting(mut self, error: InvocationError) -> Self {
        self.reject_with = Some(error);
        self
    }

    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn requests(&self) -> Vec<Vec<JobPath>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn sender(&self, index: usize) -> EventSender {
        self.senders.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl OcrBackend for ScriptedBackend {
    async fn process_files(
        &self,
        paths: Vec<JobPath>,
        events: EventSender,
    ) -> Result<(), InvocationError> {
        self.requests.lock().unwrap().push(paths.clone());
        self.senders.lock().unwrap().push(events.clone());

        if let Some(error) = &self.reject_with {
            return Err(error.clone());
        }

        let mut ordered = paths;
        if self.reverse {
            ordered.reverse();
        }

        for path in ordered {
            let event = match self.script.get(path.as_str()) {
                Some(Outcome::Success(text)) => OcrEvent::success(path, text.clone()),
                Some(Outcome::Error(message)) => OcrEvent::error(path, message.clone()),
                Some(Outcome::Silent) | None => continue,
            };
            let _ = events.send(event);
        }
        Ok(())
    }
}

/// Clipboard that records what was copied
#[derive(Default)]
pub struct RecordingClipboard {
    pub copied: Mutex<Vec<String>>,
    pub fail: bool,
}

#[async_trait]
impl ClipboardWriter for RecordingClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        if self.fail {
            return Err(ClipboardError::Task("clipboard is locked".to_string()));
        }
        self.copied.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Wait until `path` reaches `expected` or panic after 1s
pub async fn wait_for_status(controller: &SessionController, path: &str, expected: JobStatus) {
    let path = JobPath::from(path);
    let reached = timeout(Duration::from_secs(5), async {
        while controller.status(&path).as_ref() != Some(&expected) {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    assert!(
        reached.is_ok(),
        "Timeout waiting for {} to become {:?}, got {:?}",
        path,
        expected,
        controller.status(&path)
    );
}

pub fn complete(text: &str) -> JobStatus {
    JobStatus::Complete {
        text: text.to_string(),
    }
}

pub fn failed(message: &str) -> JobStatus {
    JobStatus::Failed {
        message: message.to_string(),
    }
}

pub fn shared(backend: ScriptedBackend) -> Arc<ScriptedBackend> {
    Arc::new(backend)
}

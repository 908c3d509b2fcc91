//! Batch submission.
//!
//! Submitting a batch happens in two steps. [`Dispatcher::admit`] registers the new
//! paths synchronously, so every admitted path is already `Processing` before any
//! backend work exists for it. [`PendingBatch::send`] then issues the backend request
//! and, if the request itself fails, marks the whole batch `Failed`.

use crate::channel::{EventChannel, EventSender};
use crate::models::{JobPath, SessionId};
use crate::services::{InvocationError, OcrBackend};
use crate::state::SessionController;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Owns the session's event channel and hands batches to the backend.
pub struct Dispatcher {
    controller: SessionController,
    backend: Arc<dyn OcrBackend>,
    /// Channel of the current session, opened on the first non-empty batch
    channel: Mutex<Option<EventChannel>>,
}

impl Dispatcher {
    pub fn new(controller: SessionController, backend: Arc<dyn OcrBackend>) -> Self {
        Self {
            controller,
            backend,
            channel: Mutex::new(None),
        }
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Whether the current session has an open event channel.
    pub fn has_channel(&self) -> bool {
        self.channel_lock()
            .as_ref()
            .is_some_and(|channel| channel.session() == self.controller.session_id())
    }

    fn channel_lock(&self) -> MutexGuard<'_, Option<EventChannel>> {
        self.channel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a batch and prepare its backend request.
    ///
    /// Returns `None` when nothing in the batch is new; no channel is opened and the
    /// backend is not contacted in that case.
    pub fn admit<I, P>(&self, batch: I) -> Option<PendingBatch>
    where
        I: IntoIterator<Item = P>,
        P: Into<JobPath>,
    {
        // Held across registration so a concurrent reset cannot slip in between
        let mut slot = self.channel_lock();

        let (session, paths) = self.controller.register_batch(batch);
        if paths.is_empty() {
            tracing::debug!("Nothing new to process in session {}", session);
            return None;
        }

        let existing = slot
            .as_ref()
            .filter(|channel| channel.session() == session)
            .map(EventChannel::sender);

        let events = match existing {
            Some(events) => events,
            None => {
                let channel = EventChannel::open(self.controller.clone(), session);
                let events = channel.sender();
                if let Some(stale) = slot.replace(channel) {
                    stale.close();
                }
                events
            }
        };

        Some(PendingBatch {
            session,
            paths,
            events,
            backend: Arc::clone(&self.backend),
            controller: self.controller.clone(),
        })
    }

    /// Admit a batch and send it in one go. Returns the admitted paths.
    pub async fn submit<I, P>(&self, batch: I) -> Vec<JobPath>
    where
        I: IntoIterator<Item = P>,
        P: Into<JobPath>,
    {
        let Some(pending) = self.admit(batch) else {
            return Vec::new();
        };

        let paths = pending.paths().to_vec();
        if let Err(e) = pending.send().await {
            tracing::debug!("Batch of {} path(s) rejected: {}", paths.len(), e);
        }
        paths
    }

    /// Start a fresh session and abandon the current channel.
    pub fn reset(&self) -> SessionId {
        let mut slot = self.channel_lock();
        let session = self.controller.reset();
        if let Some(channel) = slot.take() {
            channel.close();
        }
        session
    }
}

/// Admitted paths whose backend request has not been issued yet.
pub struct PendingBatch {
    session: SessionId,
    paths: Vec<JobPath>,
    events: EventSender,
    backend: Arc<dyn OcrBackend>,
    controller: SessionController,
}

impl PendingBatch {
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn paths(&self) -> &[JobPath] {
        &self.paths
    }

    /// Issue the backend request.
    ///
    /// On failure every path of the batch that is still processing becomes `Failed`
    /// with `Invocation error: <reason>`. There is no retry.
    pub async fn send(self) -> Result<(), InvocationError> {
        tracing::info!(
            "Sending {} path(s) to the OCR backend for session {}",
            self.paths.len(),
            self.session
        );

        match self
            .backend
            .process_files(self.paths.clone(), self.events)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!("OCR backend request failed: {}", e);
                let message = format!("Invocation error: {e}");
                let failed = self.controller.fail_batch(self.session, &self.paths, &message);
                self.controller.metrics().record_invocation_failure();
                tracing::debug!("Marked {} job(s) failed after invocation error", failed);
                Err(e)
            }
        }
    }
}

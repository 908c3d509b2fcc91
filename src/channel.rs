//! Event channel between the OCR backend and the session.
//!
//! One [`EventChannel`] exists per session at most. It is opened lazily by the
//! [`Dispatcher`](crate::dispatch::Dispatcher) on the first non-empty batch, every
//! backend request of that session gets a clone of its [`EventSender`], and a single
//! listener task applies the received events to the
//! [`SessionController`](crate::state::SessionController) one at a time.
//!
//! On reset the channel is closed: the listener is aborted and senders still held by
//! in-flight backend work start failing with [`ChannelClosed`]. Backends log and drop
//! such events.

use crate::models::{OcrEvent, SessionId};
use crate::state::SessionController;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// The session behind this channel is gone; the event was not delivered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("event channel for session {session} is closed")]
pub struct ChannelClosed {
    pub session: SessionId,
    pub event: OcrEvent,
}

/// Cloneable sending half handed to the backend with each request.
#[derive(Debug, Clone)]
pub struct EventSender {
    session: SessionId,
    tx: mpsc::UnboundedSender<OcrEvent>,
}

impl EventSender {
    /// Queue an event for the session. Never blocks.
    pub fn send(&self, event: OcrEvent) -> Result<(), ChannelClosed> {
        self.tx.send(event).map_err(|mpsc::error::SendError(event)| ChannelClosed {
            session: self.session,
            event,
        })
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// The live channel of one session and its listener task.
pub struct EventChannel {
    session: SessionId,
    sender: EventSender,
    listener: JoinHandle<()>,
}

impl EventChannel {
    /// Open a channel for `session` and start listening.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(controller: SessionController, session: SessionId) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<OcrEvent>();

        let listener = tokio::spawn(async move {
            tracing::debug!("Event channel listener for session {} started", session);

            while let Some(event) = rx.recv().await {
                tracing::debug!("Received {} event for {}", event.kind(), event.path());
                controller.apply_event(session, &event);
            }

            tracing::debug!("Event channel listener for session {} stopped", session);
        });

        tracing::info!("Opened event channel for session {}", session);

        Self {
            session,
            sender: EventSender { session, tx },
            listener,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Abandon the channel. Events already queued but not yet applied are dropped.
    pub fn close(self) {
        tracing::info!("Closing event channel for session {}", self.session);
        // Drop aborts the listener
    }
}

impl Drop for EventChannel {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobPath, JobStatus};
    use crate::state::StateChange;
    use tokio::time::{Duration, timeout};

    #[tokio::test]
    async fn test_listener_applies_events() {
        let controller = SessionController::new();
        let (session, _) = controller.register_batch(["a.png"]);
        let mut rx = controller.subscribe();

        let channel = EventChannel::open(controller.clone(), session);
        channel
            .sender()
            .send(OcrEvent::success("a.png", "Hello"))
            .unwrap();

        let change = timeout(Duration::from_millis(500), rx.recv())
            .await
            .expect("Timeout waiting for completion")
            .expect("Channel closed");
        assert!(matches!(change, StateChange::JobCompleted { .. }));
        assert_eq!(
            controller.status(&JobPath::from("a.png")),
            Some(JobStatus::Complete {
                text: "Hello".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_send_after_close_fails_without_panicking() {
        let controller = SessionController::new();
        let (session, _) = controller.register_batch(["a.png"]);

        let channel = EventChannel::open(controller.clone(), session);
        let sender = channel.sender();
        channel.close();

        // The aborted listener drops its receiver once the runtime reaps the task
        timeout(Duration::from_millis(500), async {
            while !sender.is_closed() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("listener should shut down");

        let err = sender.send(OcrEvent::success("a.png", "late")).unwrap_err();
        assert_eq!(err.session, session);
        assert_eq!(controller.status(&JobPath::from("a.png")), Some(JobStatus::Processing));
    }

    #[tokio::test]
    async fn test_sender_reports_session() {
        let controller = SessionController::new();
        let channel = EventChannel::open(controller.clone(), controller.session_id());

        assert_eq!(channel.sender().session(), SessionId::FIRST);
        assert_eq!(channel.session(), SessionId::FIRST);
    }
}

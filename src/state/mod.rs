// Session state management
//
// This module provides the SessionController which wraps the current Session with
// thread-safe access using Arc<RwLock<T>> and emits change events for the renderer.

use crate::metrics::Metrics;
use crate::models::{
    ActionKind, ActionSlots, ActionState, JobPath, JobStatus, JobView, OcrEvent, Session,
    SessionId, apply,
};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tokio::sync::broadcast;

/// Capacity of the change broadcast. Slow subscribers lag instead of blocking writers.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Change events emitted when the session is modified
///
/// These are what the rendering layer consumes; every variant carries the session
/// it belongs to so a renderer can drop lines from a session it already cleared.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "change", rename_all = "camelCase")]
pub enum StateChange {
    /// New paths were admitted and are processing
    JobsRegistered {
        session: SessionId,
        jobs: Vec<JobView>,
    },

    /// A job reached `Complete`; its action slots are now enabled
    JobCompleted { session: SessionId, job: JobView },

    /// A job reached `Failed`; the status carries the annotation
    JobFailed { session: SessionId, job: JobView },

    /// An export or copy attempt finished
    ActionChanged {
        session: SessionId,
        path: JobPath,
        action: ActionKind,
        state: ActionState,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Full ordered job list, published on request
    Snapshot {
        session: SessionId,
        jobs: Vec<JobView>,
    },

    /// The session was torn down and a fresh one started
    SessionReset {
        previous: SessionId,
        session: SessionId,
    },
}

/// Outcome of reconciling one channel event against the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The job left `Processing` and now has this status
    Applied(JobStatus),
    /// The event was produced for a session that has since been reset
    StaleSession,
    /// No job is tracked for the event's path
    UnknownPath,
    /// The job had already reached a terminal state
    AlreadyTerminal,
}

impl Reconciliation {
    pub fn is_applied(&self) -> bool {
        matches!(self, Reconciliation::Applied(_))
    }
}

/// What an action needs from the session before it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionInput {
    pub session: SessionId,
    pub text: String,
    pub state: ActionState,
}

/// Why an action cannot run for a path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionUnavailable {
    #[error("{0} is not tracked in the current session")]
    NotTracked(JobPath),

    #[error("{path} is {status}; actions need a completed job")]
    NotComplete { path: JobPath, status: &'static str },
}

/// Thread-safe owner of the session with event emission
///
/// This is the single place the registry and job map are mutated:
/// - [`register_batch()`](Self::register_batch) admits new paths as `Processing`
/// - [`apply_event()`](Self::apply_event) reconciles channel events
/// - [`fail_batch()`](Self::fail_batch) marks a whole batch failed after an invocation error
/// - [`record_action()`](Self::record_action) stores export/copy outcomes
/// - [`reset()`](Self::reset) starts over with a fresh session
///
/// Each of these takes the write lock once, so concurrent callbacks from channel
/// listeners, backend requests and actions are serialized. Changes are broadcast while
/// the lock is held, so subscribers observe them in mutation order.
///
/// # Related Types
///
/// - [`crate::models::Session`]: the underlying registry and job map
/// - [`StateChange`]: event types emitted on mutations
/// - [`crate::dispatch::Dispatcher`]: feeds batches in and owns the event channel
/// - [`crate::actions::ActionGate`]: runs export/copy against completed jobs
pub struct SessionController {
    /// The current session protected by RwLock for thread-safe access
    session: Arc<RwLock<Session>>,

    /// Broadcast channel for emitting change events
    changes_tx: broadcast::Sender<StateChange>,

    metrics: Arc<Metrics>,
}

impl SessionController {
    /// Start the first session.
    pub fn new() -> Self {
        Self::with_metrics(Arc::new(Metrics::new()))
    }

    pub fn with_metrics(metrics: Arc<Metrics>) -> Self {
        let (changes_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            session: Arc::new(RwLock::new(Session::new(SessionId::FIRST))),
            changes_tx,
            metrics,
        }
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, change: StateChange) {
        // Ignore send errors - it's OK if no one is listening
        let _ = self.changes_tx.send(change);
    }

    /// Get a copy of the current session
    pub fn snapshot(&self) -> Session {
        self.read_lock().clone()
    }

    /// Execute a function with read access to the current session
    ///
    /// # Example
    /// ```ignore
    /// let pending = controller.read(|s| s.status_counts().0);
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Session) -> R,
    {
        let session = self.read_lock();
        f(&session)
    }

    /// Subscribe to change events
    ///
    /// Returns a receiver that will get notified of all future changes.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.changes_tx.subscribe()
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn session_id(&self) -> SessionId {
        self.read_lock().id()
    }

    /// Whether a job is tracked for this path in the current session.
    pub fn is_tracked(&self, path: &JobPath) -> bool {
        self.read_lock().is_tracked(path)
    }

    pub fn status(&self, path: &JobPath) -> Option<JobStatus> {
        self.read_lock().job(path).map(|entry| entry.status.clone())
    }

    pub fn actions(&self, path: &JobPath) -> Option<ActionSlots> {
        self.read_lock().job(path).map(|entry| entry.actions)
    }

    /// Admit a batch and register the new paths as `Processing`.
    ///
    /// Returns the session the paths were registered in together with the admitted
    /// paths in first-occurrence order. Paths already registered in this session are
    /// dropped silently.
    pub fn register_batch<I, P>(&self, batch: I) -> (SessionId, Vec<JobPath>)
    where
        I: IntoIterator<Item = P>,
        P: Into<JobPath>,
    {
        let batch: Vec<JobPath> = batch.into_iter().map(Into::into).collect();
        let submitted = batch.len();

        let mut current = self.write_lock();
        let session = current.id();
        let admitted = current.register(batch);
        let dropped = submitted - admitted.len();

        if dropped > 0 {
            tracing::debug!(
                "Dropped {} already-registered path(s) from batch in session {}",
                dropped,
                session
            );
        }
        self.metrics.record_registered(admitted.len(), dropped);

        if !admitted.is_empty() {
            tracing::info!(
                "Registered {} new job(s) in session {}",
                admitted.len(),
                session
            );
            let jobs = admitted.iter().filter_map(|path| current.view(path)).collect();
            self.emit(StateChange::JobsRegistered { session, jobs });
        }

        (session, admitted)
    }

    /// Reconcile one channel event against the session it was produced for.
    ///
    /// Only a `Processing` job of the same session transitions. Everything else is
    /// discarded and reported through the returned [`Reconciliation`]; nothing here
    /// fails.
    pub fn apply_event(&self, session: SessionId, event: &OcrEvent) -> Reconciliation {
        let path = event.path();
        let mut current = self.write_lock();

        let outcome = if current.id() != session {
            tracing::debug!(
                "Discarding {} event for {} from torn-down session {}",
                event.kind(),
                path,
                session
            );
            Reconciliation::StaleSession
        } else {
            match current.job_mut(path) {
                None => {
                    tracing::warn!("Received {} event for untracked path {}", event.kind(), path);
                    Reconciliation::UnknownPath
                }
                Some(entry) if entry.status.is_terminal() => {
                    tracing::debug!(
                        "Ignoring {} event for {}: already {}",
                        event.kind(),
                        path,
                        entry.status.label()
                    );
                    Reconciliation::AlreadyTerminal
                }
                Some(entry) => {
                    let previous = std::mem::replace(&mut entry.status, JobStatus::Processing);
                    entry.status = apply(previous, event);
                    entry.actions = ActionSlots::for_status(&entry.status);
                    Reconciliation::Applied(entry.status.clone())
                }
            }
        };

        match &outcome {
            Reconciliation::Applied(status) => {
                if let Some(job) = current.view(path) {
                    match status {
                        JobStatus::Complete { text } => {
                            tracing::info!("Job {} complete ({} chars)", path, text.len());
                            self.metrics.record_completed();
                            self.emit(StateChange::JobCompleted { session, job });
                        }
                        JobStatus::Failed { message } => {
                            tracing::warn!("Job {} failed: {}", path, message);
                            self.metrics.record_failed();
                            self.emit(StateChange::JobFailed { session, job });
                        }
                        JobStatus::Processing => {}
                    }
                }
            }
            _ => self.metrics.record_stale_event(),
        }

        outcome
    }

    /// Mark every path of a batch `Failed` after its backend request failed.
    ///
    /// Paths that already reached a terminal state keep it and are not counted as stale
    /// events. Returns how many paths transitioned.
    pub fn fail_batch(&self, session: SessionId, paths: &[JobPath], message: &str) -> usize {
        if self.session_id() != session {
            tracing::debug!(
                "Not failing batch of {} from torn-down session {}",
                paths.len(),
                session
            );
            return 0;
        }

        paths
            .iter()
            .filter(|path| self.status(path) == Some(JobStatus::Processing))
            .map(|path| self.apply_event(session, &OcrEvent::error(path.clone(), message)))
            .filter(Reconciliation::is_applied)
            .count()
    }

    /// Look up what an export/copy of `path` needs, if the job allows it.
    pub fn action_input(
        &self,
        path: &JobPath,
        kind: ActionKind,
    ) -> Result<ActionInput, ActionUnavailable> {
        let current = self.read_lock();
        let entry = current
            .job(path)
            .ok_or_else(|| ActionUnavailable::NotTracked(path.clone()))?;

        match &entry.status {
            JobStatus::Complete { text } => Ok(ActionInput {
                session: current.id(),
                text: text.clone(),
                state: entry.actions.get(kind),
            }),
            status => Err(ActionUnavailable::NotComplete {
                path: path.clone(),
                status: status.label(),
            }),
        }
    }

    /// Store the outcome of one export/copy attempt.
    ///
    /// The latest attempt wins. Returns `None` when the session was reset while the
    /// attempt was running, in which case nothing is recorded.
    pub fn record_action(
        &self,
        session: SessionId,
        path: &JobPath,
        kind: ActionKind,
        outcome: &Result<(), String>,
    ) -> Option<ActionState> {
        let mut current = self.write_lock();
        if current.id() != session {
            tracing::debug!(
                "Discarding {} result for {} from torn-down session {}",
                kind,
                path,
                session
            );
            return None;
        }

        let entry = current.job_mut(path)?;
        if !matches!(entry.status, JobStatus::Complete { .. }) {
            return None;
        }

        let state = match outcome {
            Ok(()) => ActionState::Succeeded,
            Err(_) => ActionState::Failed,
        };
        entry.actions.set(kind, state);
        self.metrics.record_action(outcome.is_ok());

        self.emit(StateChange::ActionChanged {
            session,
            path: path.clone(),
            action: kind,
            state,
            error: outcome.as_ref().err().cloned(),
        });

        Some(state)
    }

    /// Broadcast the full job list of the current session.
    pub fn publish_snapshot(&self) {
        let current = self.read_lock();
        self.emit(StateChange::Snapshot {
            session: current.id(),
            jobs: current.views(),
        });
    }

    /// Tear down the current session and start a fresh one.
    ///
    /// Outstanding backend work is not cancelled; its late events carry the old
    /// session id and are discarded on arrival.
    pub fn reset(&self) -> SessionId {
        let mut current = self.write_lock();
        let previous = current.id();
        let (processing, complete, failed) = current.status_counts();
        *current = Session::new(previous.next());
        let session = current.id();

        tracing::info!(
            "Session {} reset ({} processing abandoned, {} complete, {} failed); now {}",
            previous,
            processing,
            complete,
            failed,
            session
        );
        self.metrics.record_reset();
        self.emit(StateChange::SessionReset { previous, session });

        session
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

// Make SessionController cloneable for sharing across tasks
impl Clone for SessionController {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            changes_tx: self.changes_tx.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

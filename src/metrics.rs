// Session metrics
//
// Lock-free counters for what the reconciler did over the lifetime of the process.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Process-wide counters.
///
/// Shared by clones of the [`SessionController`](crate::state::SessionController)
/// and logged once on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Paths admitted and registered as processing
    pub jobs_registered: AtomicU64,

    /// Paths dropped because they were already registered in the session
    pub duplicates_dropped: AtomicU64,

    /// Jobs that reached `Complete`
    pub jobs_completed: AtomicU64,

    /// Jobs that reached `Failed`, from either a channel event or an invocation failure
    pub jobs_failed: AtomicU64,

    /// Channel events discarded as stale (unknown path, terminal job, old session)
    pub stale_events: AtomicU64,

    /// Backend requests that failed as a whole
    pub invocation_failures: AtomicU64,

    /// Export/copy attempts that succeeded
    pub actions_succeeded: AtomicU64,

    /// Export/copy attempts that failed
    pub actions_failed: AtomicU64,

    /// Session resets
    pub resets: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            jobs_registered: AtomicU64::new(0),
            duplicates_dropped: AtomicU64::new(0),
            jobs_completed: AtomicU64::new(0),
            jobs_failed: AtomicU64::new(0),
            stale_events: AtomicU64::new(0),
            invocation_failures: AtomicU64::new(0),
            actions_succeeded: AtomicU64::new(0),
            actions_failed: AtomicU64::new(0),
            resets: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_registered(&self, admitted: usize, dropped: usize) {
        self.jobs_registered
            .fetch_add(admitted as u64, Ordering::Relaxed);
        self.duplicates_dropped
            .fetch_add(dropped as u64, Ordering::Relaxed);
    }

    pub fn record_completed(&self) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_event(&self) {
        self.stale_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invocation_failure(&self) {
        self.invocation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_action(&self, succeeded: bool) {
        if succeeded {
            self.actions_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.actions_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Session Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Jobs: {} registered ({} duplicates dropped), {} complete, {} failed",
            self.jobs_registered.load(Ordering::Relaxed),
            self.duplicates_dropped.load(Ordering::Relaxed),
            self.jobs_completed.load(Ordering::Relaxed),
            self.jobs_failed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Stale events discarded: {}, invocation failures: {}, resets: {}",
            self.stale_events.load(Ordering::Relaxed),
            self.invocation_failures.load(Ordering::Relaxed),
            self.resets.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Actions: {} succeeded, {} failed",
            self.actions_succeeded.load(Ordering::Relaxed),
            self.actions_failed.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

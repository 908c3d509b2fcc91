// Shell Controller - wires host events to the session core
//
// Reads host events line by line and turns them into dispatcher and action-gate
// calls, while a renderer task streams every state change back to the host.
//
// Registration and reset run inline on the reading loop, so host events take effect
// in the order they were written. Backend requests and actions run as tasks.

use crate::actions::ActionGate;
use crate::dispatch::Dispatcher;
use crate::models::{ActionKind, JobPath};
use crate::ui::bridge::{HostEvent, parse_host_event, spawn_renderer};
use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite};
use tokio::sync::oneshot;
use tokio::task::JoinSet;

/// Reactor between the host shell and the session core
///
/// # Example
/// ```ignore
/// let shell = ShellController::new(dispatcher, gate);
/// let stdin = tokio::io::BufReader::new(tokio::io::stdin());
/// shell.run(stdin, tokio::io::stdout()).await?;
/// ```
pub struct ShellController {
    dispatcher: Arc<Dispatcher>,
    gate: Arc<ActionGate>,
}

impl ShellController {
    pub fn new(dispatcher: Arc<Dispatcher>, gate: Arc<ActionGate>) -> Self {
        Self { dispatcher, gate }
    }

    /// Serve host events until `input` ends.
    ///
    /// Pending backend requests and actions are awaited before returning, and all
    /// changes they produced are written. Returns the output sink.
    pub async fn run<R, W>(&self, input: R, output: W) -> Result<W>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let changes = self.dispatcher.controller().subscribe();
        let renderer = spawn_renderer(changes, output, shutdown_rx);
        let mut tasks = JoinSet::new();
        let mut lines = input.lines();

        tracing::info!("Shell controller ready");

        while let Some(line) = lines
            .next_line()
            .await
            .context("Failed to read host input")?
        {
            if let Some(event) = parse_host_event(&line) {
                self.handle(event, &mut tasks);
            }

            while let Some(finished) = tasks.try_join_next() {
                if let Err(e) = finished {
                    tracing::warn!("Host task ended abnormally: {}", e);
                }
            }
        }

        tracing::info!("Host input closed; waiting for {} pending task(s)", tasks.len());
        while let Some(finished) = tasks.join_next().await {
            if let Err(e) = finished {
                tracing::warn!("Host task ended abnormally: {}", e);
            }
        }

        let _ = shutdown_tx.send(());
        renderer
            .await
            .map_err(|e| anyhow!("Change renderer panicked: {}", e))?
            .context("Failed to write state changes")
    }

    fn handle(&self, event: HostEvent, tasks: &mut JoinSet<()>) {
        match event {
            HostEvent::Drop { paths } => {
                tracing::info!("Host dropped {} path(s)", paths.len());
                if let Some(pending) = self.dispatcher.admit(paths) {
                    tasks.spawn(async move {
                        // Failures are already reflected in the job statuses
                        let _ = pending.send().await;
                    });
                }
            }
            HostEvent::Export { path } => self.spawn_action(ActionKind::Export, path, tasks),
            HostEvent::Copy { path } => self.spawn_action(ActionKind::Copy, path, tasks),
            HostEvent::Reset => {
                self.dispatcher.reset();
            }
            HostEvent::Snapshot => self.dispatcher.controller().publish_snapshot(),
            HostEvent::Ignored => tracing::trace!("Ignoring host event"),
        }
    }

    fn spawn_action(&self, kind: ActionKind, path: JobPath, tasks: &mut JoinSet<()>) {
        let gate = Arc::clone(&self.gate);
        tasks.spawn(async move {
            if let Err(e) = gate.invoke(kind, &path).await {
                tracing::debug!("{} of {} did not succeed: {}", kind, path, e);
            }
        });
    }
}

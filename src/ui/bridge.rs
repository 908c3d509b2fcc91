// Host bridge - JSON lines between the desktop shell and the session core
//
// The shell (window, drop zone, buttons) runs out of process. It writes one JSON object
// per line to our stdin and renders the change lines we write to stdout.
//
// Inbound:  {"type":"drop","paths":[...]}, {"type":"export","path":...},
//           {"type":"copy","path":...}, {"type":"reset"}, {"type":"snapshot"}
// Outbound: one serialized StateChange per line, tagged by "change"

use crate::models::JobPath;
use crate::state::StateChange;
use serde::Deserialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;

/// One request from the host shell.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostEvent {
    /// Files were dropped onto the window
    Drop {
        #[serde(default)]
        paths: Vec<JobPath>,
    },
    Export {
        path: JobPath,
    },
    Copy {
        path: JobPath,
    },
    /// "Start Over"
    Reset,
    /// Re-send the full job list
    Snapshot,
    /// Any other `type`; the shell also emits drag-enter/over/leave
    #[serde(other)]
    Ignored,
}

/// Parse one input line. Blank and malformed lines yield `None`.
pub fn parse_host_event(line: &str) -> Option<HostEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str(line) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!("Ignoring malformed host event: {} ({})", line, e);
            None
        }
    }
}

/// Serialize a change as a single output line (without the newline).
pub fn render_change(change: &StateChange) -> serde_json::Result<String> {
    serde_json::to_string(change)
}

async fn write_change<W>(output: &mut W, change: &StateChange) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = render_change(change).map_err(std::io::Error::other)?;
    line.push('\n');
    output.write_all(line.as_bytes()).await?;
    output.flush().await
}

/// Spawn the task that renders state changes to `output`.
///
/// Runs until `shutdown` fires or the broadcast closes. On shutdown, changes already
/// broadcast are still written. The sink is handed back when the task ends.
pub fn spawn_renderer<W>(
    mut changes: broadcast::Receiver<StateChange>,
    mut output: W,
    mut shutdown: oneshot::Receiver<()>,
) -> JoinHandle<std::io::Result<W>>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        tracing::debug!("Change renderer started");

        loop {
            tokio::select! {
                biased;

                received = changes.recv() => match received {
                    Ok(change) => write_change(&mut output, &change).await?,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "Change renderer lagged - {} changes were skipped; \
                             host should request a snapshot",
                            skipped
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },

                _ = &mut shutdown => {
                    loop {
                        match changes.try_recv() {
                            Ok(change) => write_change(&mut output, &change).await?,
                            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                                tracing::warn!(
                                    "Change renderer lagged - {} changes were skipped",
                                    skipped
                                );
                            }
                            Err(_) => break,
                        }
                    }
                    break;
                }
            }
        }

        tracing::debug!("Change renderer stopped");
        Ok(output)
    })
}

//! ocrdrop - drop files, get OCR'd Markdown
//!
//! Main entry point for the host-facing process.
//!
//! # Overview
//!
//! The desktop shell (window, drop zone, result list) runs out of process and talks to
//! this binary over stdio: host events as JSON lines on stdin, state changes as JSON
//! lines on stdout. Logs go to `logs/` and, optionally, stderr.
//!
//! # Execution Flow
//!
//! 1. Load `OcrDrop Data/OcrDrop Config.yaml` (written with defaults on first run)
//! 2. Initialize logging from the `logging` section
//! 3. Create tokio runtime with 4 worker threads
//! 4. Wire SessionController, CommandOcrBackend, Dispatcher, ActionGate
//! 5. Serve host events until stdin closes
//! 6. Log a metrics summary and shut down the runtime with a 5s timeout

use anyhow::Result;
use ocrdrop::services::{CommandOcrBackend, FsExporter, SystemClipboard};
use ocrdrop::ui::ShellController;
use ocrdrop::{APP_NAME, ActionGate, ConfigManager, Dispatcher, SessionController, VERSION};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;

fn main() -> Result<()> {
    let config_manager = ConfigManager::new("OcrDrop Data")?;
    let wrote_defaults = config_manager.write_defaults_if_missing()?;
    let user_config = config_manager.load_user_config()?;

    // Must be held until exit to flush the file appender
    let _log_guard = ocrdrop::logging::setup_logging(&user_config.logging)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    if wrote_defaults {
        tracing::info!("Wrote default config to {}", config_manager.user_config_path());
    }
    tracing::info!(
        "OCR engine: {} (model {}, timeout {}s)",
        user_config.ocr.program,
        user_config.ocr.model,
        user_config.ocr.timeout_secs
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(4)
        .thread_name("ocrdrop-worker")
        .build()?;

    tracing::info!("Tokio runtime initialized with {} worker threads", 4);

    let controller = SessionController::new();
    let backend = Arc::new(CommandOcrBackend::new(user_config.ocr.clone()));
    let dispatcher = Arc::new(Dispatcher::new(controller.clone(), backend));
    let gate = Arc::new(ActionGate::new(
        controller.clone(),
        Arc::new(FsExporter::new()),
        Arc::new(SystemClipboard::new()),
        &user_config.export,
    ));
    let shell = ShellController::new(dispatcher, gate);

    let result = runtime.block_on(async {
        let stdin = BufReader::new(tokio::io::stdin());
        shell.run(stdin, tokio::io::stdout()).await.map(|_| ())
    });

    tracing::info!("Host disconnected, shutting down");
    controller.metrics().log_summary();

    runtime.shutdown_timeout(Duration::from_secs(5));

    tracing::info!("Application shutdown complete");

    result.inspect_err(|e| tracing::error!("Shell error: {:#}", e))
}

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Host file-write primitive used by the export action.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileExporter: Send + Sync {
    async fn write_file(&self, path: &Utf8Path, content: &str) -> Result<(), ExportError>;
}

/// Writes exports straight to the local file system, replacing existing files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsExporter;

impl FsExporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileExporter for FsExporter {
    async fn write_file(&self, path: &Utf8Path, content: &str) -> Result<(), ExportError> {
        tokio::fs::write(path, content)
            .await
            .map_err(|source| ExportError::Write {
                path: path.to_owned(),
                source,
            })?;

        tracing::debug!("Wrote {} bytes to {}", content.len(), path);
        Ok(())
    }
}

// src/core/fs_ops.rs
//! File system operations for delivered artifacts

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

pub struct FsOps;

impl FsOps {
    pub async fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)
                .await
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
            info!("Created directory: {}", path.display());
        }
        Ok(())
    }

    /// Write bytes under `dir/file_name`, replacing any previous download of the same name
    pub async fn write_artifact(dir: &Path, file_name: &str, content: &[u8]) -> Result<PathBuf> {
        Self::ensure_dir_exists(dir).await?;

        let path = dir.join(file_name);
        fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write file: {}", path.display()))?;

        info!("Written {} bytes to {}", content.len(), path.display());
        Ok(path)
    }
}

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::error::StorageError;

/// Local disk operations used for the best-effort upload mirror.
#[async_trait]
pub trait LocalFilesystem: Send + Sync {
    async fn is_dir(&self, path: &Path) -> bool;

    /// Create a single directory. The parent must already exist.
    async fn create_dir(&self, path: &Path) -> Result<(), StorageError>;

    async fn move_file(&self, src: &Path, dst: &Path) -> Result<(), StorageError>;

    async fn write_file(&self, dst: &Path, data: &[u8]) -> Result<(), StorageError>;

    /// Create `path` and any missing ancestors, one level at a time.
    ///
    /// Walks up to the nearest existing ancestor, then creates each missing
    /// level back down. Stops at the first level that cannot be created and
    /// returns `false`; deeper levels are left untouched.
    async fn make_upload_dir(&self, path: &Path) -> bool {
        let target = normalize(path);

        let mut missing = Vec::new();
        let mut current = Some(target.as_path());
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() || self.is_dir(dir).await {
                break;
            }
            missing.push(dir.to_path_buf());
            current = dir.parent();
        }

        for dir in missing.iter().rev() {
            if let Err(e) = self.create_dir(dir).await {
                debug!(path = %dir.display(), error = %e, "Failed to create upload directory");
                return false;
            }
        }

        true
    }
}

/// Turn backslashes into forward slashes; trailing separators are dropped by
/// `PathBuf` component handling.
fn normalize(path: &Path) -> PathBuf {
    let s = path.to_string_lossy().replace('\\', "/");
    let trimmed = s.trim_end_matches('/');
    if trimmed.is_empty() && s.starts_with('/') {
        PathBuf::from("/")
    } else {
        PathBuf::from(trimmed)
    }
}

/// Tokio-backed local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFilesystem;

#[async_trait]
impl LocalFilesystem for TokioFilesystem {
    async fn is_dir(&self, path: &Path) -> bool {
        fs::metadata(path)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }

    async fn create_dir(&self, path: &Path) -> Result<(), StorageError> {
        let mut builder = fs::DirBuilder::new();
        #[cfg(unix)]
        builder.mode(0o755);
        builder.create(path).await?;
        Ok(())
    }

    async fn move_file(&self, src: &Path, dst: &Path) -> Result<(), StorageError> {
        if fs::rename(src, dst).await.is_ok() {
            return Ok(());
        }

        // Cross-device moves cannot be renamed.
        fs::copy(src, dst).await?;
        fs::remove_file(src).await?;
        Ok(())
    }

    async fn write_file(&self, dst: &Path, data: &[u8]) -> Result<(), StorageError> {
        fs::write(dst, data).await?;
        Ok(())
    }
}

//! Remote delivery collaborator: the narrow write interface the pipeline
//! depends on.
//!
//! ## Why a trait instead of a transfer client?
//!
//! The production target is reachable over SFTP, but nothing in the
//! migration pipeline cares: it needs a directory created and three objects
//! written. Binding the pipeline to [`RemoteTarget`] keeps session caching,
//! host-key trust, and credential handling entirely inside an
//! implementation, and lets tests deliver to a local directory instead of a
//! live server. Implementations must tolerate concurrent use up to the
//! orchestrator's configured concurrency — the target session pool is the
//! one genuinely shared resource of a run.

use crate::error::MigrateError;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Directory-oriented write interface of the remote storage target.
#[async_trait]
pub trait RemoteTarget: Send + Sync {
    /// Create `path` (and any missing parents). Idempotent: an existing
    /// directory is not an error.
    async fn ensure_directory(&self, path: &str) -> Result<(), MigrateError>;

    /// Write `bytes` as the object at `path`, replacing any existing object.
    async fn write_object(&self, path: &str, bytes: &[u8]) -> Result<(), MigrateError>;
}

/// Delivery into a local directory tree via `tokio::fs`.
///
/// Used by tests and by deployments where the remote share is mounted into
/// the filesystem. Remote-relative paths (e.g. `/incoming/doc-001`) are
/// joined under `root`.
pub struct LocalDirTarget {
    root: PathBuf,
}

impl LocalDirTarget {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a remote-absolute path into the local root.
    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

#[async_trait]
impl RemoteTarget for LocalDirTarget {
    async fn ensure_directory(&self, path: &str) -> Result<(), MigrateError> {
        let dir = self.resolve(path);
        debug!("Ensuring directory {}", dir.display());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| MigrateError::Upload {
                object: path.to_string(),
                reason: format!("mkdir: {e}"),
            })
    }

    async fn write_object(&self, path: &str, bytes: &[u8]) -> Result<(), MigrateError> {
        let file = self.resolve(path);
        debug!("Writing object {} ({} bytes)", file.display(), bytes.len());
        tokio::fs::write(&file, bytes)
            .await
            .map_err(|e| MigrateError::Upload {
                object: path.to_string(),
                reason: e.to_string(),
            })
    }
}

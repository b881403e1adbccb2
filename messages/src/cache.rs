//! Local message cache keyed by project id.
//!
//! The cache is the "local" input of [`crate::merge::merge`]: whatever the
//! client managed to keep offline, in no particular order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::SyncError;
use crate::types::Message;

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;

/// Key-value store of locally held messages.
#[async_trait::async_trait]
pub trait MessageCache: Send + Sync {
    /// Messages held for `project_id`; empty when nothing is cached.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Cache`] if the backing store cannot be read.
    async fn load(&self, project_id: &str) -> Result<Vec<Message>, SyncError>;

    /// Replace the cached messages for `project_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Cache`] if the backing store cannot be written.
    async fn store(&self, project_id: &str, messages: &[Message]) -> Result<(), SyncError>;
}

// =============================================================================
// IN-MEMORY
// =============================================================================

/// Process-local cache, mainly for tests and short-lived sessions.
#[derive(Default)]
pub struct MemoryCache {
    projects: Mutex<HashMap<String, Vec<Message>>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl MessageCache for MemoryCache {
    async fn load(&self, project_id: &str) -> Result<Vec<Message>, SyncError> {
        let projects = self
            .projects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(projects.get(project_id).cloned().unwrap_or_default())
    }

    async fn store(&self, project_id: &str, messages: &[Message]) -> Result<(), SyncError> {
        let mut projects = self
            .projects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        projects.insert(project_id.to_owned(), messages.to_vec());
        Ok(())
    }
}

// =============================================================================
// FILE-BACKED
// =============================================================================

/// One JSON array file per project under a directory.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `project_id`'s messages. The id is percent-encoded, so
    /// distinct ids map to distinct files and `/` never reaches the path.
    #[must_use]
    pub fn path_for(&self, project_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(project_id)))
    }
}

#[async_trait::async_trait]
impl MessageCache for FileCache {
    async fn load(&self, project_id: &str) -> Result<Vec<Message>, SyncError> {
        let path = self.path_for(project_id);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SyncError::Cache(format!("read {}: {e}", path.display()))),
        };
        serde_json::from_str(&raw).map_err(|e| SyncError::Cache(format!("parse {}: {e}", path.display())))
    }

    async fn store(&self, project_id: &str, messages: &[Message]) -> Result<(), SyncError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SyncError::Cache(format!("create {}: {e}", self.dir.display())))?;

        let path = self.path_for(project_id);
        let body = serde_json::to_vec_pretty(messages).map_err(|e| SyncError::Cache(e.to_string()))?;

        // Write-then-rename; readers never see a partial file.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| SyncError::Cache(format!("write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| SyncError::Cache(format!("rename {}: {e}", path.display())))?;

        tracing::debug!(%project_id, count = messages.len(), path = %path.display(), "message cache stored");
        Ok(())
    }
}

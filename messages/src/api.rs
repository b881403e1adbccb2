//! The page-fetch seam between the sync engine and the network.

use crate::error::SyncError;
use crate::types::{MessagePage, PageQuery};

/// Fetches one page of a project's message listing. Enables mocking in tests.
#[async_trait::async_trait]
pub trait MessageApi: Send + Sync {
    /// Request `GET /projects/{project_id}/messages` with the given query.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] for transport failures, non-success statuses
    /// (including 404) and malformed bodies. Classification is left to the caller.
    async fn fetch_page(&self, project_id: &str, query: PageQuery) -> Result<MessagePage, SyncError>;
}

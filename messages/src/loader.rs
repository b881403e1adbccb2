//! Server load with local-cache fallback.
//!
//! Runs the paginated server load, then reconciles it with the local cache.
//! Fatal server errors are never swallowed; the cache only fills gaps left
//! by a partial load and keeps offline drafts that never synced.

use crate::cache::MessageCache;
use crate::config::LoadOptions;
use crate::engine::MessageSync;
use crate::error::SyncError;
use crate::merge::merge;
use crate::types::{LoadProgress, LoadResult, LoadSource};

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;

/// Load `project_id` from the server and merge in locally cached messages.
///
/// Source is `server` when the cache held nothing, `local` when the server
/// contributed nothing, and `merged` otherwise. A complete (non-partial)
/// load writes the merged history back to the cache.
///
/// # Errors
///
/// Returns fatal [`SyncError`]s from the server load and any cache error.
pub async fn load_with_fallback<F>(
    sync: &MessageSync,
    cache: &dyn MessageCache,
    project_id: &str,
    options: &LoadOptions,
    on_progress: F,
) -> Result<LoadResult, SyncError>
where
    F: FnMut(LoadProgress) + Send,
{
    let server = sync.load_all(project_id, options, on_progress).await?;
    let local = cache.load(project_id).await?;

    if local.is_empty() {
        if !server.is_partial && !server.messages.is_empty() {
            cache.store(project_id, &server.messages).await?;
        }
        return Ok(server);
    }

    let local_count = local.len();
    let outcome = merge(server.messages, local);
    let source = if outcome.from_server == 0 { LoadSource::Local } else { LoadSource::Merged };

    tracing::info!(
        %project_id,
        from_server = outcome.from_server,
        local_only = outcome.local_only,
        duplicates_removed = outcome.duplicates_removed,
        cached = local_count,
        partial = server.is_partial,
        "merged server history with local cache"
    );

    if !server.is_partial {
        cache.store(project_id, &outcome.messages).await?;
    }

    Ok(LoadResult {
        total: server.total.max(outcome.messages.len()),
        source,
        is_partial: server.is_partial,
        loaded_from_server: outcome.from_server,
        loaded_from_local: outcome.local_only,
        messages: outcome.messages,
    })
}

//! Paginated, retrying message loader.
//!
//! DESIGN
//! ======
//! `load_all` walks the listing endpoint in ascending order, one page at a
//! time. Pages are strictly sequential: the first response establishes
//! `total`, and each success advances `offset` by `page_size`.
//!
//! A retryable failure (transport error, 429, 5xx) re-requests the same
//! offset after an exponential backoff sleep. The retry counter counts
//! consecutive failures and resets on any success. Once it exceeds
//! `max_retries` the loader stops and returns what it has with
//! `is_partial = true`; this is a degraded success, not an error.
//!
//! Dropping the returned future cancels the load at its next await point.

use std::collections::HashSet;
use std::sync::Arc;

use crate::api::MessageApi;
use crate::backoff::Backoff;
use crate::config::LoadOptions;
use crate::error::SyncError;
use crate::types::{LoadProgress, LoadResult, LoadSource, Message, MessagePage, PageQuery, SortOrder};

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;

/// Message loader bound to one page-fetch implementation.
///
/// Holds no per-load state, so concurrent loads (e.g. different projects)
/// share nothing mutable.
#[derive(Clone)]
pub struct MessageSync {
    api: Arc<dyn MessageApi>,
}

impl MessageSync {
    #[must_use]
    pub fn new(api: Arc<dyn MessageApi>) -> Self {
        Self { api }
    }

    /// Load a project's complete history, tolerating transient failures.
    ///
    /// `on_progress` runs synchronously after every successful page and
    /// before every retry sleep (with `is_rate_limited` set).
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable [`SyncError`] (other than 404, which
    /// yields an empty result). Exhausted retries are not an error.
    pub async fn load_all<F>(&self, project_id: &str, options: &LoadOptions, mut on_progress: F) -> Result<LoadResult, SyncError>
    where
        F: FnMut(LoadProgress) + Send,
    {
        let page_size = options.page_size.max(1);
        let backoff = Backoff::new(options.base_delay, options.max_delay);

        let mut messages: Vec<Message> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut total: Option<usize> = None;
        let mut offset = 0;
        let mut page = 1;
        let mut retries: u32 = 0;

        loop {
            let query = PageQuery { limit: page_size, offset, order: SortOrder::Asc };
            let fetched = match self.api.fetch_page(project_id, query).await {
                Ok(fetched) => fetched,
                Err(e) if e.is_not_found() && total.is_none() => {
                    tracing::debug!(%project_id, "message listing not found; treating as empty");
                    return Ok(LoadResult::empty());
                }
                Err(e) if e.retryable() => {
                    retries += 1;
                    if retries > options.max_retries {
                        tracing::warn!(
                            %project_id,
                            page,
                            offset,
                            loaded = messages.len(),
                            error = %e,
                            "retries exhausted; returning partial history"
                        );
                        return Ok(finish(messages, total, true));
                    }
                    let delay = backoff.next_delay(retries);
                    tracing::warn!(
                        %project_id,
                        page,
                        offset,
                        attempt = retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "retryable failure; backing off"
                    );
                    on_progress(LoadProgress {
                        loaded: messages.len(),
                        total,
                        page,
                        is_complete: false,
                        is_rate_limited: true,
                    });
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(e) => {
                    tracing::error!(%project_id, page, offset, error = %e, code = e.error_code(), "message load failed");
                    return Err(e);
                }
            };

            retries = 0;
            let expected = *total.get_or_insert(fetched.total);
            let received = fetched.messages.len();
            for msg in fetched.messages {
                if seen.insert(msg.id.clone()) {
                    messages.push(msg);
                }
            }
            offset += page_size;

            // An empty page before `total` means the listing shrank under us.
            let is_complete = offset >= expected || received == 0;
            tracing::debug!(%project_id, page, offset, received, total = expected, "message page loaded");
            on_progress(LoadProgress { loaded: messages.len(), total, page, is_complete, is_rate_limited: false });

            if is_complete {
                break;
            }
            page += 1;
        }

        tracing::info!(%project_id, loaded = messages.len(), pages = page, "message history loaded");
        Ok(finish(messages, total, false))
    }

    /// Fetch the newest `limit` messages in one request, returned oldest first.
    ///
    /// # Errors
    ///
    /// Returns any [`SyncError`] other than 404, without retrying.
    pub async fn load_recent(&self, project_id: &str, limit: usize) -> Result<MessagePage, SyncError> {
        let query = PageQuery { limit, offset: 0, order: SortOrder::Desc };
        let mut page = self.single_page(project_id, query).await?;
        page.messages.reverse();
        Ok(page)
    }

    /// Fetch one ascending page starting at `offset`, for backward pagination.
    ///
    /// # Errors
    ///
    /// Returns any [`SyncError`] other than 404, without retrying.
    pub async fn load_older_page(&self, project_id: &str, offset: usize, limit: usize) -> Result<MessagePage, SyncError> {
        let query = PageQuery { limit, offset, order: SortOrder::Asc };
        self.single_page(project_id, query).await
    }

    async fn single_page(&self, project_id: &str, query: PageQuery) -> Result<MessagePage, SyncError> {
        match self.api.fetch_page(project_id, query).await {
            Ok(page) => Ok(page),
            Err(e) if e.is_not_found() => Ok(MessagePage::default()),
            Err(e) => Err(e),
        }
    }
}

fn finish(messages: Vec<Message>, total: Option<usize>, is_partial: bool) -> LoadResult {
    let loaded = messages.len();
    LoadResult {
        messages,
        total: total.unwrap_or(loaded),
        source: LoadSource::Server,
        is_partial,
        loaded_from_server: loaded,
        loaded_from_local: 0,
    }
}

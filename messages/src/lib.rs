//! Chat message history loading for Replay Builder projects.
//!
//! Fetches a project's message history from the remote listing endpoint in
//! pages, backs off and retries on transient failures, and reconciles the
//! result with a local offline cache into one ordered, deduplicated history.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | [`engine::MessageSync`]: paginated `load_all` plus single-page helpers |
//! | [`merge`] | Server/local merge with server precedence |
//! | [`loader`] | `load_with_fallback`: server load reconciled with the cache |
//! | [`api`] | [`api::MessageApi`] page-fetch trait |
//! | [`http`] | reqwest implementation of the page-fetch trait |
//! | [`cache`] | Local message cache trait, in-memory and file-backed stores |
//! | [`backoff`] | Exponential backoff with ±10% jitter |
//! | [`config`] | Environment-driven configuration and load options |
//! | [`error`] | [`error::SyncError`] and its retry classification |
//! | [`types`] | Messages, pages, progress and load results |

pub mod api;
pub mod backoff;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod loader;
pub mod merge;
pub mod types;

pub use api::MessageApi;
pub use cache::{FileCache, MemoryCache, MessageCache};
pub use config::{LoadOptions, SyncConfig};
pub use engine::MessageSync;
pub use error::SyncError;
pub use http::HttpMessageApi;
pub use loader::load_with_fallback;
pub use merge::{MergeOutcome, merge};
pub use types::{LoadProgress, LoadResult, LoadSource, Message, MessageContent, MessagePage, Role};

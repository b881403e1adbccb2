//! Error type for message loading.
//!
//! Classification drives the retry loop: `retryable()` errors are retried with
//! backoff, `is_not_found()` means "no messages", everything else is fatal.

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

/// Errors produced while fetching, parsing or caching messages.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Config(String),

    /// The request never produced a response (connect, timeout, reset).
    #[error("API request failed: {0}")]
    Request(String),

    /// The API returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    Response { status: u16, body: String },

    /// The response body was not a valid message page.
    #[error("API response parse failed: {0}")]
    Parse(String),

    /// Reading or writing the local message cache failed.
    #[error("message cache failed: {0}")]
    Cache(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl SyncError {
    /// Grepable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "E_CONFIG_PARSE",
            Self::Request(_) => "E_API_REQUEST",
            Self::Response { .. } => "E_API_RESPONSE",
            Self::Parse(_) => "E_API_PARSE",
            Self::Cache(_) => "E_CACHE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// Transport failures, 429 and 5xx are worth retrying.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Response { status: 429 | 500..=599, .. })
    }

    /// A 404 on the listing endpoint means the project has no messages.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Response { status: 404, .. })
    }
}

//! reqwest-backed implementation of [`MessageApi`].

use std::time::Duration;

use crate::api::MessageApi;
use crate::config::{HttpTimeouts, SyncConfig};
use crate::error::SyncError;
use crate::types::{MessagePage, PageQuery};

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

pub struct HttpMessageApi {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpMessageApi {
    /// Build a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::HttpClientBuild`] if the reqwest client cannot be built.
    pub fn new(base_url: &str, token: Option<String>, timeouts: HttpTimeouts) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| SyncError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string(), token })
    }

    /// Build a client from parsed [`SyncConfig`].
    ///
    /// # Errors
    ///
    /// See [`HttpMessageApi::new`].
    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        Self::new(&config.api_base_url, config.api_token.clone(), config.timeouts)
    }

    fn messages_url(&self, project_id: &str) -> String {
        format!("{}/projects/{}/messages", self.base_url, urlencoding::encode(project_id))
    }
}

#[async_trait::async_trait]
impl MessageApi for HttpMessageApi {
    async fn fetch_page(&self, project_id: &str, query: PageQuery) -> Result<MessagePage, SyncError> {
        let mut request = self.http.get(self.messages_url(project_id)).query(&[
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
            ("order", query.order.as_str().to_string()),
        ]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SyncError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| SyncError::Request(e.to_string()))?;
        if status != 200 {
            return Err(SyncError::Response { status, body: text });
        }
        serde_json::from_str(&text).map_err(|e| SyncError::Parse(e.to_string()))
    }
}

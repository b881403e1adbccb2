//! Message types shared by the sync engine, merger, cache and HTTP adapter.
//!
//! `Message` mirrors the remote API's JSON shape (camelCase keys). Everything
//! else in this module is the bookkeeping the loader hands back to callers:
//! page queries, progress snapshots and the final `LoadResult`.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;

/// Annotation marking a message that was authored offline and never synced.
pub const LOCAL_ONLY_ANNOTATION: &str = "local-only";

/// Annotation marking a message the chat UI should not display.
pub const HIDDEN_ANNOTATION: &str = "hidden";

// =============================================================================
// MESSAGE
// =============================================================================

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A typed part of a structured message payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    /// A plain text segment.
    #[serde(rename = "text")]
    Text { text: String },

    /// An attached image, referenced by URL or data URI.
    #[serde(rename = "image")]
    Image {
        image: String,
        #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },

    /// Any part type this crate does not model.
    #[serde(other)]
    Unknown,
}

/// Message payload: either a bare string or a list of parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Concatenated text of the payload, skipping non-text parts.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }
}

/// A chat message belonging to one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique per project.
    pub id: String,
    /// Server-assigned ordering key. `None` for messages that never synced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<i64>,
    pub role: Role,
    pub content: MessageContent,
    /// Opaque metadata; string entries act as markers (see [`Message::has_annotation`]).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<serde_json::Value>,
    /// Milliseconds since Unix epoch.
    pub created_at: i64,
}

impl Message {
    /// Build a message authored locally that has not reached the server yet.
    #[must_use]
    pub fn local(role: Role, content: MessageContent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sequence_number: None,
            role,
            content,
            annotations: vec![serde_json::Value::String(LOCAL_ONLY_ANNOTATION.to_owned())],
            created_at: now_ms(),
        }
    }

    /// Whether an annotation named `name` is present, either as a bare string
    /// or as an object whose `type` field equals `name`.
    #[must_use]
    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| match a {
            serde_json::Value::String(s) => s == name,
            serde_json::Value::Object(map) => map.get("type").and_then(|t| t.as_str()) == Some(name),
            _ => false,
        })
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.has_annotation(HIDDEN_ANNOTATION)
    }

    #[must_use]
    pub fn is_local_only(&self) -> bool {
        self.sequence_number.is_none() || self.has_annotation(LOCAL_ONLY_ANNOTATION)
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

// =============================================================================
// PAGES
// =============================================================================

/// Sort direction requested from the message listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Parameters for one page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub limit: usize,
    pub offset: usize,
    pub order: SortOrder,
}

/// Response body of the message listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub total: usize,
}

// =============================================================================
// LOAD RESULTS
// =============================================================================

/// Progress snapshot reported at each page boundary and before each retry sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    /// Messages accumulated so far.
    pub loaded: usize,
    /// Expected total; unknown until the first page returns.
    pub total: Option<usize>,
    /// 1-based index of the page being fetched.
    pub page: usize,
    pub is_complete: bool,
    /// Set while the loader is backing off from a retryable failure.
    pub is_rate_limited: bool,
}

/// Where the messages of a `LoadResult` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadSource {
    Server,
    Local,
    Merged,
}

/// Outcome of a full history load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResult {
    pub messages: Vec<Message>,
    pub total: usize,
    pub source: LoadSource,
    /// True when retries ran out before every page was fetched.
    pub is_partial: bool,
    pub loaded_from_server: usize,
    pub loaded_from_local: usize,
}

impl LoadResult {
    /// An empty, complete server result (project has no messages).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            messages: Vec::new(),
            total: 0,
            source: LoadSource::Server,
            is_partial: false,
            loaded_from_server: 0,
            loaded_from_local: 0,
        }
    }
}

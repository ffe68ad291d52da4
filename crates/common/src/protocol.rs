//! Request and response types exchanged over the public HTTP API.
//!
//! Field names are camelCase on the wire. Message `content` in every response
//! type is always plaintext (or the decryption placeholder); envelopes never
//! leave the server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// API keys
// ---------------------------------------------------------------------------

/// Request body for `POST /api/user/apikeys`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveApiKeyRequest {
    /// Provider identifier, e.g. `"openai"`.
    #[serde(default)]
    pub provider_name: String,
    /// Plaintext API key. Sealed before it is stored.
    #[serde(default)]
    pub api_key: String,
}

/// Response body for `GET /api/user/apikeys`.
///
/// Only provider identifiers are returned, never key material.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguredProvidersResponse {
    pub configured_providers: Vec<String>,
}

/// Generic confirmation body (`{"message": "..."}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversations and messages
// ---------------------------------------------------------------------------

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sender {
    User,
    Ai,
}

/// A message as rendered to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: Sender,
    /// Opened plaintext, or the placeholder when the stored envelope could not be opened.
    pub content: String,
    /// Provider id or model that produced an AI message.
    pub ai_provider: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Conversation metadata as listed by `GET /api/conversations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: Uuid,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
}

/// Response body for `GET /api/conversations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<ConversationSummary>,
}

/// Response body for `GET /api/conversations/:id/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub messages: Vec<MessageView>,
}

/// A conversation together with its rendered history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub id: Uuid,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<MessageView>,
}

/// Request body for `POST /api/messages`.
///
/// `content` and `conversationId` are taken loosely so that a wrongly typed
/// value is reported as a validation error instead of a JSON error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageRequest {
    #[serde(default)]
    pub content: serde_json::Value,
    /// Existing conversation to append to; a new one is created when absent.
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Provider identifier selected by the user.
    #[serde(default)]
    pub ai_provider: Option<String>,
}

impl PostMessageRequest {
    /// The message text, if `content` is a non-empty string.
    pub fn text(&self) -> Option<&str> {
        self.content.as_str().filter(|s| !s.is_empty())
    }

    /// The target conversation id, treating an empty string as absent.
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref().filter(|s| !s.is_empty())
    }
}

/// Response body for `POST /api/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageResponse {
    pub user_message: MessageView,
    pub ai_message: MessageView,
    /// Present only when the request created a new conversation.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub conversation: Option<ConversationView>,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::ServiceError> for ErrorResponse {
    fn from(err: &crate::ServiceError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Overall service status: `"ok"`.
    pub status: String,
    /// Whether the process key is loaded. Always `true` once serving.
    pub key_loaded: bool,
    /// Number of conversations currently stored.
    pub conversations: usize,
}

//! Persistence for conversations, messages, and sealed provider API keys.
//!
//! # Module invariants
//!
//! - **No crypto dependencies.** Message `content` and key `encrypted_key`
//!   fields are envelopes; this module stores them as opaque strings and must
//!   never parse or open them.
//! - Every lookup that takes a `user_id` enforces ownership.

pub mod memory;

pub use memory::{InMemoryApiKeys, InMemoryConversations};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::protocol::Sender;
use thiserror::Error;
use uuid::Uuid;

use crate::llm::Provider;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced conversation does not exist.
    #[error("conversation not found: {0}")]
    ConversationNotFound(Uuid),
}

/// A conversation owned by one user.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A conversation with its message count, as listed for its owner.
#[derive(Debug, Clone)]
pub struct ConversationListing {
    pub conversation: Conversation,
    pub message_count: usize,
}

/// A persisted message. `content` is an envelope, never plaintext.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: Sender,
    pub content: String,
    pub ai_provider: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Input for [`ConversationRepository::append_message`].
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub sender: Sender,
    /// Sealed envelope.
    pub content: String,
    pub ai_provider: Option<String>,
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Create an empty conversation for `user_id`.
    async fn create(&self, user_id: &str) -> StoreResult<Conversation>;

    /// Find a conversation by id, only if it belongs to `user_id`.
    async fn find_owned(&self, id: Uuid, user_id: &str) -> StoreResult<Option<Conversation>>;

    /// All conversations of `user_id`, most recently updated first.
    async fn list_for_user(&self, user_id: &str) -> StoreResult<Vec<ConversationListing>>;

    /// Append a message and bump the conversation's `updated_at`.
    async fn append_message(&self, message: NewMessage) -> StoreResult<StoredMessage>;

    /// Messages of a conversation in chronological order.
    async fn messages(&self, conversation_id: Uuid) -> StoreResult<Vec<StoredMessage>>;

    /// Total number of conversations stored.
    async fn count(&self) -> StoreResult<usize>;
}

/// `(user, provider) → envelope` mapping, unique on the pair.
#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    /// Insert or replace the sealed key for the pair.
    async fn upsert(&self, user_id: &str, provider: Provider, encrypted_key: String)
        -> StoreResult<()>;

    /// The sealed key for the pair, if any.
    async fn find(&self, user_id: &str, provider: Provider) -> StoreResult<Option<String>>;

    /// Providers `user_id` holds a key for, in [`Provider`] order.
    async fn providers_for(&self, user_id: &str) -> StoreResult<Vec<Provider>>;

    /// Remove the key for the pair. Returns `true` if one existed.
    async fn delete(&self, user_id: &str, provider: Provider) -> StoreResult<bool>;
}

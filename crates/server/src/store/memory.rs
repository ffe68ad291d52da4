//! In-memory repositories.
//!
//! Each repository wraps an `Arc<RwLock<_>>` so that clones share one table and
//! many request handlers can read concurrently.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ApiKeyRepository, Conversation, ConversationListing, ConversationRepository, NewMessage,
    StoreError, StoreResult, StoredMessage,
};
use crate::llm::Provider;

#[derive(Debug, Default)]
struct ConversationTables {
    conversations: HashMap<Uuid, Conversation>,
    // Insertion order doubles as the tie-breaker for equal timestamps.
    messages: HashMap<Uuid, Vec<StoredMessage>>,
}

/// In-memory [`ConversationRepository`].
#[derive(Clone, Debug, Default)]
pub struct InMemoryConversations {
    inner: Arc<RwLock<ConversationTables>>,
}

impl InMemoryConversations {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversations {
    async fn create(&self, user_id: &str) -> StoreResult<Conversation> {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            user_id: user_id.to_owned(),
            title: None,
            created_at: now,
            updated_at: now,
        };
        let mut tables = self.inner.write().await;
        tables
            .conversations
            .insert(conversation.id, conversation.clone());
        tables.messages.insert(conversation.id, Vec::new());
        Ok(conversation)
    }

    async fn find_owned(&self, id: Uuid, user_id: &str) -> StoreResult<Option<Conversation>> {
        let tables = self.inner.read().await;
        Ok(tables
            .conversations
            .get(&id)
            .filter(|c| c.user_id == user_id)
            .cloned())
    }

    async fn list_for_user(&self, user_id: &str) -> StoreResult<Vec<ConversationListing>> {
        let tables = self.inner.read().await;
        let mut listings: Vec<ConversationListing> = tables
            .conversations
            .values()
            .filter(|c| c.user_id == user_id)
            .map(|c| ConversationListing {
                conversation: c.clone(),
                message_count: tables.messages.get(&c.id).map_or(0, Vec::len),
            })
            .collect();
        listings.sort_by(|a, b| b.conversation.updated_at.cmp(&a.conversation.updated_at));
        Ok(listings)
    }

    async fn append_message(&self, message: NewMessage) -> StoreResult<StoredMessage> {
        let mut tables = self.inner.write().await;
        let now = Utc::now();
        let conversation = tables
            .conversations
            .get_mut(&message.conversation_id)
            .ok_or(StoreError::ConversationNotFound(message.conversation_id))?;
        conversation.updated_at = now;

        let stored = StoredMessage {
            id: Uuid::new_v4(),
            conversation_id: message.conversation_id,
            sender: message.sender,
            content: message.content,
            ai_provider: message.ai_provider,
            timestamp: now,
        };
        tables
            .messages
            .entry(stored.conversation_id)
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn messages(&self, conversation_id: Uuid) -> StoreResult<Vec<StoredMessage>> {
        let tables = self.inner.read().await;
        let mut messages = tables
            .messages
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default();
        // Stable sort keeps insertion order for identical timestamps.
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.inner.read().await.conversations.len())
    }
}

/// In-memory [`ApiKeyRepository`].
///
/// Keyed by `(user_id, provider)`, which enforces the uniqueness constraint.
#[derive(Clone, Debug, Default)]
pub struct InMemoryApiKeys {
    inner: Arc<RwLock<BTreeMap<(String, Provider), String>>>,
}

impl InMemoryApiKeys {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApiKeyRepository for InMemoryApiKeys {
    async fn upsert(
        &self,
        user_id: &str,
        provider: Provider,
        encrypted_key: String,
    ) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .insert((user_id.to_owned(), provider), encrypted_key);
        Ok(())
    }

    async fn find(&self, user_id: &str, provider: Provider) -> StoreResult<Option<String>> {
        Ok(self
            .inner
            .read()
            .await
            .get(&(user_id.to_owned(), provider))
            .cloned())
    }

    async fn providers_for(&self, user_id: &str) -> StoreResult<Vec<Provider>> {
        Ok(self
            .inner
            .read()
            .await
            .keys()
            .filter(|(owner, _)| owner == user_id)
            .map(|(_, provider)| *provider)
            .collect())
    }

    async fn delete(&self, user_id: &str, provider: Provider) -> StoreResult<bool> {
        Ok(self
            .inner
            .write()
            .await
            .remove(&(user_id.to_owned(), provider))
            .is_some())
    }
}

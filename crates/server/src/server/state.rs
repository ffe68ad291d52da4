//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::credentials::CredentialStore;
use crate::crypto::EnvelopeCipher;
use crate::llm::CompletionRegistry;
use crate::messages::MessagePipeline;
use crate::store::{InMemoryApiKeys, InMemoryConversations};

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (`Arc`-wrapped or already `Arc`-backed) so
/// that Axum can clone the state for each request without copying expensive data.
#[derive(Clone)]
pub struct AppState {
    /// Sealed provider API keys.
    pub credentials: CredentialStore,
    /// Conversation history and message posting.
    pub messages: MessagePipeline,
    /// Name of the HTTP header carrying the authenticated user id.
    pub user_header_name: Arc<String>,
}

impl AppState {
    /// Create a new [`AppState`] from its services.
    pub fn new(
        credentials: CredentialStore,
        messages: MessagePipeline,
        user_header_name: String,
    ) -> Self {
        Self {
            credentials,
            messages,
            user_header_name: Arc::new(user_header_name),
        }
    }

    /// Wire both services to in-memory repositories sharing one cipher.
    pub fn in_memory(
        cipher: EnvelopeCipher,
        completions: CompletionRegistry,
        user_header_name: String,
    ) -> Self {
        let credentials = CredentialStore::new(Arc::new(InMemoryApiKeys::new()), cipher.clone());
        let messages = MessagePipeline::new(
            Arc::new(InMemoryConversations::new()),
            credentials.clone(),
            completions,
            cipher,
        );
        Self::new(credentials, messages, user_header_name)
    }
}

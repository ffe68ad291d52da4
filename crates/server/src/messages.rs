//! The message pipeline: seal on write, open on read.
//!
//! Both the user's text and the generated reply are sealed before either is
//! persisted. When history is rendered, a message whose envelope cannot be
//! opened is replaced with [`DECRYPTION_PLACEHOLDER`]; the rest of the
//! conversation renders normally.

use std::sync::Arc;

use common::protocol::{
    ConversationSummary, ConversationView, MessageView, PostMessageResponse, Sender,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::credentials::CredentialStore;
use crate::crypto::EnvelopeCipher;
use crate::error::ChatError;
use crate::llm::{CompletionRegistry, CompletionRequest, Provider};
use crate::store::{Conversation, ConversationRepository, NewMessage, StoredMessage};

/// Shown in place of a message whose stored envelope cannot be opened.
pub const DECRYPTION_PLACEHOLDER: &str = "[Encrypted content - decryption failed]";

/// Recorded as the producer of replies when no provider was selected.
const DEFAULT_REPLY_SOURCE: &str = "mockAI_default";

/// A validated `POST /api/messages` request.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub content: String,
    pub conversation_id: Option<Uuid>,
    pub provider: Option<Provider>,
}

/// The reply text and the provider/model recorded alongside it.
struct Reply {
    content: String,
    source: String,
}

#[derive(Clone)]
pub struct MessagePipeline {
    conversations: Arc<dyn ConversationRepository>,
    credentials: CredentialStore,
    completions: CompletionRegistry,
    cipher: EnvelopeCipher,
}

impl MessagePipeline {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        credentials: CredentialStore,
        completions: CompletionRegistry,
        cipher: EnvelopeCipher,
    ) -> Self {
        Self {
            conversations,
            credentials,
            completions,
            cipher,
        }
    }

    /// Number of stored conversations, for the health endpoint.
    pub async fn conversation_count(&self) -> Result<usize, ChatError> {
        Ok(self.conversations.count().await?)
    }

    /// Conversation metadata for `user_id`, most recently updated first.
    pub async fn list_conversations(
        &self,
        user_id: &str,
    ) -> Result<Vec<ConversationSummary>, ChatError> {
        let listings = self.conversations.list_for_user(user_id).await?;
        Ok(listings
            .into_iter()
            .map(|l| ConversationSummary {
                id: l.conversation.id,
                title: l.conversation.title,
                created_at: l.conversation.created_at,
                updated_at: l.conversation.updated_at,
                message_count: l.message_count,
            })
            .collect())
    }

    /// Opened history of a conversation owned by `user_id`.
    ///
    /// # Errors
    ///
    /// [`ChatError::NotFound`] if the conversation does not exist or belongs
    /// to someone else.
    pub async fn history(
        &self,
        user_id: &str,
        conversation_id: Uuid,
    ) -> Result<Vec<MessageView>, ChatError> {
        self.owned_conversation(user_id, conversation_id).await?;
        let stored = self.conversations.messages(conversation_id).await?;
        Ok(self.render_all(&stored))
    }

    /// Open every message in `stored`, substituting the placeholder for any
    /// that fail. Always returns one view per input, in order.
    pub fn render_all(&self, stored: &[StoredMessage]) -> Vec<MessageView> {
        stored.iter().map(|m| self.render(m)).collect()
    }

    fn render(&self, message: &StoredMessage) -> MessageView {
        let content = match self.cipher.open(&message.content) {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    message_id = %message.id,
                    conversation_id = %message.conversation_id,
                    error = %e,
                    "failed to open stored message"
                );
                DECRYPTION_PLACEHOLDER.to_owned()
            }
        };
        view(message, content)
    }

    /// Store a user message and the generated reply.
    ///
    /// Both texts are sealed before anything is written, so a seal failure
    /// leaves storage untouched. A new conversation is created when
    /// `conversation_id` is `None`, and only then is it returned with the
    /// response.
    ///
    /// # Errors
    ///
    /// [`ChatError::BadRequest`] for empty content, [`ChatError::NotFound`]
    /// for a conversation the user does not own, [`ChatError::Seal`] if either
    /// text cannot be sealed.
    pub async fn post(
        &self,
        user_id: &str,
        message: OutgoingMessage,
    ) -> Result<PostMessageResponse, ChatError> {
        if message.content.is_empty() {
            return Err(ChatError::BadRequest(
                "Message content is required and must be a string.".into(),
            ));
        }

        if let Some(id) = message.conversation_id {
            self.owned_conversation(user_id, id).await?;
        }

        let sealed_user = self.seal(&message.content, "user message")?;
        let reply = self.reply(user_id, &message).await?;
        let sealed_reply = self.seal(&reply.content, "AI reply")?;

        let (conversation_id, created) = match message.conversation_id {
            Some(id) => (id, false),
            None => (self.conversations.create(user_id).await?.id, true),
        };

        let user_message = self
            .conversations
            .append_message(NewMessage {
                conversation_id,
                sender: Sender::User,
                content: sealed_user,
                ai_provider: message.provider.map(|p| p.id().to_owned()),
            })
            .await?;
        let ai_message = self
            .conversations
            .append_message(NewMessage {
                conversation_id,
                sender: Sender::Ai,
                content: sealed_reply,
                ai_provider: Some(reply.source),
            })
            .await?;
        debug!(
            %conversation_id,
            user_message_id = %user_message.id,
            ai_message_id = %ai_message.id,
            "messages stored"
        );

        let conversation = if created {
            let conv = self.owned_conversation(user_id, conversation_id).await?;
            let stored = self.conversations.messages(conversation_id).await?;
            Some(conversation_view(conv, self.render_all(&stored)))
        } else {
            None
        };

        Ok(PostMessageResponse {
            user_message: view(&user_message, message.content),
            ai_message: view(&ai_message, reply.content),
            conversation,
        })
    }

    async fn owned_conversation(
        &self,
        user_id: &str,
        conversation_id: Uuid,
    ) -> Result<Conversation, ChatError> {
        self.conversations
            .find_owned(conversation_id, user_id)
            .await?
            .ok_or_else(|| ChatError::NotFound("Conversation not found or access denied.".into()))
    }

    fn seal(&self, text: &str, what: &'static str) -> Result<String, ChatError> {
        self.cipher
            .seal(text)
            .map_err(|source| ChatError::Seal { what, source })
    }

    /// Pick the reply for `message`.
    ///
    /// With a provider and a usable key the registered client is called; a
    /// client error becomes the reply text. Without a key, or without a
    /// provider, a canned reply is produced.
    async fn reply(&self, user_id: &str, message: &OutgoingMessage) -> Result<Reply, ChatError> {
        let Some(provider) = message.provider else {
            return Ok(Reply {
                content: format!(
                    "Mock response from default AI (No provider specified) for: \"{}\"",
                    message.content
                ),
                source: DEFAULT_REPLY_SOURCE.to_owned(),
            });
        };

        let Some(api_key) = self.credentials.api_key(user_id, provider).await? else {
            warn!(user_id, provider = %provider, "no usable API key; using mock response");
            return Ok(Reply {
                content: format!(
                    "Mock response from {} (No API Key configured/found) for: \"{}\"",
                    provider.display_name(),
                    message.content
                ),
                source: provider.id().to_owned(),
            });
        };

        let request = CompletionRequest::new(message.content.clone(), api_key);
        match self.completions.complete(provider, request).await {
            Ok(resp) => Ok(Reply {
                content: resp.content,
                source: resp.model_used.unwrap_or_else(|| provider.id().to_owned()),
            }),
            Err(e) => {
                warn!(provider = %provider, error = %e, "completion failed");
                Ok(Reply {
                    content: format!(
                        "Error from {}: {e}. Falling back to mock response.",
                        provider.display_name()
                    ),
                    source: provider.id().to_owned(),
                })
            }
        }
    }
}

fn view(message: &StoredMessage, content: String) -> MessageView {
    MessageView {
        id: message.id,
        conversation_id: message.conversation_id,
        sender: message.sender,
        content,
        ai_provider: message.ai_provider.clone(),
        timestamp: message.timestamp,
    }
}

fn conversation_view(conversation: Conversation, messages: Vec<MessageView>) -> ConversationView {
    ConversationView {
        id: conversation.id,
        title: conversation.title,
        created_at: conversation.created_at,
        updated_at: conversation.updated_at,
        messages,
    }
}

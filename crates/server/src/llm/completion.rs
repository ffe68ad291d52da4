//! The completion capability and the provider lookup table.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use super::provider::Provider;

const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// A single-prompt completion request.
#[derive(Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Opened user API key for the provider.
    pub api_key: String,
    /// Model override; the provider default is used when `None`.
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            api_key: api_key.into(),
            model: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl std::fmt::Debug for CompletionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionRequest")
            .field("prompt_len", &self.prompt.len())
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub content: String,
    /// Model reported by the provider, if any.
    pub model_used: Option<String>,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    /// No client is registered for the provider.
    #[error("unsupported AI provider: {0}")]
    Unsupported(Provider),

    /// The provider rejected or failed the request.
    #[error("{0}")]
    Provider(String),
}

/// Produces a reply for a prompt using one vendor's API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest)
        -> Result<CompletionResponse, CompletionError>;
}

/// Offline client that answers deterministically without network access.
///
/// Like a vendor client it refuses to answer without an API key, so a blank
/// stored key surfaces as a provider error rather than a reply.
///
/// Registered for every provider by [`CompletionRegistry::offline`]; vendor
/// SDK clients are registered in its place when available.
#[derive(Debug, Clone, Copy)]
pub struct OfflineCompletion {
    provider: Provider,
}

impl OfflineCompletion {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl CompletionClient for OfflineCompletion {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        if request.api_key.trim().is_empty() {
            return Err(CompletionError::Provider(format!(
                "missing API key for {}",
                self.provider.display_name()
            )));
        }
        let model = request
            .model
            .unwrap_or_else(|| self.provider.default_model().to_owned());
        Ok(CompletionResponse {
            content: format!(
                "Offline reply from {} ({model}) for: \"{}\"",
                self.provider.display_name(),
                request.prompt
            ),
            model_used: Some(model),
        })
    }
}

/// Lookup table from provider to client.
#[derive(Clone, Default)]
pub struct CompletionRegistry {
    clients: HashMap<Provider, Arc<dyn CompletionClient>>,
}

impl CompletionRegistry {
    /// An empty registry; every provider is unsupported until registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with an [`OfflineCompletion`] for every known provider.
    pub fn offline() -> Self {
        Provider::ALL.into_iter().fold(Self::new(), |reg, p| {
            reg.with_client(p, Arc::new(OfflineCompletion::new(p)))
        })
    }

    /// Register (or replace) the client for `provider`.
    pub fn with_client(mut self, provider: Provider, client: Arc<dyn CompletionClient>) -> Self {
        self.clients.insert(provider, client);
        self
    }

    /// Dispatch `request` to the client registered for `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Unsupported`] if no client is registered,
    /// or whatever the client returns.
    pub async fn complete(
        &self,
        provider: Provider,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let client = self
            .clients
            .get(&provider)
            .ok_or(CompletionError::Unsupported(provider))?;
        client.complete(request).await
    }
}

//! Per-user provider API keys, sealed at rest.
//!
//! Keys are sealed before they reach the repository and opened only when an
//! outbound completion needs them. Clients only ever learn which providers are
//! configured.

use std::sync::Arc;

use tracing::{info, warn};

use crate::crypto::EnvelopeCipher;
use crate::error::ChatError;
use crate::llm::Provider;
use crate::store::{ApiKeyRepository, StoreError};

#[derive(Clone)]
pub struct CredentialStore {
    repo: Arc<dyn ApiKeyRepository>,
    cipher: EnvelopeCipher,
}

impl CredentialStore {
    pub fn new(repo: Arc<dyn ApiKeyRepository>, cipher: EnvelopeCipher) -> Self {
        Self { repo, cipher }
    }

    /// Seal and store `api_key` for `(user_id, provider)`, replacing any previous key.
    ///
    /// # Errors
    ///
    /// [`ChatError::BadRequest`] for an empty key, [`ChatError::Seal`] if
    /// sealing fails (nothing is stored).
    pub async fn save(&self, user_id: &str, provider: Provider, api_key: &str) -> Result<(), ChatError> {
        if api_key.is_empty() {
            return Err(ChatError::BadRequest(
                "Provider name and API key are required.".into(),
            ));
        }
        let sealed = self.cipher.seal(api_key).map_err(|source| ChatError::Seal {
            what: "API key",
            source,
        })?;
        self.repo.upsert(user_id, provider, sealed).await?;
        info!(user_id, provider = %provider, "API key saved");
        Ok(())
    }

    /// Providers `user_id` has configured a key for.
    pub async fn configured_providers(&self, user_id: &str) -> Result<Vec<Provider>, StoreError> {
        self.repo.providers_for(user_id).await
    }

    /// Remove the key for `(user_id, provider)`. Returns `true` if one existed.
    pub async fn delete(&self, user_id: &str, provider: Provider) -> Result<bool, StoreError> {
        let removed = self.repo.delete(user_id, provider).await?;
        if removed {
            info!(user_id, provider = %provider, "API key deleted");
        }
        Ok(removed)
    }

    /// Open the stored key for an outbound call.
    ///
    /// Returns `Ok(None)` when no key is stored or when the stored envelope
    /// cannot be opened; the latter is logged and otherwise treated as absent.
    pub async fn api_key(&self, user_id: &str, provider: Provider) -> Result<Option<String>, StoreError> {
        let Some(sealed) = self.repo.find(user_id, provider).await? else {
            return Ok(None);
        };
        match self.cipher.open(&sealed) {
            Ok(key) => Ok(Some(key)),
            Err(e) => {
                warn!(user_id, provider = %provider, error = %e, "stored API key could not be opened");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{key::KEY_LEN, SecretKey};
    use crate::store::InMemoryApiKeys;

    fn cipher(byte: u8) -> EnvelopeCipher {
        EnvelopeCipher::new(SecretKey::from_bytes(&[byte; KEY_LEN]).unwrap()).unwrap()
    }

    fn store_with(repo: &InMemoryApiKeys, byte: u8) -> CredentialStore {
        CredentialStore::new(Arc::new(repo.clone()), cipher(byte))
    }

    #[tokio::test]
    async fn saved_key_is_sealed_at_rest_and_opens() {
        let repo = InMemoryApiKeys::new();
        let store = store_with(&repo, 1);
        store.save("alice", Provider::OpenAi, "sk-live-123").await.unwrap();

        let at_rest = repo.find("alice", Provider::OpenAi).await.unwrap().unwrap();
        assert!(!at_rest.contains("sk-live-123"));
        assert_eq!(at_rest.split(':').count(), 3);

        assert_eq!(
            store.api_key("alice", Provider::OpenAi).await.unwrap().as_deref(),
            Some("sk-live-123")
        );
    }

    #[tokio::test]
    async fn saving_twice_replaces_key() {
        let repo = InMemoryApiKeys::new();
        let store = store_with(&repo, 1);
        store.save("alice", Provider::Cohere, "old").await.unwrap();
        store.save("alice", Provider::Cohere, "new").await.unwrap();
        assert_eq!(
            store.api_key("alice", Provider::Cohere).await.unwrap().as_deref(),
            Some("new")
        );
        assert_eq!(
            store.configured_providers("alice").await.unwrap(),
            vec![Provider::Cohere]
        );
    }

    #[tokio::test]
    async fn empty_key_rejected() {
        let store = store_with(&InMemoryApiKeys::new(), 1);
        let err = store.save("alice", Provider::OpenAi, "").await.unwrap_err();
        assert!(matches!(err, ChatError::BadRequest(_)));
    }

    #[tokio::test]
    async fn key_sealed_under_other_process_key_reads_as_absent() {
        let repo = InMemoryApiKeys::new();
        store_with(&repo, 1)
            .save("alice", Provider::Anthropic, "sk-ant")
            .await
            .unwrap();
        let rotated = store_with(&repo, 2);
        assert_eq!(rotated.api_key("alice", Provider::Anthropic).await.unwrap(), None);
        // Still listed as configured: the row exists.
        assert_eq!(
            rotated.configured_providers("alice").await.unwrap(),
            vec![Provider::Anthropic]
        );
    }

    #[tokio::test]
    async fn delete_then_lookup() {
        let repo = InMemoryApiKeys::new();
        let store = store_with(&repo, 1);
        store.save("alice", Provider::OpenAi, "k").await.unwrap();
        assert!(store.delete("alice", Provider::OpenAi).await.unwrap());
        assert!(!store.delete("alice", Provider::OpenAi).await.unwrap());
        assert_eq!(store.api_key("alice", Provider::OpenAi).await.unwrap(), None);
    }
}

//! Errors raised by the chat services, and their mapping to [`ServiceError`].

use common::ServiceError;
use thiserror::Error;

use crate::crypto::CipherError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ChatError {
    /// Caller input failed validation.
    #[error("{0}")]
    BadRequest(String),

    /// The conversation or key does not exist for this user.
    #[error("{0}")]
    NotFound(String),

    /// Sealing failed; the record was not persisted.
    #[error("failed to encrypt {what}")]
    Seal {
        what: &'static str,
        #[source]
        source: CipherError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ChatError> for ServiceError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::BadRequest(msg) => ServiceError::BadRequest(msg),
            ChatError::NotFound(msg) => ServiceError::NotFound(msg),
            err @ ChatError::Seal { .. } => ServiceError::EncryptionFailure(err.to_string()),
            ChatError::Store(e) => ServiceError::Internal(e.to_string()),
        }
    }
}

//! Common error types shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::Unauthorized`] → 401
/// - [`ServiceError::NotFound`] → 404
/// - [`ServiceError::EncryptionFailure`] → 500
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was malformed or named an unknown provider.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No authenticated user identity accompanied the request.
    #[error("unauthorized")]
    Unauthorized,

    /// The resource does not exist or belongs to another user.
    #[error("not found: {0}")]
    NotFound(String),

    /// Sealing a value failed; nothing was persisted.
    #[error("encryption failure: {0}")]
    EncryptionFailure(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::Unauthorized => 401,
            ServiceError::NotFound(_) => 404,
            ServiceError::EncryptionFailure(_) => 500,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code placed in the `code` field of error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::Unauthorized => "unauthorized",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::EncryptionFailure(_) => "encryption_failure",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_codes() {
        assert_eq!(ServiceError::BadRequest("x".into()).http_status(), 400);
        assert_eq!(ServiceError::Unauthorized.http_status(), 401);
        assert_eq!(ServiceError::NotFound("x".into()).http_status(), 404);
        assert_eq!(
            ServiceError::EncryptionFailure("x".into()).http_status(),
            500
        );
        assert_eq!(ServiceError::Internal("x".into()).http_status(), 500);
    }

    #[test]
    fn codes_are_snake_case() {
        assert_eq!(ServiceError::Unauthorized.code(), "unauthorized");
        assert_eq!(
            ServiceError::EncryptionFailure("x".into()).code(),
            "encryption_failure"
        );
    }

    #[test]
    fn display_includes_message() {
        let e = ServiceError::BadRequest("provider name is required".into());
        assert!(e.to_string().contains("provider name is required"));
    }
}

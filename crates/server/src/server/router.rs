//! Axum router construction.

use std::time::Duration;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
///
/// Everything under `/api` requires the user id header; `/health` does not.
pub fn build(state: AppState, request_timeout: Duration) -> Router {
    let api = Router::new()
        .route(
            "/user/apikeys",
            get(handlers::list_api_keys).post(handlers::save_api_key),
        )
        .route("/user/apikeys/:provider", delete(handlers::delete_api_key))
        .route("/conversations", get(handlers::list_conversations))
        .route(
            "/conversations/:conversation_id/messages",
            get(handlers::conversation_messages),
        )
        .route("/messages", post(handlers::post_message))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_user));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CompressionLayer::new())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{key::KEY_LEN, EnvelopeCipher, SecretKey};
    use crate::llm::CompletionRegistry;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    fn app() -> Router {
        let cipher = EnvelopeCipher::new(SecretKey::from_bytes(&[5u8; KEY_LEN]).unwrap()).unwrap();
        let state = AppState::in_memory(cipher, CompletionRegistry::offline(), "X-User-Id".into());
        build(state, Duration::from_secs(30))
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let req = Request::builder()
            .uri("/unknown")
            .body(Body::empty())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn health_route_exists() {
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn api_without_user_header_is_401() {
        let req = Request::builder()
            .uri("/api/user/apikeys")
            .body(Body::empty())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 401);
    }

    #[tokio::test]
    async fn blank_user_header_is_401() {
        let req = Request::builder()
            .uri("/api/conversations")
            .header("x-user-id", "   ")
            .body(Body::empty())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 401);
    }

    #[tokio::test]
    async fn api_with_user_header_is_served() {
        let req = Request::builder()
            .uri("/api/conversations")
            .header("x-user-id", "alice")
            .body(Body::empty())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 200);
    }
}

//! Axum request handlers for all service endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use common::protocol::{
    ConfiguredProvidersResponse, ConversationsResponse, ErrorResponse, HealthResponse,
    MessagesResponse, PostMessageRequest, PostMessageResponse, SaveApiKeyRequest, StatusMessage,
};
use common::ServiceError;
use tracing::{error, warn};
use uuid::Uuid;

use super::middleware::UserId;
use super::state::AppState;
use crate::error::ChatError;
use crate::llm::Provider;
use crate::messages::OutgoingMessage;
use crate::store::StoreError;

/// A [`ServiceError`] rendered as a JSON [`ErrorResponse`].
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        Self(err.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ChatError::from(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection, "rejected request body");
        Self(ServiceError::BadRequest("Invalid JSON in request body.".into()))
    }
}

fn parse_provider(id: &str) -> ApiResult<Provider> {
    id.parse::<Provider>()
        .map_err(|_| ServiceError::BadRequest("Invalid provider name.".into()).into())
}

/// An unparsable id cannot name an existing conversation, so it gets the
/// same 404 as an unknown one.
fn parse_conversation_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| {
        ServiceError::NotFound("Conversation not found or access denied.".into()).into()
    })
}

/// `GET /health`: liveness and readiness check.
///
/// The process only serves once the key has been loaded, so `keyLoaded` is
/// always `true` here; `503` means the conversation store is unreachable.
pub async fn health(State(state): State<AppState>) -> Response {
    let (status_code, status_str, conversations) = match state.messages.conversation_count().await {
        Ok(n) => (StatusCode::OK, "ok", n),
        Err(e) => {
            warn!(error = %e, "health check could not reach conversation store");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", 0)
        }
    };

    let body = HealthResponse {
        status: status_str.into(),
        key_loaded: true,
        conversations,
    };
    (status_code, Json(body)).into_response()
}

/// `GET /api/user/apikeys`: providers the user holds a key for.
pub async fn list_api_keys(
    State(state): State<AppState>,
    Extension(UserId(user)): Extension<UserId>,
) -> ApiResult<Json<ConfiguredProvidersResponse>> {
    let providers = state.credentials.configured_providers(&user).await?;
    Ok(Json(ConfiguredProvidersResponse {
        configured_providers: providers.into_iter().map(|p| p.id().to_owned()).collect(),
    }))
}

/// `POST /api/user/apikeys`: seal and store (or replace) a provider key.
pub async fn save_api_key(
    State(state): State<AppState>,
    Extension(UserId(user)): Extension<UserId>,
    body: Result<Json<SaveApiKeyRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<StatusMessage>)> {
    let Json(req) = body?;
    if req.provider_name.is_empty() || req.api_key.is_empty() {
        return Err(
            ServiceError::BadRequest("Provider name and API key are required.".into()).into(),
        );
    }
    let provider = parse_provider(&req.provider_name)?;

    state.credentials.save(&user, provider, &req.api_key).await?;

    Ok((
        StatusCode::CREATED,
        Json(StatusMessage::new(format!(
            "API key for {provider} saved successfully."
        ))),
    ))
}

/// `DELETE /api/user/apikeys/:provider`: remove a provider key.
pub async fn delete_api_key(
    State(state): State<AppState>,
    Extension(UserId(user)): Extension<UserId>,
    Path(provider_name): Path<String>,
) -> ApiResult<Json<StatusMessage>> {
    let provider = parse_provider(&provider_name)?;
    if !state.credentials.delete(&user, provider).await? {
        return Err(ServiceError::NotFound(format!(
            "No API key found for provider {provider} to delete."
        ))
        .into());
    }
    Ok(Json(StatusMessage::new(format!(
        "API key for {provider} deleted successfully."
    ))))
}

/// `GET /api/conversations`: the user's conversations, most recent first.
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(UserId(user)): Extension<UserId>,
) -> ApiResult<Json<ConversationsResponse>> {
    let conversations = state.messages.list_conversations(&user).await?;
    Ok(Json(ConversationsResponse { conversations }))
}

/// `GET /api/conversations/:conversation_id/messages`: opened history.
///
/// Messages whose envelopes cannot be opened are returned with placeholder
/// content; the request itself still succeeds.
pub async fn conversation_messages(
    State(state): State<AppState>,
    Extension(UserId(user)): Extension<UserId>,
    Path(conversation_id): Path<String>,
) -> ApiResult<Json<MessagesResponse>> {
    let conversation_id = parse_conversation_id(&conversation_id)?;
    let messages = state.messages.history(&user, conversation_id).await?;
    Ok(Json(MessagesResponse { messages }))
}

/// `POST /api/messages`: store a user message and the generated reply.
pub async fn post_message(
    State(state): State<AppState>,
    Extension(UserId(user)): Extension<UserId>,
    body: Result<Json<PostMessageRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PostMessageResponse>)> {
    let Json(req) = body?;
    let content = req.text().map(str::to_owned).ok_or_else(|| {
        ServiceError::BadRequest("Message content is required and must be a string.".into())
    })?;
    let provider = match req.ai_provider.as_deref() {
        None | Some("") => None,
        Some(id) => Some(id.parse::<Provider>().map_err(|_| {
            ServiceError::BadRequest("Invalid AI provider specified.".into())
        })?),
    };
    let conversation_id = req
        .conversation_id()
        .map(parse_conversation_id)
        .transpose()?;

    let resp = state
        .messages
        .post(
            &user,
            OutgoingMessage {
                content,
                conversation_id,
                provider,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::{HeaderName, HeaderValue};
    use axum_test::TestServer;
    use serde_json::json;

    use super::*;
    use crate::crypto::{key::KEY_LEN, EnvelopeCipher, SecretKey};
    use crate::llm::CompletionRegistry;
    use crate::messages::DECRYPTION_PLACEHOLDER;
    use crate::server::router;

    fn test_server() -> TestServer {
        let cipher = EnvelopeCipher::new(SecretKey::from_bytes(&[3u8; KEY_LEN]).unwrap()).unwrap();
        let state = AppState::in_memory(cipher, CompletionRegistry::offline(), "X-User-Id".into());
        TestServer::new(router::build(state, Duration::from_secs(30))).unwrap()
    }

    fn user(name: &'static str) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static("x-user-id"),
            HeaderValue::from_static(name),
        )
    }

    #[tokio::test]
    async fn health_is_ok() {
        let server = test_server();
        let resp = server.get("/health").await;
        assert_eq!(resp.status_code(), StatusCode::OK);
        let body: HealthResponse = resp.json();
        assert!(body.key_loaded);
        assert_eq!(body.conversations, 0);
    }

    #[tokio::test]
    async fn api_requires_user_header() {
        let server = test_server();
        let resp = server.get("/api/conversations").await;
        assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
        let body: ErrorResponse = resp.json();
        assert_eq!(body.code, "unauthorized");
    }

    #[tokio::test]
    async fn api_key_lifecycle() {
        let server = test_server();
        let (name, value) = user("alice");

        let resp = server
            .post("/api/user/apikeys")
            .add_header(name.clone(), value.clone())
            .json(&json!({"providerName": "anthropic", "apiKey": "sk-ant-1"}))
            .await;
        assert_eq!(resp.status_code(), StatusCode::CREATED);

        let resp = server
            .get("/api/user/apikeys")
            .add_header(name.clone(), value.clone())
            .await;
        let body: ConfiguredProvidersResponse = resp.json();
        assert_eq!(body.configured_providers, vec!["anthropic".to_string()]);
        assert!(!resp.text().contains("sk-ant-1"));

        let resp = server
            .delete("/api/user/apikeys/anthropic")
            .add_header(name.clone(), value.clone())
            .await;
        assert_eq!(resp.status_code(), StatusCode::OK);

        let resp = server
            .delete("/api/user/apikeys/anthropic")
            .add_header(name, value)
            .await;
        assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn save_api_key_validates_input() {
        let server = test_server();
        let (name, value) = user("alice");

        let resp = server
            .post("/api/user/apikeys")
            .add_header(name.clone(), value.clone())
            .json(&json!({"providerName": "openai"}))
            .await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);

        let resp = server
            .post("/api/user/apikeys")
            .add_header(name.clone(), value.clone())
            .json(&json!({"providerName": "mistral", "apiKey": "k"}))
            .await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);

        let resp = server
            .delete("/api/user/apikeys/mistral")
            .add_header(name, value)
            .await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn post_message_then_read_history() {
        let server = test_server();
        let (name, value) = user("alice");

        let resp = server
            .post("/api/messages")
            .add_header(name.clone(), value.clone())
            .json(&json!({"content": "hello world", "aiProvider": "openai"}))
            .await;
        assert_eq!(resp.status_code(), StatusCode::CREATED);
        let posted: PostMessageResponse = resp.json();
        let conversation = posted.conversation.expect("new conversation");
        assert_eq!(posted.user_message.content, "hello world");

        let resp = server
            .get(&format!("/api/conversations/{}/messages", conversation.id))
            .add_header(name.clone(), value.clone())
            .await;
        assert_eq!(resp.status_code(), StatusCode::OK);
        let history: MessagesResponse = resp.json();
        assert_eq!(history.messages.len(), 2);
        assert_eq!(history.messages[0].content, "hello world");
        assert_ne!(history.messages[1].content, DECRYPTION_PLACEHOLDER);

        let resp = server
            .get("/api/conversations")
            .add_header(name, value)
            .await;
        let list: ConversationsResponse = resp.json();
        assert_eq!(list.conversations.len(), 1);
        assert_eq!(list.conversations[0].message_count, 2);
    }

    #[tokio::test]
    async fn post_message_rejects_bad_input() {
        let server = test_server();
        let (name, value) = user("alice");

        let resp = server
            .post("/api/messages")
            .add_header(name.clone(), value.clone())
            .json(&json!({"content": ""}))
            .await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);

        let resp = server
            .post("/api/messages")
            .add_header(name.clone(), value.clone())
            .json(&json!({"content": "hi", "aiProvider": "skynet"}))
            .await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);

        let resp = server
            .post("/api/messages")
            .add_header(name, value)
            .text("{not json")
            .await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_string_content_is_a_validation_error() {
        let server = test_server();
        let (name, value) = user("alice");

        let resp = server
            .post("/api/messages")
            .add_header(name, value)
            .json(&json!({"content": 5}))
            .await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = resp.json();
        assert!(body
            .message
            .contains("Message content is required and must be a string."));
    }

    #[tokio::test]
    async fn unparsable_conversation_id_in_body_is_not_found() {
        let server = test_server();
        let (name, value) = user("alice");

        let resp = server
            .post("/api/messages")
            .add_header(name.clone(), value.clone())
            .json(&json!({"content": "hi", "conversationId": "nope"}))
            .await;
        assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = resp.json();
        assert_eq!(body.code, "not_found");

        // An empty id starts a new conversation.
        let resp = server
            .post("/api/messages")
            .add_header(name, value)
            .json(&json!({"content": "hi", "conversationId": ""}))
            .await;
        assert_eq!(resp.status_code(), StatusCode::CREATED);
        let posted: PostMessageResponse = resp.json();
        assert!(posted.conversation.is_some());
    }

    #[tokio::test]
    async fn other_users_conversations_are_hidden() {
        let server = test_server();
        let (alice, alice_v) = user("alice");
        let (bob, bob_v) = user("bob");

        let posted: PostMessageResponse = server
            .post("/api/messages")
            .add_header(alice, alice_v)
            .json(&json!({"content": "private"}))
            .await
            .json();
        let id = posted.conversation.unwrap().id;

        let resp = server
            .get(&format!("/api/conversations/{id}/messages"))
            .add_header(bob.clone(), bob_v.clone())
            .await;
        assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);

        let resp = server
            .post("/api/messages")
            .add_header(bob.clone(), bob_v.clone())
            .json(&json!({"content": "hi", "conversationId": id}))
            .await;
        assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);

        let resp = server
            .get("/api/conversations/not-a-uuid/messages")
            .add_header(bob, bob_v)
            .await;
        assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
    }
}

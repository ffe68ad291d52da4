//! Axum middleware applied to the router.
//!
//! Authentication happens upstream; this service trusts the user id header
//! that the auth proxy sets and rejects `/api` requests that lack it.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use common::ServiceError;

use super::handlers::ApiError;
use super::state::AppState;

/// Authenticated user id, inserted into request extensions by [`require_user`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

/// Reject requests without a usable user id header with `401`.
pub async fn require_user(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let user = req
        .headers()
        .get(state.user_header_name.as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned);

    match user {
        Some(user) => {
            req.extensions_mut().insert(UserId(user));
            next.run(req).await
        }
        None => ApiError(ServiceError::Unauthorized).into_response(),
    }
}

//! Shared-secret authentication.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use super::response::ApiError;
use super::AppState;

/// Request header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Rejects requests whose `X-API-Key` header is missing or does not match.
pub async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|key| state.api_key_matches(key));

    if authorized {
        return next.run(request).await;
    }

    warn!(
        path = %request.uri().path(),
        key_present = request.headers().contains_key(API_KEY_HEADER),
        "Rejected request with invalid API key"
    );
    ApiError::Unauthorized.into_response()
}

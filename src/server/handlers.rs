//! Route handlers.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::correlation::{new_correlation_id, CORRELATION_HEADER};
use super::response::{render, ApiError};
use super::AppState;
use crate::db;
use crate::query::QueryRequest;

/// Query string or JSON body carrying the SQL text.
#[derive(Debug, Default, Deserialize)]
pub struct QueryParams {
    pub sql: Option<String>,
}

/// `GET /query?sql=...`
pub async fn query_get(
    State(state): State<AppState>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Response {
    match params {
        Ok(Query(params)) => run_query(state, params.sql).await,
        Err(rejection) => bad_request(rejection.body_text()),
    }
}

/// `POST /query` with a JSON body `{"sql": "..."}`.
pub async fn query_post(
    State(state): State<AppState>,
    body: Result<Json<QueryParams>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(params)) => run_query(state, params.sql).await,
        Err(rejection) => bad_request(rejection.body_text()),
    }
}

fn bad_request(message: String) -> Response {
    let correlation_id = new_correlation_id();
    let response = ApiError::BadRequest {
        message,
        correlation_id: correlation_id.clone(),
    }
    .into_response();
    with_correlation_header(response, &correlation_id)
}

async fn run_query(state: AppState, sql: Option<String>) -> Response {
    let correlation_id = new_correlation_id();

    let Some(sql) = sql.filter(|sql| !sql.trim().is_empty()) else {
        let response = ApiError::MissingSql {
            correlation_id: correlation_id.clone(),
        }
        .into_response();
        return with_correlation_header(response, &correlation_id);
    };

    let request = QueryRequest::new(sql, correlation_id.clone());
    let pipeline = Arc::clone(&state.pipeline);

    // The pipeline runs in its own task so a panic inside it still yields a
    // structured response carrying the correlation id.
    let response = match tokio::spawn(async move { pipeline.handle(&request).await }).await {
        Ok(result) => render(result, &correlation_id),
        Err(join_error) => {
            error!(
                correlation_id = %correlation_id,
                error = %join_error,
                "Query task aborted"
            );
            ApiError::Aborted {
                detail: join_error.to_string(),
                correlation_id: correlation_id.clone(),
            }
            .into_response()
        }
    };

    with_correlation_header(response, &correlation_id)
}

fn with_correlation_header(mut response: Response, correlation_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(correlation_id) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

/// Health check response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `GET /health`: opens a session and runs `SELECT 1`.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match db::check_health(state.pipeline.executor().connector()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                database: "connected",
                message: None,
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    database: "unreachable",
                    message: Some(e.raw_message().to_string()),
                }),
            )
        }
    }
}

//! Response envelopes.
//!
//! Success: `200 {status: "success", data, metadata}`.
//! Errors: `{status: "error", message, details?, metadata?}` with 400 for
//! admission and request problems, 401 for a bad API key, 500 otherwise.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::admission::{AdmissionVerdict, ReasonCode};
use crate::db::Row;
use crate::query::{ExecutionOutcome, FailureKind, PipelineResult, QueryFailure, QuerySuccess};

/// Successful query response body.
#[derive(Debug, Serialize)]
pub struct SuccessBody {
    pub status: &'static str,
    pub data: Vec<Row>,
    pub metadata: SuccessMetadata,
}

/// Metadata attached to a successful response.
#[derive(Debug, Serialize)]
pub struct SuccessMetadata {
    pub row_count: usize,
    /// Milliseconds.
    pub execution_time: u64,
    pub truncated: bool,
    pub correlation_id: String,
}

impl SuccessBody {
    pub fn new(success: QuerySuccess, correlation_id: &str) -> Self {
        Self {
            status: "success",
            metadata: SuccessMetadata {
                row_count: success.row_count,
                execution_time: success.elapsed_ms,
                truncated: success.truncated,
                correlation_id: correlation_id.to_string(),
            },
            data: success.rows,
        }
    }
}

impl IntoResponse for SuccessBody {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ErrorMetadata>,
}

/// Metadata attached to an error response.
#[derive(Debug, Default, Serialize)]
pub struct ErrorMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    /// Milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<u64>,
}

/// Everything the HTTP layer can answer with other than success.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or wrong `X-API-Key` header.
    #[error("Invalid API key")]
    Unauthorized,

    /// No SQL text in the request.
    #[error("SQL query is required")]
    MissingSql { correlation_id: String },

    /// The request body could not be read.
    #[error("Invalid request: {message}")]
    BadRequest {
        message: String,
        correlation_id: String,
    },

    /// Admission refused the SQL.
    #[error("{}", .verdict.message)]
    Rejected {
        verdict: AdmissionVerdict,
        correlation_id: String,
    },

    /// The SQL ran and failed.
    #[error("{}", .failure.user_message)]
    Failed {
        failure: QueryFailure,
        correlation_id: String,
    },

    /// The pipeline task died before producing an outcome.
    #[error("An unexpected error occurred")]
    Aborted {
        detail: String,
        correlation_id: String,
    },
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::MissingSql { .. }
            | ApiError::BadRequest { .. }
            | ApiError::Rejected { .. } => StatusCode::BAD_REQUEST,
            ApiError::Failed { .. } | ApiError::Aborted { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Builds the JSON body for this error.
    pub fn body(&self) -> ErrorBody {
        let message = self.to_string();
        let (details, metadata) = match self {
            ApiError::Unauthorized => (None, None),
            ApiError::MissingSql { correlation_id } => (None, Some(correlated(correlation_id))),
            ApiError::BadRequest { correlation_id, .. } => {
                (None, Some(correlated(correlation_id)))
            }
            ApiError::Rejected {
                verdict,
                correlation_id,
            } => (
                Some(verdict.reason.to_string()),
                Some(ErrorMetadata {
                    reason: Some(verdict.reason),
                    keyword: verdict.keyword.clone(),
                    ..correlated(correlation_id)
                }),
            ),
            ApiError::Failed {
                failure,
                correlation_id,
            } => (
                Some(failure.detail.clone()),
                Some(ErrorMetadata {
                    kind: Some(failure.kind),
                    code: failure.code,
                    execution_time: Some(failure.elapsed_ms),
                    ..correlated(correlation_id)
                }),
            ),
            ApiError::Aborted {
                detail,
                correlation_id,
            } => (
                Some(detail.clone()),
                Some(ErrorMetadata {
                    kind: Some(FailureKind::Unexpected),
                    ..correlated(correlation_id)
                }),
            ),
        };

        ErrorBody {
            status: "error",
            message,
            details,
            metadata,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

fn correlated(correlation_id: &str) -> ErrorMetadata {
    ErrorMetadata {
        correlation_id: Some(correlation_id.to_string()),
        ..Default::default()
    }
}

/// Maps a pipeline result to an HTTP response.
pub fn render(result: PipelineResult, correlation_id: &str) -> Response {
    let correlation_id = correlation_id.to_string();
    match result {
        PipelineResult::Executed(ExecutionOutcome::Success(success)) => {
            SuccessBody::new(success, &correlation_id).into_response()
        }
        PipelineResult::Executed(ExecutionOutcome::Failure(failure)) => ApiError::Failed {
            failure,
            correlation_id,
        }
        .into_response(),
        PipelineResult::Rejected(verdict) => ApiError::Rejected {
            verdict,
            correlation_id,
        }
        .into_response(),
    }
}

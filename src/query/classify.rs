//! Failure classification.
//!
//! Database errors are sorted by substring matching on the lowered message into
//! permission-denied, timeout and pass-through buckets. The raw message is kept
//! as the failure detail in every case.

use super::outcome::{FailureKind, QueryFailure};
use crate::error::GatewayError;

/// Message returned when the engine refuses a command for lack of privileges.
pub const PERMISSION_DENIED_MESSAGE: &str =
    "Permission denied: the gateway's database account is not allowed to run this query";

/// Message returned for failures outside the database layer.
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred";

/// MySQL ER_QUERY_TIMEOUT, raised when MAX_EXECUTION_TIME is exceeded.
const MYSQL_QUERY_TIMEOUT: u16 = 3024;

/// Builds the caller-facing message for a database-layer error.
pub fn database_user_message(code: Option<u16>, raw: &str, timeout_secs: u64) -> String {
    let lowered = raw.to_lowercase();
    if lowered.contains("command denied") {
        PERMISSION_DENIED_MESSAGE.to_string()
    } else if lowered.contains("timeout")
        || code == Some(MYSQL_QUERY_TIMEOUT)
        || lowered.contains("maximum statement execution time exceeded")
    {
        format!("Query timed out: execution exceeded the {timeout_secs} second limit")
    } else {
        raw.to_string()
    }
}

/// Classifies an error raised while opening a session or running a statement.
pub fn classify_failure(error: &GatewayError, timeout_secs: u64, elapsed_ms: u64) -> QueryFailure {
    let detail = error.raw_message().to_string();

    if error.is_database_layer() {
        QueryFailure {
            kind: FailureKind::DatabaseError,
            code: error.code(),
            user_message: database_user_message(error.code(), &detail, timeout_secs),
            detail,
            elapsed_ms,
        }
    } else {
        QueryFailure {
            kind: FailureKind::Unexpected,
            code: None,
            user_message: UNEXPECTED_MESSAGE.to_string(),
            detail,
            elapsed_ms,
        }
    }
}

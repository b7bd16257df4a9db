//! Execution outcome types.

use crate::db::Row;
use serde::Serialize;
use std::fmt;

/// Result of running an admitted query.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// The statement ran and its rows were collected.
    Success(QuerySuccess),
    /// The statement could not be run or failed while running.
    Failure(QueryFailure),
}

impl ExecutionOutcome {
    /// Returns true for [`ExecutionOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Elapsed wall-clock time in milliseconds, on either path.
    pub fn elapsed_ms(&self) -> u64 {
        match self {
            Self::Success(success) => success.elapsed_ms,
            Self::Failure(failure) => failure.elapsed_ms,
        }
    }
}

/// Rows collected from a successful statement.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySuccess {
    /// Rows in result order, at most the configured maximum.
    pub rows: Vec<Row>,
    /// Number of rows in `rows`.
    pub row_count: usize,
    /// Time from session open to the last row collected.
    pub elapsed_ms: u64,
    /// True when more rows were available than were returned.
    pub truncated: bool,
}

/// Failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// The database layer reported an error (connect, permission, timeout, SQL error).
    DatabaseError,
    /// Anything else.
    Unexpected,
}

impl FailureKind {
    /// Returns the wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DatabaseError => "DATABASE_ERROR",
            Self::Unexpected => "UNEXPECTED",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFailure {
    /// Failure category.
    pub kind: FailureKind,
    /// Engine-specific error code, when available.
    pub code: Option<u16>,
    /// Message suitable for the caller.
    pub user_message: String,
    /// The raw error message, always preserved.
    pub detail: String,
    /// Time from session open to the failure.
    pub elapsed_ms: u64,
}

//! Query execution for sqlgate.
//!
//! This module owns everything that happens after admission: bounded execution,
//! row limiting, failure classification, and the pipeline tying admission and
//! execution together.

mod classify;
mod executor;
mod outcome;
mod pipeline;

pub use classify::{
    classify_failure, database_user_message, PERMISSION_DENIED_MESSAGE, UNEXPECTED_MESSAGE,
};
pub use executor::QueryExecutor;
pub use outcome::{ExecutionOutcome, FailureKind, QueryFailure, QuerySuccess};
pub use pipeline::{PipelineResult, QueryPipeline, QueryRequest};

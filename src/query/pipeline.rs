//! Admission followed by bounded execution.

use std::sync::Arc;

use tracing::info;

use super::executor::QueryExecutor;
use super::outcome::ExecutionOutcome;
use crate::admission::{AdmissionFilter, AdmissionVerdict};
use crate::config::GatewayConfig;
use crate::db::DatabaseConnector;
use crate::error::Result;

/// One inbound query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// Raw SQL text as supplied by the caller.
    pub sql: String,
    /// Token identifying this request in logs and error bodies.
    pub correlation_id: String,
}

impl QueryRequest {
    /// Creates a request.
    pub fn new(sql: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            correlation_id: correlation_id.into(),
        }
    }
}

/// What the pipeline produced for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineResult {
    /// Admission refused the SQL; no session was opened.
    Rejected(AdmissionVerdict),
    /// The SQL was admitted and executed.
    Executed(ExecutionOutcome),
}

/// The admission filter and executor, wired together.
#[derive(Clone)]
pub struct QueryPipeline {
    filter: AdmissionFilter,
    executor: QueryExecutor,
}

impl QueryPipeline {
    /// Creates a pipeline from its two stages.
    pub fn new(filter: AdmissionFilter, executor: QueryExecutor) -> Self {
        Self { filter, executor }
    }

    /// Builds both stages from configuration.
    pub fn from_config(config: &GatewayConfig, connector: Arc<dyn DatabaseConnector>) -> Result<Self> {
        let filter = AdmissionFilter::new(&config.admission_policy())?;
        let executor = QueryExecutor::new(connector, config.limits.clone());
        Ok(Self::new(filter, executor))
    }

    /// The admission stage.
    pub fn filter(&self) -> &AdmissionFilter {
        &self.filter
    }

    /// The execution stage.
    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    /// Runs admission, then execution when admitted.
    pub async fn handle(&self, request: &QueryRequest) -> PipelineResult {
        match self.filter.admit(&request.sql) {
            Ok(admitted) => {
                info!(
                    correlation_id = %request.correlation_id,
                    missing_limit = admitted.missing_limit(),
                    "Query admitted"
                );
                PipelineResult::Executed(
                    self.executor
                        .execute(&admitted, &request.correlation_id)
                        .await,
                )
            }
            Err(verdict) => {
                info!(
                    correlation_id = %request.correlation_id,
                    reason = %verdict.reason,
                    message = %verdict.message,
                    "Query rejected by admission"
                );
                PipelineResult::Rejected(verdict)
            }
        }
    }
}

//! Bounded query execution.
//!
//! Runs admitted SQL in a fresh session with a server-side execution cap,
//! collects at most `max_result_rows` rows and classifies any failure.
//! Nothing here retries; a failed query is reported once.

use std::sync::Arc;
use std::time::Instant;

use futures::TryStreamExt;
use tracing::{debug, error, info, warn};

use super::classify::classify_failure;
use super::outcome::{ExecutionOutcome, FailureKind, QuerySuccess};
use crate::admission::AdmittedSql;
use crate::config::LimitsConfig;
use crate::db::{DatabaseConnector, DatabaseSession, Row};
use crate::error::Result;

/// Executes admitted queries under the configured limits.
#[derive(Clone)]
pub struct QueryExecutor {
    connector: Arc<dyn DatabaseConnector>,
    limits: LimitsConfig,
}

struct CollectedRows {
    rows: Vec<Row>,
    truncated: bool,
}

impl QueryExecutor {
    /// Creates a new query executor.
    pub fn new(connector: Arc<dyn DatabaseConnector>, limits: LimitsConfig) -> Self {
        Self { connector, limits }
    }

    /// The connector sessions are opened from.
    pub fn connector(&self) -> &dyn DatabaseConnector {
        self.connector.as_ref()
    }

    /// The limits this executor enforces.
    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// Returns the SQL that will actually be sent: the admitted text, with a
    /// `LIMIT` appended on its own line when it had none.
    pub fn bounded_sql(&self, query: &AdmittedSql) -> String {
        if query.missing_limit() {
            format!(
                "{}\nLIMIT {}",
                query.as_str().trim_end(),
                self.limits.max_result_rows
            )
        } else {
            query.as_str().to_string()
        }
    }

    /// Runs an admitted query and returns a classified outcome.
    pub async fn execute(&self, query: &AdmittedSql, correlation_id: &str) -> ExecutionOutcome {
        let sql = self.bounded_sql(query);
        if query.missing_limit() {
            debug!(
                correlation_id = %correlation_id,
                limit = self.limits.max_result_rows,
                "Appended LIMIT to unbounded query"
            );
        }

        let start = Instant::now();
        let result = self.run(&sql, query.missing_limit(), correlation_id).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(collected) => {
                let row_count = collected.rows.len();
                if collected.truncated {
                    warn!(
                        correlation_id = %correlation_id,
                        max_rows = self.limits.max_result_rows,
                        "Result truncated to the row limit"
                    );
                }
                info!(
                    correlation_id = %correlation_id,
                    row_count,
                    elapsed_ms,
                    truncated = collected.truncated,
                    "Query succeeded"
                );
                ExecutionOutcome::Success(QuerySuccess {
                    rows: collected.rows,
                    row_count,
                    elapsed_ms,
                    truncated: collected.truncated,
                })
            }
            Err(e) => {
                let failure = classify_failure(&e, self.limits.query_timeout_secs, elapsed_ms);
                match failure.kind {
                    FailureKind::DatabaseError => warn!(
                        correlation_id = %correlation_id,
                        code = ?failure.code,
                        elapsed_ms,
                        error = %e,
                        "Query failed in the database layer"
                    ),
                    FailureKind::Unexpected => error!(
                        correlation_id = %correlation_id,
                        elapsed_ms,
                        error = %e,
                        "Query failed unexpectedly"
                    ),
                }
                ExecutionOutcome::Failure(failure)
            }
        }
    }

    async fn run(
        &self,
        sql: &str,
        limit_appended: bool,
        correlation_id: &str,
    ) -> Result<CollectedRows> {
        let mut session = self.connector.open().await?;
        let result = self
            .run_in_session(session.as_mut(), sql, limit_appended)
            .await;

        // A graceful close would drain the rest of a truncated result set, so
        // truncated or failed sessions are dropped instead.
        if matches!(&result, Ok(collected) if !collected.truncated) {
            if let Err(e) = session.close().await {
                warn!(correlation_id = %correlation_id, error = %e, "Failed to close database session");
            }
        } else {
            drop(session);
        }

        result
    }

    async fn run_in_session(
        &self,
        session: &mut dyn DatabaseSession,
        sql: &str,
        limit_appended: bool,
    ) -> Result<CollectedRows> {
        session
            .set_max_execution_time(self.limits.query_timeout())
            .await?;

        let max_rows = self.limits.max_result_rows;
        let mut rows = Vec::new();
        let mut truncated = false;

        // An appended LIMIT hides any row past the cap, so reaching the cap
        // counts as truncation. An explicit LIMIT needs the next row to prove it.
        let mut stream = session.fetch(sql);
        while let Some(row) = stream.try_next().await? {
            if rows.len() == max_rows {
                truncated = true;
                break;
            }
            rows.push(row);
            if limit_appended && rows.len() == max_rows {
                truncated = true;
                break;
            }
        }

        Ok(CollectedRows { rows, truncated })
    }
}

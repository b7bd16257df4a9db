//! Mock database connector for testing.
//!
//! Provides an in-memory table store with injectable failures and session
//! bookkeeping, so the pipeline can be exercised without a MySQL server.

use super::{DatabaseConnector, DatabaseSession, Row, RowStream};
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::Duration;

/// Failure modes the mock can simulate.
#[derive(Debug, Clone, PartialEq)]
pub enum MockFailure {
    /// Opening a session fails as if the server were down.
    Unreachable,
    /// Every statement fails with the given engine error.
    Database { code: Option<u16>, message: String },
    /// Row decoding fails partway through the result.
    Decode(String),
    /// The session panics while running a statement.
    Panic,
}

/// Bookkeeping shared by all sessions of one connector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    /// Sessions successfully opened.
    pub opened: usize,
    /// Sessions released, through `close` or drop.
    pub closed: usize,
    /// Statements passed to `fetch`, in order.
    pub executed: Vec<String>,
    /// Execution-time caps applied, in order.
    pub execution_limits: Vec<Duration>,
}

/// A mock connector serving rows from in-memory tables.
#[derive(Clone, Default)]
pub struct MockConnector {
    tables: Arc<HashMap<String, Vec<Row>>>,
    failure: Option<MockFailure>,
    stats: Arc<Mutex<SessionStats>>,
}

impl MockConnector {
    /// Creates a mock with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table. Names are matched case-insensitively.
    pub fn with_table(mut self, name: &str, rows: Vec<Row>) -> Self {
        Arc::make_mut(&mut self.tables).insert(name.to_lowercase(), rows);
        self
    }

    /// Makes the mock fail in the given way.
    pub fn failing_with(mut self, failure: MockFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Returns a snapshot of the session bookkeeping.
    pub fn stats(&self) -> SessionStats {
        lock(&self.stats).clone()
    }
}

#[async_trait]
impl DatabaseConnector for MockConnector {
    async fn open(&self) -> Result<Box<dyn DatabaseSession>> {
        if self.failure == Some(MockFailure::Unreachable) {
            return Err(GatewayError::connection(
                "Can't connect to MySQL server on 'mock:3306' (111)",
            ));
        }

        lock(&self.stats).opened += 1;
        Ok(Box::new(MockSession {
            tables: Arc::clone(&self.tables),
            failure: self.failure.clone(),
            stats: Arc::clone(&self.stats),
        }))
    }

    fn describe(&self) -> String {
        format!("mock ({} tables)", self.tables.len())
    }
}

struct MockSession {
    tables: Arc<HashMap<String, Vec<Row>>>,
    failure: Option<MockFailure>,
    stats: Arc<Mutex<SessionStats>>,
}

impl MockSession {
    fn rows_for(&self, sql: &str) -> Result<Vec<Row>> {
        let mut rows = match table_name(sql) {
            Some(table) => self.tables.get(&table).cloned().ok_or_else(|| {
                GatewayError::database(Some(1146), format!("Table 'mock.{table}' doesn't exist"))
            })?,
            None => vec![Row::new().with("1", 1)],
        };

        if let Some(limit) = trailing_limit(sql) {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}

#[async_trait]
impl DatabaseSession for MockSession {
    async fn set_max_execution_time(&mut self, limit: Duration) -> Result<()> {
        lock(&self.stats).execution_limits.push(limit);
        Ok(())
    }

    fn fetch<'a>(&'a mut self, sql: &'a str) -> RowStream<'a> {
        lock(&self.stats).executed.push(sql.to_string());

        match &self.failure {
            Some(MockFailure::Panic) => panic!("mock session panicked on: {sql}"),
            Some(MockFailure::Database { code, message }) => {
                stream::iter(vec![Err(GatewayError::database(*code, message.clone()))]).boxed()
            }
            Some(MockFailure::Decode(message)) => {
                let first = self.rows_for(sql).map(|rows| rows.into_iter().next());
                let items = match first {
                    Ok(Some(row)) => vec![Ok(row), Err(GatewayError::internal(message.clone()))],
                    Ok(None) => vec![Err(GatewayError::internal(message.clone()))],
                    Err(e) => vec![Err(e)],
                };
                stream::iter(items).boxed()
            }
            Some(MockFailure::Unreachable) | None => match self.rows_for(sql) {
                Ok(rows) => stream::iter(rows.into_iter().map(Ok)).boxed(),
                Err(e) => stream::iter(vec![Err(e)]).boxed(),
            },
        }
    }

    async fn ping(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        lock(&self.stats).closed += 1;
    }
}

fn lock(stats: &Mutex<SessionStats>) -> MutexGuard<'_, SessionStats> {
    stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn table_name(sql: &str) -> Option<String> {
    static FROM: OnceLock<Regex> = OnceLock::new();
    let re = FROM.get_or_init(|| {
        Regex::new(r"(?i)\bFROM\s+`?([A-Za-z_][A-Za-z0-9_]*)`?").expect("valid regex")
    });
    re.captures(sql).map(|caps| caps[1].to_lowercase())
}

fn trailing_limit(sql: &str) -> Option<usize> {
    static LIMIT: OnceLock<Regex> = OnceLock::new();
    let re = LIMIT.get_or_init(|| Regex::new(r"(?i)\bLIMIT\s+(\d+)\s*$").expect("valid regex"));
    re.captures(sql).and_then(|caps| caps[1].parse().ok())
}

//! Database abstraction layer for sqlgate.
//!
//! Provides a trait-based interface for opening short-lived database sessions,
//! allowing the MySQL backend and the in-memory mock to be used interchangeably.

mod mock;
mod mysql;
mod types;

pub use mock::{MockConnector, MockFailure, SessionStats};
pub use mysql::MySqlConnector;
pub use types::{Row, Value};

use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::time::Duration;

/// Stream of decoded rows borrowed from an open session.
pub type RowStream<'a> = BoxStream<'a, Result<Row>>;

/// Opens fresh database sessions.
///
/// Implementations hold only immutable connection parameters; every call to
/// [`DatabaseConnector::open`] yields an independent session.
#[async_trait]
pub trait DatabaseConnector: Send + Sync {
    /// Opens a new session.
    async fn open(&self) -> Result<Box<dyn DatabaseSession>>;

    /// Returns a display-safe description of the target (no credentials).
    fn describe(&self) -> String;
}

/// A single open database session.
///
/// Dropping a session releases it. [`DatabaseSession::close`] is the graceful path
/// and should be preferred when the caller is still in control.
#[async_trait]
pub trait DatabaseSession: Send {
    /// Caps how long the server may spend on each statement in this session.
    async fn set_max_execution_time(&mut self, limit: Duration) -> Result<()>;

    /// Runs a statement and streams its rows.
    fn fetch<'a>(&'a mut self, sql: &'a str) -> RowStream<'a>;

    /// Runs a trivial statement to verify the session is usable.
    async fn ping(&mut self) -> Result<()>;

    /// Closes the session.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Opens a session, pings it, and closes it again.
pub async fn check_health(connector: &dyn DatabaseConnector) -> Result<()> {
    let mut session = connector.open().await?;
    let result = session.ping().await;
    let closed = session.close().await;
    result.and(closed)
}

//! MySQL database connector implementation.
//!
//! Provides the `MySqlConnector` struct that implements the `DatabaseConnector` trait
//! using sqlx. Each session is a dedicated connection, never pooled.

use crate::config::DatabaseConfig;
use crate::db::{DatabaseConnector, DatabaseSession, Row, RowStream, Value};
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use futures::StreamExt;
use sqlx::mysql::{MySql, MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, ConnectOptions, Connection, Decode, Row as SqlxRow, TypeInfo};
use std::time::Duration;
use tracing::debug;

/// MySQL connector holding immutable connection parameters.
#[derive(Debug, Clone)]
pub struct MySqlConnector {
    options: MySqlConnectOptions,
    connect_timeout: Duration,
    target: String,
}

impl MySqlConnector {
    /// Creates a connector from the database section of the configuration.
    pub fn new(config: &DatabaseConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        Self {
            options,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            target: config.display_string(),
        }
    }
}

#[async_trait]
impl DatabaseConnector for MySqlConnector {
    async fn open(&self) -> Result<Box<dyn DatabaseSession>> {
        debug!(target_db = %self.target, "Opening MySQL session");

        let conn = tokio::time::timeout(self.connect_timeout, self.options.connect())
            .await
            .map_err(|_| {
                GatewayError::connection(format!(
                    "Connection to {} timed out after {} seconds",
                    self.target,
                    self.connect_timeout.as_secs()
                ))
            })??;

        Ok(Box::new(MySqlSession { conn }))
    }

    fn describe(&self) -> String {
        self.target.clone()
    }
}

struct MySqlSession {
    conn: MySqlConnection,
}

#[async_trait]
impl DatabaseSession for MySqlSession {
    async fn set_max_execution_time(&mut self, limit: Duration) -> Result<()> {
        let statement = format!("SET SESSION MAX_EXECUTION_TIME = {}", limit.as_millis());
        sqlx::query(&statement).execute(&mut self.conn).await?;
        Ok(())
    }

    fn fetch<'a>(&'a mut self, sql: &'a str) -> RowStream<'a> {
        sqlx::query(sql)
            .fetch(&mut self.conn)
            .map(|row| row.map(|row| convert_row(&row)).map_err(GatewayError::from))
            .boxed()
    }

    async fn ping(&mut self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&mut self.conn).await?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}

/// Converts a sqlx MySqlRow to our Row type.
fn convert_row(row: &MySqlRow) -> Row {
    let columns = row.columns();
    let mut converted = Row::with_capacity(columns.len());
    for (i, col) in columns.iter().enumerate() {
        converted.push(col.name(), convert_value(row, i, col.type_info().name()));
    }
    converted
}

/// Converts a single column value from a MySqlRow to our Value type.
///
/// Values that cannot be decoded as their reported type become NULL.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    let value = match type_name.to_uppercase().as_str() {
        "BOOLEAN" => decode::<bool>(row, index).map(Value::Bool),

        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => decode::<u64>(row, index).map(Value::UInt),

        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            decode::<i64>(row, index).map(Value::Int)
        }

        "FLOAT" => decode::<f32>(row, index).map(|v| Value::Float(v as f64)),

        "DOUBLE" => decode::<f64>(row, index).map(Value::Float),

        "DATE" => decode::<NaiveDate>(row, index).map(|v| Value::String(v.to_string())),

        "DATETIME" | "TIMESTAMP" => {
            decode::<NaiveDateTime>(row, index).map(|v| Value::String(v.to_string()))
        }

        "TIME" => decode::<NaiveTime>(row, index).map(|v| Value::String(v.to_string())),

        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => decode::<Vec<u8>>(row, index).map(Value::Bytes),

        // DECIMAL, text, JSON, ENUM and SET arrive as strings
        _ => decode::<String>(row, index)
            .map(Value::String)
            .or_else(|| decode::<Vec<u8>>(row, index).map(Value::Bytes)),
    };

    value.unwrap_or(Value::Null)
}

fn decode<'r, T>(row: &'r MySqlRow, index: usize) -> Option<T>
where
    T: Decode<'r, MySql>,
{
    row.try_get_unchecked::<Option<T>, _>(index).ok().flatten()
}

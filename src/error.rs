//! Error types for sqlgate.
//!
//! Defines the main error enum used throughout the gateway.

use thiserror::Error;

/// Main error type for gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Database connection errors (host unreachable, auth failed, connect timeout, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Errors reported by the database engine while running a statement.
    #[error("Database error: {message}")]
    Database {
        /// Engine-specific error number, when the engine supplied one.
        code: Option<u16>,
        /// Raw engine message.
        message: String,
    },

    /// Request-level query errors (missing SQL text, malformed request body, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors (row decoding failures, unexpected states, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a database error with an optional engine code.
    pub fn database(code: Option<u16>, msg: impl Into<String>) -> Self {
        Self::Database {
            code,
            message: msg.into(),
        }
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true for failures raised by the database layer itself.
    pub fn is_database_layer(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Database { .. })
    }

    /// Returns the engine error code, if any.
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Database { code, .. } => *code,
            _ => None,
        }
    }

    /// Returns the message without the category prefix.
    pub fn raw_message(&self) -> &str {
        match self {
            Self::Connection(msg)
            | Self::Query(msg)
            | Self::Config(msg)
            | Self::Internal(msg) => msg,
            Self::Database { message, .. } => message,
        }
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Database { .. } => "Database Error",
            Self::Query(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Database(db_error) => {
                let code = db_error
                    .try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>()
                    .map(|e| e.number());
                Self::database(code, db_error.message())
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Configuration(_) => Self::connection(error.to_string()),
            sqlx::Error::Protocol(_) => Self::database(None, error.to_string()),
            other => Self::internal(other.to_string()),
        }
    }
}

/// Result type alias using GatewayError.
pub type Result<T> = std::result::Result<T, GatewayError>;

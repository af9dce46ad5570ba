//! Error types for mess_store.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
///
/// "Not found" on a read is not an error; reads return `Ok(None)` instead.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    /// The database rejected or failed to execute a statement.
    #[error("Database error: {0}")]
    #[diagnostic(code(mess_store::database))]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    #[diagnostic(code(mess_store::migration))]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// IO error.
    #[error("IO error: {0}")]
    #[diagnostic(code(mess_store::io))]
    Io(#[from] std::io::Error),

    /// A row that an update must return does not exist.
    #[error("{entity} not found: {key}")]
    #[diagnostic(code(mess_store::not_found))]
    NotFound { entity: &'static str, key: String },

    /// A stored timestamp could not be parsed.
    #[error("Invalid timestamp in column {column}: {value:?}")]
    #[diagnostic(
        code(mess_store::invalid_timestamp),
        help("timestamps are stored as RFC 3339 strings, e.g. 2024-05-01T12:00:00.000000000Z")
    )]
    InvalidTimestamp {
        column: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A timestamp has no RFC 3339 form and cannot be stored.
    #[error("Timestamp for column {column} is out of range: {timestamp}")]
    #[diagnostic(
        code(mess_store::timestamp_out_of_range),
        help("stored timestamps must fall between years 0000 and 9999")
    )]
    TimestampOutOfRange {
        column: &'static str,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Configuration could not be read or parsed.
    #[error("Invalid configuration from {origin}: {message}")]
    #[diagnostic(code(mess_store::config))]
    Config { origin: String, message: String },
}

impl StoreError {
    /// Create a not found error.
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Whether the store refused the write because of a unique constraint,
    /// e.g. a duplicate email or a second link of the same provider account.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Database(sqlx::Error::Database(e)) if e.is_unique_violation())
    }

    /// Whether the write referenced a user that does not exist.
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, Self::Database(sqlx::Error::Database(e)) if e.is_foreign_key_violation())
    }
}

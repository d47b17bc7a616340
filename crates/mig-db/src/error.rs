//! Error types for mig-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Table not found (D003)
    #[error("[D003] Table not found: {0}")]
    TableNotFound(String),

    /// Identifier that cannot be safely interpolated (D004)
    #[error("[D004] Invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    /// Ledger row that cannot be read back (D005)
    #[error("[D005] Corrupt ledger row for '{module}/{filename}': {message}")]
    CorruptLedger {
        module: String,
        filename: String,
        message: String,
    },

    /// Mutex poisoned (D006)
    #[error("[D006] Database mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// Internal error (D007)
    #[error("[D007] Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Whether retrying the same call may succeed.
    ///
    /// Only connection failures qualify; a statement that failed once fails
    /// again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::ConnectionError(_))
    }
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error carries no structured catalog variants, so classify
        // by message with narrow patterns
        let msg = err.to_string();
        if msg.contains("Table with name")
            || (msg.contains("Catalog Error") && msg.contains("Table") && msg.contains("not found"))
        {
            DbError::TableNotFound(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        DbError::MutexPoisoned(err.to_string())
    }
}

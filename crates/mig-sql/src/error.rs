//! Error types for mig-sql

use thiserror::Error;

/// SQL parsing, schema tracking and reversal errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqlError {
    /// SQL parse error (S001)
    #[error("[S001] SQL parse error at line {line}, column {column}: {message}")]
    ParseError {
        message: String,
        line: usize,
        column: usize,
    },

    /// Empty SQL (S002)
    #[error("[S002] SQL is empty")]
    EmptySql,

    /// Unsupported SQL statement (S003)
    #[error("[S003] Unsupported SQL statement type: {0}")]
    UnsupportedStatement(String),

    /// Table not present in the schema (S004)
    #[error("[S004] Table '{0}' does not exist")]
    UnknownTable(String),

    /// Table created twice (S005)
    #[error("[S005] Table '{0}' already exists")]
    DuplicateTable(String),

    /// Column not present in the table (S006)
    #[error("[S006] Column '{column}' does not exist in table '{table}'")]
    UnknownColumn { table: String, column: String },

    /// Column added twice (S007)
    #[error("[S007] Column '{column}' already exists in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    /// Index or constraint not present in the table (S008)
    #[error("[S008] Index '{index}' does not exist in table '{table}'")]
    UnknownIndex { table: String, index: String },

    /// Reversal needs the table's prior definition but none was supplied (S009)
    #[error("[S009] No snapshot of table '{0}' available to compute the reverse statement")]
    MissingSnapshot(String),

    /// Snapshot supplied for a different table (S010)
    #[error("[S010] Snapshot is for table '{snapshot}', statement targets '{table}'")]
    SnapshotMismatch { table: String, snapshot: String },

    /// Index or constraint name already used (S012)
    #[error("[S012] Duplicate key name '{index}' in table '{table}'")]
    DuplicateIndex { table: String, index: String },

    /// Tokenizer failure (S011)
    #[error("[S011] SQL tokenize error at line {line}: {message}")]
    Tokenize { message: String, line: usize },
}

/// Result type alias for SqlError
pub type SqlResult<T> = Result<T, SqlError>;

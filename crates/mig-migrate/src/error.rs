//! Error types for mig-migrate

use mig_core::CoreError;
use mig_db::DbError;
use mig_lint::LintError;
use mig_sql::SqlError;
use std::fmt;
use thiserror::Error;

/// Coarse classification of a migration error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed SQL
    ParseError,
    /// Ordering, duplicate, illegal-alter or unsupported-statement problem
    StructuralViolation,
    /// A lint rule matched
    LintViolation,
    /// A statement failed against the sandbox or production
    ExecutionError,
    /// An installed script changed after it was applied
    DriftError,
    /// Bad project or rule configuration
    Configuration,
    /// Filesystem failure
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::ParseError => "parse error",
            ErrorKind::StructuralViolation => "structural violation",
            ErrorKind::LintViolation => "lint violation",
            ErrorKind::ExecutionError => "execution error",
            ErrorKind::DriftError => "drift error",
            ErrorKind::Configuration => "configuration error",
            ErrorKind::Io => "io error",
        })
    }
}

/// Migration errors
#[derive(Error, Debug)]
pub enum MigrateError {
    /// M001: Script does not parse
    #[error("[M001] Failed to parse '{script}': {source}")]
    Parse { script: String, source: SqlError },

    /// M002: Statement kind not allowed in a migration script
    #[error("[M002] '{script}' line {line}: {kind} statements are not allowed in migration scripts")]
    UnsupportedStatement {
        script: String,
        line: usize,
        kind: String,
    },

    /// M003: Installed script after a pending one
    #[error("[M003] Module '{module}': '{installed}' is installed but the earlier '{pending}' is not")]
    OutOfOrder {
        module: String,
        pending: String,
        installed: String,
    },

    /// M004: Same filename in two modules
    #[error("[M004] Duplicate script filename '{filename}' in '{first}' and '{second}'")]
    DuplicateFilename {
        filename: String,
        first: String,
        second: String,
    },

    /// M005: ALTER on a table the module has not created
    #[error("[M005] '{script}' line {line}: ALTER TABLE '{table}' before the module creates it")]
    IllegalAlter {
        script: String,
        table: String,
        line: usize,
    },

    /// M006: Installed script edited after it was applied
    #[error("[M006] Checksum drift in '{script}': applied as {recorded}, now {current}")]
    ChecksumDrift {
        script: String,
        recorded: String,
        current: String,
    },

    /// M007: Lint rules matched
    #[error("[M007] Lint failed with {count} violations:\n{report}")]
    Lint { count: usize, report: String },

    /// M008: Statement failed
    #[error("[M008] '{script}' failed on statement:\n{statement}\n{source}")]
    Execution {
        script: String,
        statement: String,
        source: DbError,
    },

    /// M009: Sandbox reached a different structure than expected
    #[error("[M009] Sandbox structure differs from the expected schema:\n  {}", .differences.join("\n  "))]
    Verify { differences: Vec<String> },

    /// M010: Sandbox could not be provisioned
    #[error("[M010] Sandbox provisioning failed after {attempts} attempts: {source}")]
    Sandbox { attempts: u32, source: DbError },

    /// M011: Database error outside a script (ledger, introspection)
    #[error("[M011] Database error: {0}")]
    Database(#[from] DbError),

    /// M012: Table definition read back from a database does not parse
    #[error("[M012] Cannot parse definition of table '{table}': {source}")]
    Snapshot { table: String, source: SqlError },

    /// M013: Script not found in the set
    #[error("[M013] Unknown script '{0}'")]
    UnknownScript(String),

    /// M014: Lint rule configuration rejected
    #[error("[M014] {0}")]
    LintSetup(#[from] LintError),

    /// M015: Configuration or filesystem error from mig-core
    #[error("[M015] {0}")]
    Core(#[from] CoreError),

    /// M016: Expected schema file does not parse
    #[error("[M016] Failed to parse expected schema '{path}': {source}")]
    ExpectedSchema { path: String, source: SqlError },

    /// M017: Existing database does not match a module's baseline scripts
    #[error("[M017] Module '{module}' baseline differs from the existing database:\n  {}", .differences.join("\n  "))]
    BaselineMismatch {
        module: String,
        differences: Vec<String>,
    },
}

impl MigrateError {
    /// Classification used for reporting and exit handling
    pub fn kind(&self) -> ErrorKind {
        match self {
            MigrateError::Parse { .. }
            | MigrateError::Snapshot { .. }
            | MigrateError::ExpectedSchema { .. } => ErrorKind::ParseError,
            MigrateError::UnsupportedStatement { .. }
            | MigrateError::OutOfOrder { .. }
            | MigrateError::DuplicateFilename { .. }
            | MigrateError::IllegalAlter { .. }
            | MigrateError::Verify { .. }
            | MigrateError::BaselineMismatch { .. } => ErrorKind::StructuralViolation,
            MigrateError::Lint { .. } => ErrorKind::LintViolation,
            MigrateError::Execution { .. }
            | MigrateError::Sandbox { .. }
            | MigrateError::Database(_) => ErrorKind::ExecutionError,
            MigrateError::ChecksumDrift { .. } => ErrorKind::DriftError,
            MigrateError::UnknownScript(_) | MigrateError::LintSetup(_) => {
                ErrorKind::Configuration
            }
            MigrateError::Core(CoreError::Io(_) | CoreError::IoWithPath { .. }) => ErrorKind::Io,
            MigrateError::Core(_) => ErrorKind::Configuration,
        }
    }
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;

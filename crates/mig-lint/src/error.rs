//! Error types for mig-lint

use thiserror::Error;

/// Lint engine error type
///
/// These use the `L` prefix. Rule matches are not errors; they are
/// collected as [`crate::Violation`]s by the linter.
#[derive(Error, Debug)]
pub enum LintError {
    /// L001: Rule name not present in the registry
    #[error("[L001] Unknown lint rule '{0}'")]
    UnknownRule(String),

    /// L002: Rule registered twice
    #[error("[L002] Lint rule '{0}' is already registered")]
    DuplicateRule(String),

    /// L003: Two configured rules report under the same name
    #[error("[L003] Lint rule name '{0}' is configured more than once; set a distinct alias")]
    DuplicateAlias(String),

    /// L004: Rule metadata failed validation
    #[error("[L004] Invalid meta for rule '{rule}': {message} (expected {expected})")]
    InvalidMeta {
        rule: String,
        message: String,
        expected: &'static str,
    },

    /// L005: Core error propagation (allow-list compilation)
    #[error("[L005] {0}")]
    Core(#[from] mig_core::CoreError),

    /// L006: Script could not be parsed
    #[error("[L006] Failed to parse '{script}': {source}")]
    Parse {
        script: String,
        source: mig_sql::SqlError,
    },
}

/// Result type alias for LintError
pub type LintResult<T> = Result<T, LintError>;

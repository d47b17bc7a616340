//! Ledger records: the persisted history of applied scripts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default name of the ledger table in the target database.
pub const DEFAULT_LEDGER_TABLE: &str = "schema_migration_history";

/// One applied script.
///
/// Records are written once, after the script succeeded, and never updated.
/// The checksum is the one the script had when it was applied; comparing it
/// with the current file content detects edits to history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub module: String,
    pub filename: String,
    pub checksum: String,
    pub applied_at: DateTime<Utc>,
}

impl LedgerRecord {
    /// Create a record stamped with the current time.
    pub fn now(
        module: impl Into<String>,
        filename: impl Into<String>,
        checksum: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            filename: filename.into(),
            checksum: checksum.into(),
            applied_at: Utc::now(),
        }
    }

    /// Lookup key of the record.
    pub fn key(&self) -> (&str, &str) {
        (&self.module, &self.filename)
    }
}

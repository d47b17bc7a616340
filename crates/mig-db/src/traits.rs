//! Database trait definitions
//!
//! A migration target is split by concern: executing statements, introspecting
//! table structure and persisting the ledger. [`Database`] is implemented for
//! every type that provides all three, so callers hold a single
//! `Arc<dyn Database>`.

use crate::error::DbResult;
use async_trait::async_trait;
use mig_core::LedgerRecord;

/// Statement execution and target lifecycle.
#[async_trait]
pub trait DatabaseCore: Send + Sync {
    /// Execute a single statement, returning affected rows where known
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute one or more `;`-separated statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Execute statements inside one transaction: all commit or none do
    async fn execute_transaction(&self, statements: &[String]) -> DbResult<()>;

    /// Drop everything in the target and start over empty
    async fn reset(&self) -> DbResult<()>;

    /// Backend type identifier for logging
    fn db_type(&self) -> &'static str;

    /// Stable identity of the target; two handles on the same target report
    /// the same identity
    fn identity(&self) -> String;
}

/// Structure introspection.
#[async_trait]
pub trait DatabaseSchema: Send + Sync {
    /// `CREATE TABLE` text of a table, or `None` when it does not exist
    async fn describe_table(&self, name: &str) -> DbResult<Option<String>>;

    /// Names of all user tables, sorted
    async fn table_names(&self) -> DbResult<Vec<String>>;
}

/// Persistence of applied-script records.
#[async_trait]
pub trait DatabaseLedger: Send + Sync {
    /// Create the ledger table if it is missing
    async fn ensure_ledger(&self, table: &str) -> DbResult<()>;

    /// All records, in application order
    async fn read_ledger(&self, table: &str) -> DbResult<Vec<LedgerRecord>>;

    /// Append one record
    async fn insert_ledger(&self, table: &str, record: &LedgerRecord) -> DbResult<()>;
}

/// A complete migration target.
pub trait Database: DatabaseCore + DatabaseSchema + DatabaseLedger {}

impl<T: DatabaseCore + DatabaseSchema + DatabaseLedger> Database for T {}

/// Validate a ledger table name before it is interpolated into SQL.
pub fn validate_table_name(name: &str) -> DbResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(crate::error::DbError::InvalidIdentifier(name.to_string()))
    }
}

//! DuckDB database backend implementation
//!
//! Statements are passed through to DuckDB unchanged. Table structure is read
//! back from `duckdb_tables()`, whose `sql` column holds the `CREATE TABLE`
//! text of each table.

use crate::error::{DbError, DbResult};
use crate::traits::{validate_table_name, DatabaseCore, DatabaseLedger, DatabaseSchema};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use duckdb::{params, Connection};
use mig_core::LedgerRecord;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Distinguishes in-memory databases, which never share state
static IN_MEMORY_COUNTER: AtomicU64 = AtomicU64::new(0);

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
    identity: String,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        let id = IN_MEMORY_COUNTER.fetch_add(1, Ordering::Relaxed);
        Ok(Self {
            conn: Mutex::new(conn),
            identity: format!("duckdb::memory:{}", id),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path).map_err(|e| DbError::ConnectionError(e.to_string()))?;
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Ok(Self {
            conn: Mutex::new(conn),
            identity: format!("duckdb:{}", canonical.display()),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn execute_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.conn.lock()?;
        conn.execute(sql, [])
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.conn.lock()?;
        conn.execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    fn execute_transaction_sync(&self, statements: &[String]) -> DbResult<()> {
        let mut conn = self.conn.lock()?;
        let tx = conn.transaction()?;
        for sql in statements {
            // Dropping the transaction on error rolls it back
            tx.execute_batch(sql)
                .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Names from a single-column catalog query
    fn query_names(&self, sql: &str) -> DbResult<Vec<String>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn reset_sync(&self) -> DbResult<()> {
        let views = self.query_names(
            "SELECT view_name FROM duckdb_views() WHERE schema_name = 'main' AND NOT internal",
        )?;
        let tables = self.table_names_sync()?;
        for view in views {
            self.execute_sync(&format!("DROP VIEW IF EXISTS {}", quote(&view)))?;
        }
        // Referencing tables must go before the tables they reference
        for table in tables.iter().rev() {
            self.execute_sync(&format!("DROP TABLE IF EXISTS {}", quote(table)))?;
        }
        log::debug!("Reset DuckDB target {}", self.identity);
        Ok(())
    }

    fn table_names_sync(&self) -> DbResult<Vec<String>> {
        self.query_names(
            "SELECT table_name FROM duckdb_tables() WHERE schema_name = 'main' AND NOT internal \
             ORDER BY table_name",
        )
    }

    fn describe_table_sync(&self, name: &str) -> DbResult<Option<String>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            "SELECT sql FROM duckdb_tables() \
             WHERE schema_name = 'main' AND lower(table_name) = lower(?)",
        )?;
        let mut rows = stmt.query_map([name], |row| row.get::<_, String>(0))?;
        let sql = rows.next().transpose()?;
        Ok(sql)
    }

    fn read_ledger_sync(&self, table: &str) -> DbResult<Vec<LedgerRecord>> {
        validate_table_name(table)?;
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT module, filename, checksum, applied_at FROM {} \
             ORDER BY applied_at, module, filename",
            quote(table)
        ))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(module, filename, checksum, applied_at)| {
                let applied_at = DateTime::parse_from_rfc3339(&applied_at)
                    .map_err(|e| DbError::CorruptLedger {
                        module: module.clone(),
                        filename: filename.clone(),
                        message: format!("bad timestamp '{}': {}", applied_at, e),
                    })?
                    .with_timezone(&Utc);
                Ok(LedgerRecord {
                    module,
                    filename,
                    checksum,
                    applied_at,
                })
            })
            .collect()
    }

    fn insert_ledger_sync(&self, table: &str, record: &LedgerRecord) -> DbResult<()> {
        validate_table_name(table)?;
        let conn = self.conn.lock()?;
        conn.execute(
            &format!("INSERT INTO {} VALUES (?, ?, ?, ?)", quote(table)),
            params![
                record.module,
                record.filename,
                record.checksum,
                record.applied_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[async_trait]
impl DatabaseCore for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn execute_transaction(&self, statements: &[String]) -> DbResult<()> {
        self.execute_transaction_sync(statements)
    }

    async fn reset(&self) -> DbResult<()> {
        self.reset_sync()
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }

    fn identity(&self) -> String {
        self.identity.clone()
    }
}

#[async_trait]
impl DatabaseSchema for DuckDbBackend {
    async fn describe_table(&self, name: &str) -> DbResult<Option<String>> {
        self.describe_table_sync(name)
    }

    async fn table_names(&self) -> DbResult<Vec<String>> {
        self.table_names_sync()
    }
}

#[async_trait]
impl DatabaseLedger for DuckDbBackend {
    async fn ensure_ledger(&self, table: &str) -> DbResult<()> {
        validate_table_name(table)?;
        self.execute_batch_sync(&format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             module VARCHAR NOT NULL, \
             filename VARCHAR NOT NULL, \
             checksum VARCHAR NOT NULL, \
             applied_at VARCHAR NOT NULL, \
             PRIMARY KEY (module, filename))",
            quote(table)
        ))
    }

    async fn read_ledger(&self, table: &str) -> DbResult<Vec<LedgerRecord>> {
        self.read_ledger_sync(table)
    }

    async fn insert_ledger(&self, table: &str, record: &LedgerRecord) -> DbResult<()> {
        self.insert_ledger_sync(table, record)
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;

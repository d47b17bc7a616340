//! In-process catalog backend.
//!
//! Executes DDL by replaying it into a [`Schema`]; DML is checked against the
//! catalog (the target table must exist) but no rows are stored. Ledger
//! records live alongside the catalog. Everything lives as long as the
//! backend value, which makes it the target of choice for dry runs and tests.

use crate::error::{DbError, DbResult};
use crate::traits::{validate_table_name, DatabaseCore, DatabaseLedger, DatabaseSchema};
use async_trait::async_trait;
use mig_core::LedgerRecord;
use mig_sql::ast::{Statement, StatementNode};
use mig_sql::{Schema, SqlError, SqlParser};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Default, Clone)]
struct Catalog {
    schema: Schema,
    ledgers: BTreeMap<String, Vec<LedgerRecord>>,
}

/// Injected failures and an execution log
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
struct Faults {
    failing_statements: Vec<String>,
    failing_resets: u32,
    resets: u32,
    executed: Vec<String>,
}

/// Catalog-only database target
pub struct MemoryBackend {
    catalog: Mutex<Catalog>,
    parser: SqlParser,
    identity: String,
    #[cfg(any(test, feature = "test-support"))]
    faults: Mutex<Faults>,
}

impl MemoryBackend {
    /// Create an empty catalog named `name`
    pub fn new(name: &str) -> Self {
        Self {
            catalog: Mutex::new(Catalog::default()),
            parser: SqlParser::mysql(),
            identity: format!("memory:{}", name),
            #[cfg(any(test, feature = "test-support"))]
            faults: Mutex::new(Faults::default()),
        }
    }

    /// Copy of the current table definitions
    pub fn schema(&self) -> DbResult<Schema> {
        Ok(self.catalog.lock()?.schema.clone())
    }

    fn parse(&self, sql: &str) -> DbResult<Vec<StatementNode>> {
        self.parser
            .parse(sql)
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    /// Apply parsed statements to `catalog`, stopping at the first failure
    fn apply(&self, catalog: &mut Catalog, nodes: &[StatementNode]) -> DbResult<()> {
        for node in nodes {
            self.check_fault(&node.text)?;
            apply_statement(&mut catalog.schema, node)?;
            self.record(&node.text)?;
            log::debug!("{}: executed {}", self.identity, node.kind());
        }
        Ok(())
    }

    #[cfg(any(test, feature = "test-support"))]
    fn check_fault(&self, text: &str) -> DbResult<()> {
        let hit = self
            .faults
            .lock()?
            .failing_statements
            .iter()
            .find(|needle| text.contains(needle.as_str()))
            .cloned();
        match hit {
            Some(needle) => Err(DbError::ExecutionError(format!(
                "injected failure on '{}': {}",
                needle, text
            ))),
            None => Ok(()),
        }
    }

    #[cfg(any(test, feature = "test-support"))]
    fn record(&self, text: &str) -> DbResult<()> {
        self.faults.lock()?.executed.push(text.to_string());
        Ok(())
    }

    #[cfg(not(any(test, feature = "test-support")))]
    fn check_fault(&self, _text: &str) -> DbResult<()> {
        Ok(())
    }

    #[cfg(not(any(test, feature = "test-support")))]
    fn record(&self, _text: &str) -> DbResult<()> {
        Ok(())
    }

    #[cfg(any(test, feature = "test-support"))]
    fn check_reset_fault(&self) -> DbResult<()> {
        let mut faults = self.faults.lock()?;
        faults.resets += 1;
        if faults.failing_resets > 0 {
            faults.failing_resets -= 1;
            return Err(DbError::ConnectionError(format!(
                "{} is not accepting connections",
                self.identity
            )));
        }
        Ok(())
    }

    #[cfg(not(any(test, feature = "test-support")))]
    fn check_reset_fault(&self) -> DbResult<()> {
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
impl MemoryBackend {
    /// Make every statement whose text contains `needle` fail
    pub fn fail_statements_containing(&self, needle: &str) -> DbResult<()> {
        self.faults
            .lock()?
            .failing_statements
            .push(needle.to_string());
        Ok(())
    }

    /// Make the next `count` resets fail with a connection error
    pub fn fail_next_resets(&self, count: u32) -> DbResult<()> {
        self.faults.lock()?.failing_resets = count;
        Ok(())
    }

    /// Number of reset attempts so far, failed ones included
    pub fn reset_attempts(&self) -> DbResult<u32> {
        Ok(self.faults.lock()?.resets)
    }

    /// Text of every statement executed successfully, in order
    pub fn executed(&self) -> DbResult<Vec<String>> {
        Ok(self.faults.lock()?.executed.clone())
    }
}

fn apply_statement(schema: &mut Schema, node: &StatementNode) -> DbResult<()> {
    let missing = |table: &str| DbError::TableNotFound(table.to_string());
    match &node.statement {
        Statement::Insert(insert) if !schema.contains(&insert.table) => {
            Err(missing(&insert.table))
        }
        Statement::Update(update) if !schema.contains(&update.table) => {
            Err(missing(&update.table))
        }
        Statement::Delete { table } if !schema.contains(table) => Err(missing(table)),
        statement => schema.apply(statement).map_err(|e| match e {
            SqlError::UnknownTable(table) => missing(&table),
            other => DbError::ExecutionError(format!("{}: {}", other, node.text)),
        }),
    }
}

#[async_trait]
impl DatabaseCore for MemoryBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        let nodes = self.parse(sql)?;
        let mut catalog = self.catalog.lock()?;
        self.apply(&mut catalog, &nodes)?;
        Ok(0)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute(sql).await.map(|_| ())
    }

    async fn execute_transaction(&self, statements: &[String]) -> DbResult<()> {
        let mut nodes = Vec::new();
        for sql in statements {
            nodes.extend(self.parse(sql)?);
        }
        let mut catalog = self.catalog.lock()?;
        let mut working = catalog.clone();
        self.apply(&mut working, &nodes)?;
        *catalog = working;
        Ok(())
    }

    async fn reset(&self) -> DbResult<()> {
        self.check_reset_fault()?;
        *self.catalog.lock()? = Catalog::default();
        log::debug!("Reset in-memory target {}", self.identity);
        Ok(())
    }

    fn db_type(&self) -> &'static str {
        "memory"
    }

    fn identity(&self) -> String {
        self.identity.clone()
    }
}

#[async_trait]
impl DatabaseSchema for MemoryBackend {
    async fn describe_table(&self, name: &str) -> DbResult<Option<String>> {
        let catalog = self.catalog.lock()?;
        Ok(catalog.schema.table(name).map(|table| {
            let mut table = table.clone();
            table.if_not_exists = false;
            table.to_string()
        }))
    }

    async fn table_names(&self) -> DbResult<Vec<String>> {
        let catalog = self.catalog.lock()?;
        let mut names: Vec<String> = catalog
            .schema
            .tables()
            .map(|t| t.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl DatabaseLedger for MemoryBackend {
    async fn ensure_ledger(&self, table: &str) -> DbResult<()> {
        validate_table_name(table)?;
        self.catalog
            .lock()?
            .ledgers
            .entry(table.to_string())
            .or_default();
        Ok(())
    }

    async fn read_ledger(&self, table: &str) -> DbResult<Vec<LedgerRecord>> {
        validate_table_name(table)?;
        self.catalog
            .lock()?
            .ledgers
            .get(table)
            .cloned()
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))
    }

    async fn insert_ledger(&self, table: &str, record: &LedgerRecord) -> DbResult<()> {
        validate_table_name(table)?;
        let mut catalog = self.catalog.lock()?;
        let ledger = catalog
            .ledgers
            .get_mut(table)
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))?;
        if ledger.iter().any(|r| r.key() == record.key()) {
            return Err(DbError::ExecutionError(format!(
                "duplicate ledger record for {}/{}",
                record.module, record.filename
            )));
        }
        ledger.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;

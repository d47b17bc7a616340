//! A single migration script.

use crate::error::{MigrateError, MigrateResult};
use mig_core::{script_checksum, CoreError, LedgerRecord};
use mig_sql::ast::{AlterSpec, Statement, StatementKind, StatementNode};
use mig_sql::SqlParser;
use std::path::Path;

/// Leading comments that mark a baseline script
const BASELINE_MARKERS: [&str; 3] = ["-- MIGRATION_BASE", "# MIGRATION_BASE", "/* MIGRATION_BASE */"];

/// One migration file, parsed.
#[derive(Debug, Clone)]
pub struct Script {
    module: String,
    filename: String,
    content: String,
    statements: Vec<StatementNode>,
    checksum: String,
    baseline: bool,
    record: Option<LedgerRecord>,
}

/// Whether a block runs as DDL or inside a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Schema changes and session `SET`s, applied one statement at a time
    Ddl,
    /// Data statements, applied in one transaction
    Dml,
}

/// Consecutive statements of the same [`BlockKind`]
#[derive(Debug, Clone)]
pub struct Block<'a> {
    pub kind: BlockKind,
    pub statements: Vec<&'a StatementNode>,
}

impl Script {
    /// Read and parse `path` as a script of `module`
    pub fn load(module: &str, path: &Path) -> MigrateResult<Self> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_source(module, &filename, &content)
    }

    /// Parse in-memory script text
    ///
    /// Non-baseline scripts may only contain DDL, DML and session `SET`;
    /// transaction control belongs to the orchestrator.
    pub fn from_source(module: &str, filename: &str, content: &str) -> MigrateResult<Self> {
        let id = script_id(module, filename);
        let trimmed = content.trim_start();
        let baseline = BASELINE_MARKERS.iter().any(|m| trimmed.starts_with(m));

        let statements = SqlParser::mysql()
            .parse(content)
            .map_err(|source| MigrateError::Parse {
                script: id.clone(),
                source,
            })?;

        if !baseline {
            if let Some(node) = statements.iter().find(|n| !is_migration_statement(n.kind())) {
                return Err(MigrateError::UnsupportedStatement {
                    script: id,
                    line: node.line,
                    kind: node.kind().to_string(),
                });
            }
        }

        Ok(Self {
            module: module.to_string(),
            filename: filename.to_string(),
            checksum: script_checksum(content),
            content: content.to_string(),
            statements,
            baseline,
            record: None,
        })
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// `module/filename`
    pub fn id(&self) -> String {
        script_id(&self.module, &self.filename)
    }

    /// Filename without the `.sql` extension
    pub fn stem(&self) -> &str {
        self.filename
            .strip_suffix(".sql")
            .unwrap_or(&self.filename)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn statements(&self) -> &[StatementNode] {
        &self.statements
    }

    /// SHA-256 of the content without leading whitespace
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn is_baseline(&self) -> bool {
        self.baseline
    }

    /// Ledger record, once the script is known to be installed
    pub fn record(&self) -> Option<&LedgerRecord> {
        self.record.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.record.is_none()
    }

    pub(crate) fn attach(&mut self, record: Option<LedgerRecord>) {
        self.record = record;
    }

    /// Whether the script drops a database, table or column, or truncates a table
    pub fn has_destructive_operation(&self) -> bool {
        self.statements.iter().any(|n| match &n.statement {
            Statement::DropDatabase { .. } | Statement::DropTable(_) | Statement::Truncate(_) => {
                true
            }
            Statement::AlterTable(alter) => alter
                .specs
                .iter()
                .any(|s| matches!(s, AlterSpec::DropColumn(_))),
            _ => false,
        })
    }

    /// Names of tables created by `CREATE TABLE`, in order
    pub fn created_tables(&self) -> Vec<&str> {
        self.statements
            .iter()
            .filter_map(|n| match &n.statement {
                Statement::CreateTable(create) => Some(create.name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Group statements into runs of DDL and DML, preserving order
    pub fn blocks(&self) -> Vec<Block<'_>> {
        let mut blocks: Vec<Block<'_>> = Vec::new();
        for node in &self.statements {
            let kind = if node.kind().is_dml() {
                BlockKind::Dml
            } else {
                BlockKind::Ddl
            };
            match blocks.last_mut() {
                Some(block) if block.kind == kind => block.statements.push(node),
                _ => blocks.push(Block {
                    kind,
                    statements: vec![node],
                }),
            }
        }
        blocks
    }
}

/// `module/filename`
pub fn script_id(module: &str, filename: &str) -> String {
    format!("{}/{}", module, filename)
}

fn is_migration_statement(kind: StatementKind) -> bool {
    kind.is_ddl() || kind.is_dml() || kind == StatementKind::Set
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;

//! Migration orchestrator.
//!
//! A run moves through `Load → Lint → SandboxApply → Verify → ProductionApply
//! → RecordLedger`. Nothing touches the database before the script set passes
//! its structural checks, and nothing touches production before the sandbox
//! run (when configured) succeeded. In production, the reverse of every DDL
//! statement is computed from a live snapshot just before the statement runs;
//! on failure the reverses gathered so far come back as the rollback plan.

use crate::error::{ErrorKind, MigrateError, MigrateResult};
use crate::lock;
use crate::sandbox::{self, execution_error};
use crate::script::{script_id, BlockKind, Script};
use crate::script_set::ScriptSet;
use mig_core::ledger::DEFAULT_LEDGER_TABLE;
use mig_core::{Config, CoreError, LedgerRecord, RetryConfig, RuleConfig};
use mig_db::{Database, DatabaseCore, DatabaseLedger, DatabaseSchema, DbError};
use mig_lint::Linter;
use mig_sql::ast::{CreateTable, Statement, StatementNode};
use mig_sql::{
    reverse_against, reverse_statement, Difference, Reversal, Schema, SqlParser, SqlResult,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Run settings
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    pub ledger_table: String,
    pub skip_lint: bool,
    pub skip_sandbox: bool,
    /// Compare the sandbox structure against the expected schema
    pub verify: bool,
    /// Stop after the sandbox run and verification
    pub dry_run: bool,
    /// Target structure; when `None`, verification replays the pending DDL
    /// over a snapshot of production
    pub expected_schema: Option<Schema>,
    pub retry: RetryConfig,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            ledger_table: DEFAULT_LEDGER_TABLE.to_string(),
            skip_lint: false,
            skip_sandbox: false,
            verify: false,
            dry_run: false,
            expected_schema: None,
            retry: RetryConfig::default(),
        }
    }
}

impl MigrationOptions {
    /// Options from the project configuration; `project_dir` resolves the
    /// expected schema file
    pub fn from_config(config: &Config, project_dir: &Path) -> MigrateResult<Self> {
        let expected_schema = match config.expected_schema_absolute(project_dir) {
            Some(path) => Some(load_expected_schema(&path)?),
            None => None,
        };
        Ok(Self {
            ledger_table: config.ledger_table.clone(),
            skip_lint: config.skip_lint,
            skip_sandbox: config.skip_sandbox,
            verify: config.verify || expected_schema.is_some(),
            dry_run: false,
            expected_schema,
            retry: config
                .sandbox
                .as_ref()
                .map(|s| s.retry.clone())
                .unwrap_or_default(),
        })
    }
}

/// Replay a schema file into a fresh tracker
pub fn load_expected_schema(path: &Path) -> MigrateResult<Schema> {
    let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
        path: path.display().to_string(),
        source: e,
    })?;
    let schema_error = |source| MigrateError::ExpectedSchema {
        path: path.display().to_string(),
        source,
    };
    let nodes = SqlParser::mysql().parse(&content).map_err(schema_error)?;
    let mut schema = Schema::new();
    schema.apply_all(&nodes).map_err(schema_error)?;
    Ok(schema)
}

/// Stages of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Lint,
    SandboxApply,
    Verify,
    ProductionApply,
    RecordLedger,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Load => "load",
            Stage::Lint => "lint",
            Stage::SandboxApply => "sandbox apply",
            Stage::Verify => "verify",
            Stage::ProductionApply => "production apply",
            Stage::RecordLedger => "record ledger",
        })
    }
}

/// A statement whose reverse could not be computed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclinedReversal {
    pub statement: String,
    pub reason: String,
}

/// One script of a run and its reversal bookkeeping
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppliedScript {
    pub script: String,
    pub checksum: String,
    /// Reverse statements in execution order
    pub reversals: Vec<String>,
    pub declined: Vec<DeclinedReversal>,
}

impl AppliedScript {
    fn new(script: &Script) -> Self {
        Self {
            script: script.id(),
            checksum: script.checksum().to_string(),
            ..Default::default()
        }
    }

    fn record(&mut self, node: &StatementNode, inverse: Inverse) {
        match inverse {
            Inverse::Statement(sql) => self.reversals.push(sql),
            Inverse::Declined(reason) => {
                log::warn!(
                    "{} line {}: no reverse statement ({})",
                    self.script,
                    node.line,
                    reason
                );
                self.declined.push(DeclinedReversal {
                    statement: node.text.clone(),
                    reason,
                });
            }
            Inverse::Nothing => {}
        }
    }
}

/// Successful run
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    /// Scripts applied by this run (or that would be, on a dry run)
    pub applied: Vec<AppliedScript>,
    /// Installed scripts after the run
    pub installed: usize,
    /// Scripts still pending after the run
    pub pending: usize,
    /// Baseline scripts recorded as installed without running, because the
    /// existing database already matched them
    pub adopted: Vec<String>,
    pub dry_run: bool,
}

impl MigrationReport {
    /// Statements undoing this run's DDL, newest first
    pub fn rollback_plan(&self) -> Vec<String> {
        rollback_plan(&self.applied)
    }

    pub fn declined_count(&self) -> usize {
        self.applied.iter().map(|a| a.declined.len()).sum()
    }
}

/// Failed run
#[derive(Debug, Error)]
#[error("Migration failed during {stage}: {error}")]
pub struct MigrationFailure {
    pub stage: Stage,
    #[source]
    pub error: MigrateError,
    /// Scripts fully applied before the failure
    pub applied: Vec<AppliedScript>,
    /// Statements undoing what this run changed, newest first
    pub rollback: Vec<String>,
}

impl MigrationFailure {
    fn before_apply(stage: Stage) -> impl FnOnce(MigrateError) -> Self {
        move |error| Self {
            stage,
            error,
            applied: Vec::new(),
            rollback: Vec::new(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

/// Reverse of one statement, as far as it could be computed
enum Inverse {
    Statement(String),
    Declined(String),
    Nothing,
}

impl From<SqlResult<Reversal>> for Inverse {
    fn from(result: SqlResult<Reversal>) -> Self {
        match result {
            Ok(Reversal::Reversed(sql)) => Inverse::Statement(sql),
            Ok(Reversal::NotReversible(reason)) => Inverse::Declined(reason.to_string()),
            Ok(Reversal::NoReversal) => Inverse::Nothing,
            Err(e) => Inverse::Declined(e.to_string()),
        }
    }
}

fn describe_difference(difference: Difference, actual: &str) -> String {
    match difference {
        Difference::OnlyInLeft(t) => format!("table '{}' is missing from {}", t, actual),
        Difference::OnlyInRight(t) => format!("table '{}' is not expected", t),
        Difference::Table { table, detail } => format!("table '{}': {}", table, detail),
    }
}

fn rollback_plan(applied: &[AppliedScript]) -> Vec<String> {
    applied
        .iter()
        .rev()
        .flat_map(|a| a.reversals.iter().rev().cloned())
        .collect()
}

/// Drives a migration run against one production target
pub struct Migrator {
    scripts: ScriptSet,
    production: Arc<dyn Database>,
    sandbox: Option<Arc<dyn Database>>,
    rules: Vec<RuleConfig>,
    options: MigrationOptions,
    parser: SqlParser,
    /// Baselines matched against an existing database, not yet in the ledger
    adopted: Vec<LedgerRecord>,
}

impl Migrator {
    pub fn new(scripts: ScriptSet, production: Arc<dyn Database>) -> Self {
        Self {
            scripts,
            production,
            sandbox: None,
            rules: Vec::new(),
            options: MigrationOptions::default(),
            parser: SqlParser::mysql(),
            adopted: Vec::new(),
        }
    }

    pub fn with_sandbox(mut self, sandbox: Arc<dyn Database>) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    pub fn with_rules(mut self, rules: Vec<RuleConfig>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_options(mut self, options: MigrationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn scripts(&self) -> &ScriptSet {
        &self.scripts
    }

    pub fn options(&self) -> &MigrationOptions {
        &self.options
    }

    /// Resolve pending/installed status without changing anything; a missing
    /// ledger table means nothing is installed
    pub async fn refresh(&mut self) -> MigrateResult<()> {
        let records = match self.production.read_ledger(&self.options.ledger_table).await {
            Ok(records) => records,
            Err(DbError::TableNotFound(_)) => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        self.scripts.resolve_pending(&records);
        Ok(())
    }

    /// Run every stage; see the module documentation
    pub async fn run(&mut self) -> Result<MigrationReport, MigrationFailure> {
        let identity = self.production.identity();
        let _guard = lock::acquire(&identity).await;
        log::info!("Migrating {} ({} scripts)", identity, self.scripts.len());

        self.load()
            .await
            .map_err(MigrationFailure::before_apply(Stage::Load))?;

        let mut report = MigrationReport {
            installed: self.scripts.installed_count(),
            pending: self.scripts.pending().len(),
            adopted: self
                .adopted
                .iter()
                .map(|r| script_id(&r.module, &r.filename))
                .collect(),
            dry_run: self.options.dry_run,
            ..Default::default()
        };
        if report.pending == 0 {
            if !self.options.dry_run {
                self.record_adopted().await?;
            }
            log::info!("Nothing to migrate: all {} scripts installed", report.installed);
            return Ok(report);
        }

        if self.options.skip_lint {
            log::info!("Skipping lint");
        } else {
            self.lint()
                .map_err(MigrationFailure::before_apply(Stage::Lint))?;
        }

        match (&self.sandbox, self.options.skip_sandbox) {
            (Some(sandbox), false) => {
                let sandbox = Arc::clone(sandbox);
                self.sandbox_apply(sandbox.as_ref())
                    .await
                    .map_err(MigrationFailure::before_apply(Stage::SandboxApply))?;
                if self.options.verify {
                    self.verify(sandbox.as_ref())
                        .await
                        .map_err(MigrationFailure::before_apply(Stage::Verify))?;
                }
            }
            _ => {
                log::info!("Skipping sandbox");
                if self.options.verify {
                    log::warn!("Verification needs a sandbox run; skipped");
                }
            }
        }

        if self.options.dry_run {
            report.applied = self
                .preview()
                .await
                .map_err(MigrationFailure::before_apply(Stage::Verify))?;
            log::info!("Dry run: {} scripts would be applied", report.applied.len());
            return Ok(report);
        }

        self.apply_production(&mut report).await?;
        log::info!(
            "Applied {} scripts; {} reverse statements retained, {} declined",
            report.applied.len(),
            report.rollback_plan().len(),
            report.declined_count()
        );
        Ok(report)
    }

    async fn load(&mut self) -> MigrateResult<()> {
        log::info!("Stage: {}", Stage::Load);
        self.scripts.check_duplicate_filenames()?;
        self.scripts.check_illegal_alters()?;

        let ledger = &self.options.ledger_table;
        self.production.ensure_ledger(ledger).await?;
        let records = self.production.read_ledger(ledger).await?;
        self.scripts.resolve_pending(&records);
        self.scripts.check_drift()?;
        if records.is_empty() {
            self.adopt_baselines().await?;
        }

        if self.scripts.has_destructive_pending() {
            log::warn!("Pending scripts drop or truncate tables, databases or columns");
        }
        Ok(())
    }

    fn lint(&self) -> MigrateResult<()> {
        log::info!("Stage: {}", Stage::Lint);
        let mut linter = Linter::new(&self.rules)?;
        for script in self.scripts.pending() {
            if script.is_baseline() {
                continue;
            }
            linter.lint(script.module(), script.filename(), script.content())?;
        }
        if linter.is_clean() {
            Ok(())
        } else {
            Err(MigrateError::Lint {
                count: linter.violation_count(),
                report: linter.report(),
            })
        }
    }

    /// First run against a database that already has tables: each module's
    /// pending baselines are compared with the live structure and, when they
    /// match, marked installed instead of executed
    async fn adopt_baselines(&mut self) -> MigrateResult<()> {
        let live = sandbox::fetch_schema(self.production.as_ref(), &self.options.ledger_table).await?;
        if live.is_empty() {
            return Ok(());
        }
        let mut baselines: BTreeMap<String, Vec<Script>> = BTreeMap::new();
        for script in self.scripts.pending() {
            if script.is_baseline() {
                baselines
                    .entry(script.module().to_string())
                    .or_default()
                    .push(script.clone());
            }
        }

        for (module, scripts) in &baselines {
            let mut expected = Schema::new();
            for script in scripts {
                expected
                    .apply_all(script.statements())
                    .map_err(|source| MigrateError::Parse {
                        script: script.id(),
                        source,
                    })?;
            }
            // Tables the baseline does not mention belong to other modules
            let differences: Vec<String> = expected
                .diff(&live)
                .into_iter()
                .filter(|d| !matches!(d, Difference::OnlyInRight(_)))
                .map(|d| describe_difference(d, "the existing database"))
                .collect();
            if !differences.is_empty() {
                return Err(MigrateError::BaselineMismatch {
                    module: module.clone(),
                    differences,
                });
            }
            for script in scripts {
                log::info!("Existing database matches baseline {}", script.id());
                let record =
                    LedgerRecord::now(script.module(), script.filename(), script.checksum());
                self.scripts.mark_installed(record.clone());
                self.adopted.push(record);
            }
        }
        Ok(())
    }

    async fn record_adopted(&mut self) -> Result<(), MigrationFailure> {
        for record in std::mem::take(&mut self.adopted) {
            if let Err(e) = self
                .production
                .insert_ledger(&self.options.ledger_table, &record)
                .await
            {
                return Err(MigrationFailure::before_apply(Stage::RecordLedger)(e.into()));
            }
        }
        Ok(())
    }

    async fn sandbox_apply(&self, sandbox: &dyn Database) -> MigrateResult<()> {
        log::info!("Stage: {} on {}", Stage::SandboxApply, sandbox.identity());
        sandbox::provision(sandbox, &self.options.retry).await?;
        sandbox::copy_structure(
            self.production.as_ref(),
            sandbox,
            &self.options.ledger_table,
        )
        .await?;
        for script in self.scripts.pending() {
            log::debug!("Sandbox: applying {}", script.id());
            sandbox::apply_script(sandbox, script).await?;
        }
        Ok(())
    }

    /// Production snapshot with every pending script replayed over it
    async fn expected_schema(&self) -> MigrateResult<Schema> {
        let mut schema =
            sandbox::fetch_schema(self.production.as_ref(), &self.options.ledger_table).await?;
        for script in self.scripts.pending() {
            schema
                .apply_all(script.statements())
                .map_err(|source| MigrateError::Parse {
                    script: script.id(),
                    source,
                })?;
        }
        Ok(schema)
    }

    async fn verify(&self, sandbox: &dyn Database) -> MigrateResult<()> {
        log::info!("Stage: {}", Stage::Verify);
        let actual = sandbox::fetch_schema(sandbox, &self.options.ledger_table).await?;
        let expected = match &self.options.expected_schema {
            Some(schema) => schema.clone(),
            None => self.expected_schema().await?,
        };
        if expected.structurally_eq(&actual) {
            return Ok(());
        }
        let differences = expected
            .diff(&actual)
            .into_iter()
            .map(|d| describe_difference(d, "the sandbox"))
            .collect();
        Err(MigrateError::Verify { differences })
    }

    /// Reverse statements the pending scripts would get, computed offline
    async fn preview(&self) -> MigrateResult<Vec<AppliedScript>> {
        let mut schema =
            sandbox::fetch_schema(self.production.as_ref(), &self.options.ledger_table).await?;
        let mut out = Vec::new();
        for script in self.scripts.pending() {
            let mut applied = AppliedScript::new(script);
            for node in script.statements() {
                applied.record(node, reverse_against(&schema, &node.statement).into());
                if let Err(e) = schema.apply(&node.statement) {
                    log::debug!("{}: preview replay stopped at a statement: {}", script.id(), e);
                }
            }
            out.push(applied);
        }
        Ok(out)
    }

    async fn apply_production(
        &mut self,
        report: &mut MigrationReport,
    ) -> Result<(), MigrationFailure> {
        log::info!("Stage: {}", Stage::ProductionApply);
        self.record_adopted().await?;
        let pending: Vec<Script> = self.scripts.pending().into_iter().cloned().collect();

        for script in &pending {
            let mut applied = AppliedScript::new(script);
            if let Err(error) = self.apply_script(script, &mut applied).await {
                // DDL already executed by the failed script is undone first
                let mut rollback: Vec<String> = applied.reversals.iter().rev().cloned().collect();
                rollback.extend(rollback_plan(&report.applied));
                return Err(MigrationFailure {
                    stage: Stage::ProductionApply,
                    error,
                    applied: std::mem::take(&mut report.applied),
                    rollback,
                });
            }

            let record = LedgerRecord::now(script.module(), script.filename(), script.checksum());
            if let Err(e) = self
                .production
                .insert_ledger(&self.options.ledger_table, &record)
                .await
            {
                report.applied.push(applied);
                return Err(MigrationFailure {
                    stage: Stage::RecordLedger,
                    error: e.into(),
                    rollback: rollback_plan(&report.applied),
                    applied: std::mem::take(&mut report.applied),
                });
            }
            log::info!("Applied {}", script.id());
            self.scripts.mark_installed(record);
            report.installed += 1;
            report.pending -= 1;
            report.applied.push(applied);
        }
        Ok(())
    }

    async fn apply_script(&self, script: &Script, applied: &mut AppliedScript) -> MigrateResult<()> {
        let db = self.production.as_ref();
        for block in script.blocks() {
            match block.kind {
                BlockKind::Ddl => {
                    for node in block.statements {
                        let inverse = self.inverse(node).await?;
                        log::debug!(
                            "{}: executing {} at line {}",
                            script.id(),
                            node.kind(),
                            node.line
                        );
                        db.execute(&node.text)
                            .await
                            .map_err(|e| execution_error(script, &node.text, e))?;
                        applied.record(node, inverse);
                    }
                }
                BlockKind::Dml => {
                    let statements: Vec<String> =
                        block.statements.iter().map(|n| n.text.clone()).collect();
                    log::debug!(
                        "{}: executing {} DML statements in one transaction",
                        script.id(),
                        statements.len()
                    );
                    db.execute_transaction(&statements)
                        .await
                        .map_err(|e| execution_error(script, &statements.join(";\n"), e))?;
                }
            }
        }
        Ok(())
    }

    /// Reverse of `node` against the live definition of its table
    async fn inverse(&self, node: &StatementNode) -> MigrateResult<Inverse> {
        let snapshot = match &node.statement {
            Statement::AlterTable(_) | Statement::DropIndex(_) => {
                match node.statement.target_table() {
                    Some(table) => self.snapshot(table).await?,
                    None => None,
                }
            }
            _ => None,
        };
        Ok(reverse_statement(snapshot.as_ref(), &node.statement).into())
    }

    /// Current definition of `table` in production
    async fn snapshot(&self, table: &str) -> MigrateResult<Option<CreateTable>> {
        let Some(sql) = self.production.describe_table(table).await? else {
            return Ok(None);
        };
        match self.parser.parse_create_table(&sql) {
            Ok(definition) => Ok(Some(definition)),
            Err(e) => {
                log::warn!("Cannot read the definition of '{}' for reversal: {}", table, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;

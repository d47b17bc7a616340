//! Disposable sandbox handling and live structure introspection.

use crate::error::{MigrateError, MigrateResult};
use crate::script::{BlockKind, Script};
use mig_core::RetryConfig;
use mig_db::{Database, DatabaseCore, DatabaseSchema};
use mig_sql::{Schema, SqlParser};

/// Reset the sandbox, retrying connection failures with exponential backoff
pub async fn provision(sandbox: &dyn Database, retry: &RetryConfig) -> MigrateResult<()> {
    let mut attempt = 1;
    loop {
        match sandbox.reset().await {
            Ok(()) => {
                if attempt > 1 {
                    log::info!("Sandbox {} ready after {} attempts", sandbox.identity(), attempt);
                }
                return Ok(());
            }
            Err(e) if e.is_retryable() && attempt < retry.attempts => {
                let delay = retry.delay_after(attempt);
                log::warn!(
                    "Sandbox {} not ready (attempt {}/{}): {}; retrying in {:?}",
                    sandbox.identity(),
                    attempt,
                    retry.attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(source) => {
                return Err(MigrateError::Sandbox {
                    attempts: attempt,
                    source,
                })
            }
        }
    }
}

/// Structure of every table in `db` except `exclude`, read back through
/// `describe_table`
pub async fn fetch_schema(db: &dyn Database, exclude: &str) -> MigrateResult<Schema> {
    let parser = SqlParser::mysql();
    let mut tables = Vec::new();
    for name in db.table_names().await? {
        if name.eq_ignore_ascii_case(exclude) {
            continue;
        }
        let Some(sql) = db.describe_table(&name).await? else {
            continue;
        };
        let table = parser
            .parse_create_table(&sql)
            .map_err(|source| MigrateError::Snapshot {
                table: name.clone(),
                source,
            })?;
        tables.push(table);
    }
    Ok(Schema::from_tables(tables))
}

/// Recreate the tables of `source` (except `exclude`) in `target`
pub async fn copy_structure(
    source: &dyn Database,
    target: &dyn Database,
    exclude: &str,
) -> MigrateResult<usize> {
    let mut copied = 0;
    for name in source.table_names().await? {
        if name.eq_ignore_ascii_case(exclude) {
            continue;
        }
        if let Some(sql) = source.describe_table(&name).await? {
            target
                .execute(&sql)
                .await
                .map_err(|e| MigrateError::Execution {
                    script: format!("<structure of {}>", name),
                    statement: sql.clone(),
                    source: e,
                })?;
            copied += 1;
        }
    }
    log::debug!(
        "Copied {} tables from {} to {}",
        copied,
        source.identity(),
        target.identity()
    );
    Ok(copied)
}

/// Apply a script block by block without reversal bookkeeping
pub async fn apply_script(db: &dyn Database, script: &Script) -> MigrateResult<()> {
    for block in script.blocks() {
        match block.kind {
            BlockKind::Ddl => {
                for node in block.statements {
                    db.execute(&node.text)
                        .await
                        .map_err(|e| execution_error(script, &node.text, e))?;
                }
            }
            BlockKind::Dml => {
                let statements: Vec<String> =
                    block.statements.iter().map(|n| n.text.clone()).collect();
                db.execute_transaction(&statements)
                    .await
                    .map_err(|e| execution_error(script, &statements.join(";\n"), e))?;
            }
        }
    }
    Ok(())
}

pub(crate) fn execution_error(
    script: &Script,
    statement: &str,
    source: mig_db::DbError,
) -> MigrateError {
    MigrateError::Execution {
        script: script.id(),
        statement: statement.to_string(),
        source,
    }
}

#[cfg(test)]
#[path = "sandbox_test.rs"]
mod tests;

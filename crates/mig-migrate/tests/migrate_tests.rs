//! End-to-end migration runs over script trees on disk.

use mig_db::{
    Database, DatabaseCore, DatabaseLedger, DatabaseSchema, DuckDbBackend, MemoryBackend,
};
use mig_migrate::{ErrorKind, MigrationOptions, Migrator, ScriptSet, Stage};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const LEDGER: &str = "schema_migration_history";

fn write_tree(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, sql) in files {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, sql).unwrap();
    }
    dir
}

fn load(root: &Path) -> ScriptSet {
    ScriptSet::load(root, None).unwrap()
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let tree = write_tree(&[
        ("m/0001_init.sql", "CREATE TABLE t (id BIGINT PRIMARY KEY);\n"),
        ("m/0002_add.sql", "ALTER TABLE t ADD COLUMN name VARCHAR(50);\n"),
    ]);
    let production = Arc::new(MemoryBackend::new("scenario-idempotent"));

    let first = Migrator::new(load(tree.path()), production.clone())
        .run()
        .await
        .unwrap();
    assert_eq!(first.applied.len(), 2);
    let executed = production.executed().unwrap();
    assert_eq!(executed.len(), 2);

    let mut again = Migrator::new(load(tree.path()), production.clone());
    let second = again.run().await.unwrap();
    assert!(second.applied.is_empty());
    assert_eq!(second.installed, 2);
    assert_eq!(second.pending, 0);
    assert_eq!(production.executed().unwrap(), executed);
    assert_eq!(production.read_ledger(LEDGER).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_drop_table_has_no_reverse() {
    let tree = write_tree(&[
        ("m/0001_init.sql", "CREATE TABLE t (id BIGINT PRIMARY KEY);"),
        ("m/0002_drop.sql", "DROP TABLE t;"),
    ]);
    let production = Arc::new(MemoryBackend::new("scenario-drop"));
    let mut migrator = Migrator::new(load(tree.path()), production.clone());

    migrator.refresh().await.unwrap();
    assert!(migrator.scripts().has_destructive_pending());

    let report = migrator.run().await.unwrap();
    let drop = &report.applied[1];
    assert!(drop.reversals.is_empty());
    assert_eq!(drop.declined.len(), 1);
    assert_eq!(report.rollback_plan(), vec!["DROP TABLE IF EXISTS `t`"]);
    assert!(!production.schema().unwrap().contains("t"));
}

#[tokio::test]
async fn test_duplicate_filename_fails_before_database_access() {
    let tree = write_tree(&[
        ("users/0001_init.sql", "CREATE TABLE users (id INT);"),
        ("orders/0001_init.sql", "CREATE TABLE orders (id INT);"),
    ]);
    let production = Arc::new(MemoryBackend::new("scenario-duplicate"));
    let mut migrator = Migrator::new(load(tree.path()), production.clone());

    let failure = migrator.run().await.unwrap_err();
    assert_eq!(failure.stage, Stage::Load);
    assert_eq!(failure.kind(), ErrorKind::StructuralViolation);
    assert!(production.read_ledger(LEDGER).await.is_err());
    assert!(production.executed().unwrap().is_empty());
}

#[tokio::test]
async fn test_rollback_plan_restores_structure() {
    let tree = write_tree(&[
        (
            "app/0001_init.sql",
            "CREATE TABLE users (id BIGINT NOT NULL, email VARCHAR(255), PRIMARY KEY (id));",
        ),
        (
            "app/0002_change.sql",
            "ALTER TABLE users ADD COLUMN nickname VARCHAR(40), ADD INDEX idx_email (email);\n\
             ALTER TABLE users MODIFY email VARCHAR(320);\n\
             RENAME TABLE users TO members;",
        ),
    ]);
    let production = Arc::new(MemoryBackend::new("scenario-rollback"));

    let set = load(tree.path());
    let first = ScriptSet::from_scripts(vec![set.module("app")[0].clone()]);
    Migrator::new(first, production.clone()).run().await.unwrap();
    let before = production.schema().unwrap();

    let report = Migrator::new(set, production.clone()).run().await.unwrap();
    assert_eq!(report.applied.len(), 1);
    assert!(production.schema().unwrap().contains("members"));

    for statement in report.rollback_plan() {
        production.execute(&statement).await.unwrap();
    }
    assert!(production.schema().unwrap().structurally_eq(&before));
}

#[tokio::test]
async fn test_offline_reversal_plan() {
    let tree = write_tree(&[
        ("app/0000_base.sql", "-- MIGRATION_BASE\nCREATE TABLE legacy (id INT);"),
        ("app/0001_init.sql", "CREATE TABLE t (id INT, note TEXT);"),
        ("app/0002_alter.sql", "ALTER TABLE t DROP COLUMN note, ADD COLUMN flag TINYINT;"),
    ]);
    let set = load(tree.path());

    assert_eq!(set.baseline_reversal(), vec!["DROP TABLE IF EXISTS `legacy`"]);
    let plan = set.reversal_plan("app/0001_init.sql").unwrap();
    assert_eq!(plan.statements(), vec!["DROP TABLE IF EXISTS `t`"]);

    // A declined spec declines the whole statement
    let plan = set.reversal_plan("app/0002_alter.sql").unwrap();
    assert!(plan.statements().is_empty());
}

#[tokio::test]
async fn test_duckdb_target() {
    let tree = write_tree(&[
        ("app/0001_init.sql", "CREATE TABLE items (id INTEGER, label VARCHAR);"),
        ("app/0002_seed.sql", "INSERT INTO items (id, label) VALUES (1, 'a'), (2, 'b');"),
    ]);
    let production: Arc<dyn Database> = Arc::new(DuckDbBackend::in_memory().unwrap());
    let mut migrator = Migrator::new(load(tree.path()), Arc::clone(&production)).with_options(
        MigrationOptions {
            skip_sandbox: true,
            ..Default::default()
        },
    );

    let report = migrator.run().await.unwrap();
    assert_eq!(report.applied.len(), 2);
    let ledger = production.read_ledger(LEDGER).await.unwrap();
    assert_eq!(ledger.len(), 2);
    assert!(ledger.iter().any(|r| r.filename == "0002_seed.sql"));
}

#[tokio::test]
async fn test_duckdb_sandbox_verifies_defaults() {
    let tree = write_tree(&[
        ("app/0001_init.sql", "CREATE TABLE items (id INTEGER, label VARCHAR);"),
        (
            "app/0002_default.sql",
            "ALTER TABLE items ALTER COLUMN label SET DEFAULT 'x';",
        ),
    ]);
    let production: Arc<dyn Database> = Arc::new(DuckDbBackend::in_memory().unwrap());
    let sandbox: Arc<dyn Database> = Arc::new(DuckDbBackend::in_memory().unwrap());
    let mut migrator = Migrator::new(load(tree.path()), Arc::clone(&production))
        .with_sandbox(sandbox)
        .with_options(MigrationOptions {
            verify: true,
            ..Default::default()
        });

    let report = migrator.run().await.unwrap();
    assert_eq!(report.applied.len(), 2);
    let described = production.describe_table("items").await.unwrap().unwrap();
    assert!(described.contains("DEFAULT"), "{described}");
}

#[tokio::test]
async fn test_existing_database_adopts_matching_baseline() {
    let tree = write_tree(&[
        ("app/0000_base.sql", "-- MIGRATION_BASE\nCREATE TABLE legacy (id INT);"),
        ("app/0001_name.sql", "ALTER TABLE legacy ADD COLUMN name VARCHAR(20);"),
    ]);
    let production = Arc::new(MemoryBackend::new("scenario-adopt"));
    production.execute("CREATE TABLE legacy (id INT)").await.unwrap();
    production.execute("CREATE TABLE unrelated (id INT)").await.unwrap();

    let report = Migrator::new(load(tree.path()), production.clone())
        .run()
        .await
        .unwrap();
    assert_eq!(report.adopted, vec!["app/0000_base.sql"]);
    let applied: Vec<_> = report.applied.iter().map(|a| a.script.as_str()).collect();
    assert_eq!(applied, vec!["app/0001_name.sql"]);
    assert_eq!(report.installed, 2);

    let executed = production.executed().unwrap();
    assert_eq!(executed.len(), 3);
    assert!(executed[2].starts_with("ALTER TABLE legacy"));
    let ledger = production.read_ledger(LEDGER).await.unwrap();
    assert_eq!(ledger.len(), 2);
    assert!(ledger.iter().any(|r| r.filename == "0000_base.sql"));
}

#[tokio::test]
async fn test_existing_database_with_only_baseline_pending() {
    let tree = write_tree(&[("app/0000_base.sql", "-- MIGRATION_BASE\nCREATE TABLE legacy (id INT);")]);
    let production = Arc::new(MemoryBackend::new("scenario-adopt-only"));
    production.execute("CREATE TABLE legacy (id INT)").await.unwrap();

    let dry = Migrator::new(load(tree.path()), production.clone())
        .with_options(MigrationOptions {
            dry_run: true,
            ..Default::default()
        })
        .run()
        .await
        .unwrap();
    assert_eq!(dry.adopted, vec!["app/0000_base.sql"]);
    assert!(production.read_ledger(LEDGER).await.unwrap().is_empty());

    let report = Migrator::new(load(tree.path()), production.clone())
        .run()
        .await
        .unwrap();
    assert!(report.applied.is_empty());
    assert_eq!(report.installed, 1);
    assert_eq!(production.read_ledger(LEDGER).await.unwrap().len(), 1);
    assert_eq!(production.executed().unwrap().len(), 1);
}

#[tokio::test]
async fn test_existing_database_rejects_different_baseline() {
    let tree = write_tree(&[(
        "app/0000_base.sql",
        "-- MIGRATION_BASE\nCREATE TABLE legacy (id INT, name VARCHAR(20));",
    )]);
    let production = Arc::new(MemoryBackend::new("scenario-adopt-mismatch"));
    production.execute("CREATE TABLE legacy (id INT)").await.unwrap();

    let failure = Migrator::new(load(tree.path()), production.clone())
        .run()
        .await
        .unwrap_err();
    assert_eq!(failure.stage, Stage::Load);
    assert_eq!(failure.kind(), ErrorKind::StructuralViolation);
    assert!(failure.error.to_string().contains("[M017]"));
    assert!(production.read_ledger(LEDGER).await.unwrap().is_empty());
    assert_eq!(production.executed().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_and_reverse_twice_leaves_no_table() {
    let tree = write_tree(&[("app/0001_init.sql", "CREATE TABLE t (id INT, KEY idx_id (id));")]);
    let set = load(tree.path());
    let script = set.get("app/0001_init.sql").unwrap();
    let plan = set.reversal_plan("app/0001_init.sql").unwrap();
    assert_eq!(plan.statements(), vec!["DROP TABLE IF EXISTS `t`"]);

    let production = Arc::new(MemoryBackend::new("scenario-round-trip"));
    for _ in 0..2 {
        for node in script.statements() {
            production.execute(&node.text).await.unwrap();
        }
        assert!(production.schema().unwrap().contains("t"));
        for statement in plan.statements() {
            production.execute(statement).await.unwrap();
        }
        assert!(!production.schema().unwrap().contains("t"));
    }
    assert!(production.table_names().await.unwrap().is_empty());
}

//! CLI integration tests running the `mig` binary against temporary projects

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Path to the compiled mig binary (resolved at compile time)
fn mig_bin() -> String {
    env!("CARGO_BIN_EXE_mig").to_string()
}

fn project(config: &str, files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("migrator.yml"), config).unwrap();
    for (path, sql) in files {
        let path = dir.path().join("migrations").join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, sql).unwrap();
    }
    dir
}

fn mig(dir: &Path, args: &[&str]) -> Output {
    Command::new(mig_bin())
        .arg("--project-dir")
        .arg(dir)
        .args(args)
        .output()
        .expect("Failed to run mig")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn describe(output: &Output) -> String {
    format!(
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

const DUCKDB_CONFIG: &str = "name: shop\ndatabase:\n  type: duckdb\n  path: shop.duckdb\n";

#[test]
fn test_migrate_then_status() {
    let dir = project(
        DUCKDB_CONFIG,
        &[
            ("m/0001_init.sql", "CREATE TABLE t (id BIGINT PRIMARY KEY);\n"),
            ("m/0002_add.sql", "ALTER TABLE t ADD COLUMN name VARCHAR(50);\n"),
        ],
    );

    let first = mig(dir.path(), &["migrate"]);
    assert!(first.status.success(), "{}", describe(&first));
    assert!(stdout(&first).contains("Applied 2 scripts"), "{}", describe(&first));

    let second = mig(dir.path(), &["migrate"]);
    assert!(second.status.success(), "{}", describe(&second));
    assert!(stdout(&second).contains("Nothing to migrate"), "{}", describe(&second));

    let status = mig(dir.path(), &["status", "--output", "json"]);
    assert!(status.status.success(), "{}", describe(&status));
    let entries: serde_json::Value = serde_json::from_slice(&status.stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e["status"] == "installed"));
}

#[test]
fn test_dry_run_leaves_scripts_pending() {
    let dir = project(
        "name: shop\ndatabase:\n  type: memory\n  path: target\nsandbox:\n  type: memory\n  path: sandbox\n",
        &[("m/0001_init.sql", "CREATE TABLE t (id BIGINT PRIMARY KEY);\n")],
    );

    let output = mig(dir.path(), &["migrate", "--dry-run", "-o", "json"]);
    assert!(output.status.success(), "{}", describe(&output));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["dry_run"], true);
    assert_eq!(report["pending"], 1);
    assert_eq!(report["applied"][0]["reversals"][0], "DROP TABLE IF EXISTS `t`");
}

#[test]
fn test_lint_failure_exit_code() {
    let config = "name: shop\ndatabase:\n  type: memory\n  path: target\nlint:\n  - name: destruct\n";
    let dir = project(
        config,
        &[
            ("m/0000_base.sql", "-- MIGRATION_BASE\nDROP TABLE IF EXISTS old;\nCREATE TABLE t (id INT);\n"),
            ("m/0001_drop.sql", "DROP TABLE t;\n"),
        ],
    );

    let output = mig(dir.path(), &["lint"]);
    assert_eq!(output.status.code(), Some(1), "{}", describe(&output));
    let text = stdout(&output);
    assert!(text.contains("m/0001_drop.sql (1 violations)"), "{}", text);
    assert!(!text.contains("0000_base.sql"), "{}", text);

    let migrate = mig(dir.path(), &["migrate"]);
    assert_eq!(migrate.status.code(), Some(1), "{}", describe(&migrate));
    assert!(String::from_utf8_lossy(&migrate.stderr).contains("lint"));
}

#[test]
fn test_lint_named_paths() {
    let dir = project(
        "name: shop\nlint:\n  - name: complete_insert\n",
        &[("users/0001_seed.sql", "INSERT INTO users VALUES (1);\n")],
    );
    let script = dir.path().join("migrations/users/0001_seed.sql");

    let output = mig(dir.path(), &["lint", script.to_str().unwrap(), "-o", "json"]);
    assert_eq!(output.status.code(), Some(1), "{}", describe(&output));
    let violations: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(violations[0]["script"], "users/0001_seed.sql");
    assert_eq!(violations[0]["rule"], "complete_insert");
}

#[test]
fn test_reverse_script() {
    let dir = project(
        DUCKDB_CONFIG,
        &[
            ("m/0001_init.sql", "CREATE TABLE t (id BIGINT PRIMARY KEY, legacy INT);\n"),
            (
                "m/0002_change.sql",
                "ALTER TABLE t ADD COLUMN name VARCHAR(50);\nALTER TABLE t DROP COLUMN legacy;\n",
            ),
        ],
    );

    let output = mig(dir.path(), &["reverse", "m/0002_change.sql"]);
    assert!(output.status.success(), "{}", describe(&output));
    let text = stdout(&output);
    assert!(text.contains("-- not reversible (DROP COLUMN destroys data)"), "{}", text);
    assert!(text.contains("ALTER TABLE `t` DROP COLUMN `name`;"), "{}", text);

    let missing = mig(dir.path(), &["reverse", "m/0003_missing.sql"]);
    assert!(!missing.status.success());
}

#[test]
fn test_rules_lists_builtins() {
    let output = Command::new(mig_bin())
        .arg("rules")
        .output()
        .expect("Failed to run mig rules");
    assert!(output.status.success(), "{}", describe(&output));
    let text = stdout(&output);
    for name in ["required_column", "destruct", "index_length"] {
        assert!(text.contains(name), "{} missing from:\n{}", name, text);
    }
}

#[test]
fn test_missing_config() {
    let dir = tempfile::tempdir().unwrap();
    let output = mig(dir.path(), &["status"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load project configuration"));
}

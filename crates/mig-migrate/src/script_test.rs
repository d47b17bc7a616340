use super::*;

#[test]
fn test_from_source() {
    let script = Script::from_source(
        "users",
        "20240101_init.sql",
        "\n\nCREATE TABLE users (id BIGINT PRIMARY KEY);\nINSERT INTO users (id) VALUES (1);\n",
    )
    .unwrap();

    assert_eq!(script.id(), "users/20240101_init.sql");
    assert_eq!(script.stem(), "20240101_init");
    assert_eq!(script.statements().len(), 2);
    assert_eq!(script.statements()[0].line, 3);
    assert!(!script.is_baseline());
    assert!(script.is_pending());
    assert_eq!(script.created_tables(), vec!["users"]);
}

#[test]
fn test_checksum_ignores_leading_whitespace() {
    let a = Script::from_source("m", "a.sql", "CREATE TABLE t (id INT);").unwrap();
    let b = Script::from_source("m", "a.sql", "\n   CREATE TABLE t (id INT);").unwrap();
    let c = Script::from_source("m", "a.sql", "CREATE TABLE t (id BIGINT);").unwrap();
    assert_eq!(a.checksum(), b.checksum());
    assert_ne!(a.checksum(), c.checksum());
}

#[test]
fn test_baseline_markers() {
    for marker in ["-- MIGRATION_BASE", "# MIGRATION_BASE", "/* MIGRATION_BASE */"] {
        let content = format!("\n{}\nCREATE TABLE t (id INT);", marker);
        let script = Script::from_source("m", "base.sql", &content).unwrap();
        assert!(script.is_baseline(), "{marker}");
    }
    let later = Script::from_source("m", "x.sql", "CREATE TABLE t (id INT);\n-- MIGRATION_BASE").unwrap();
    assert!(!later.is_baseline());
}

#[test]
fn test_transaction_control_rejected() {
    let err = Script::from_source(
        "m",
        "0002.sql",
        "CREATE TABLE t (id INT);\nBEGIN;\nINSERT INTO t (id) VALUES (1);\nCOMMIT;",
    )
    .unwrap_err();
    match err {
        MigrateError::UnsupportedStatement { script, line, kind } => {
            assert_eq!(script, "m/0002.sql");
            assert_eq!(line, 2);
            assert_eq!(kind, "transaction");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_baseline_may_contain_anything() {
    let script = Script::from_source("m", "base.sql", "-- MIGRATION_BASE\nBEGIN;\nCREATE TABLE t (id INT);\nCOMMIT;")
        .unwrap();
    assert_eq!(script.statements().len(), 3);
}

#[test]
fn test_session_set_allowed() {
    let script = Script::from_source("m", "a.sql", "SET NAMES utf8mb4;\nCREATE TABLE t (id INT);").unwrap();
    assert_eq!(script.statements().len(), 2);
}

#[test]
fn test_parse_error() {
    let err = Script::from_source("m", "bad.sql", "CREATE TABLE (;").unwrap_err();
    assert!(matches!(err, MigrateError::Parse { ref script, .. } if script == "m/bad.sql"));
    assert_eq!(err.kind(), crate::ErrorKind::ParseError);
}

#[test]
fn test_destructive_operations() {
    let destructive = [
        "DROP TABLE t;",
        "DROP DATABASE d;",
        "TRUNCATE TABLE t;",
        "ALTER TABLE t ADD COLUMN a INT, DROP COLUMN b;",
    ];
    for sql in destructive {
        let script = Script::from_source("m", "a.sql", sql).unwrap();
        assert!(script.has_destructive_operation(), "{sql}");
    }
    let safe = Script::from_source("m", "a.sql", "ALTER TABLE t ADD COLUMN a INT; DROP INDEX i ON t;").unwrap();
    assert!(!safe.has_destructive_operation());
}

#[test]
fn test_blocks() {
    let script = Script::from_source(
        "m",
        "a.sql",
        "CREATE TABLE t (id INT);\n\
         SET @x = 1;\n\
         INSERT INTO t (id) VALUES (1);\n\
         UPDATE t SET id = 2;\n\
         ALTER TABLE t ADD COLUMN c INT;\n\
         DELETE FROM t;",
    )
    .unwrap();

    let kinds: Vec<(BlockKind, usize)> = script
        .blocks()
        .iter()
        .map(|b| (b.kind, b.statements.len()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (BlockKind::Ddl, 2),
            (BlockKind::Dml, 2),
            (BlockKind::Ddl, 1),
            (BlockKind::Dml, 1),
        ]
    );
}

#[test]
fn test_load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0001_init.sql");
    std::fs::write(&path, "CREATE TABLE t (id INT);").unwrap();

    let script = Script::load("m", &path).unwrap();
    assert_eq!(script.filename(), "0001_init.sql");
    assert_eq!(script.module(), "m");

    let missing = Script::load("m", &dir.path().join("nope.sql")).unwrap_err();
    assert_eq!(missing.kind(), crate::ErrorKind::Io);
}

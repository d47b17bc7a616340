use crate::error::LintError;
use crate::test_utils::{build_error, messages};

#[test]
fn test_default_set() {
    let rule = "name: allowed_statements";
    assert!(messages(rule, "CREATE TABLE t (id INT); ALTER TABLE t ADD COLUMN x INT;").is_empty());
    assert!(messages(rule, "INSERT INTO t (id) VALUES (1); SET NAMES utf8mb4;").is_empty());
    assert_eq!(
        messages(rule, "DROP TABLE t;"),
        vec!["statement kind 'drop_table' is not allowed"]
    );
    assert_eq!(
        messages(rule, "ALTER TABLE t DROP COLUMN x;"),
        vec!["ALTER TABLE specification 'drop_column' is not allowed"]
    );
    assert_eq!(messages(rule, "DELETE FROM t;").len(), 1);
}

#[test]
fn test_explicit_allow() {
    let rule = "name: allowed_statements\nmeta:\n  statements: { allow: [create_table] }";
    assert!(messages(rule, "CREATE TABLE t (id INT);").is_empty());
    assert_eq!(messages(rule, "INSERT INTO t (id) VALUES (1);").len(), 1);
}

#[test]
fn test_deny_mode() {
    let rule = "name: allowed_statements\nmeta:\n  statements: { deny: [truncate_table] }\n  alter_specs: { deny: [drop_column] }";
    assert!(messages(rule, "DROP TABLE t; DELETE FROM t;").is_empty());
    assert!(messages(rule, "ALTER TABLE t RENAME COLUMN a TO b;").is_empty());
    assert_eq!(messages(rule, "TRUNCATE TABLE t;").len(), 1);
    assert_eq!(messages(rule, "ALTER TABLE t ADD COLUMN a INT, DROP COLUMN b;").len(), 1);
}

#[test]
fn test_invalid_meta() {
    let err = build_error(
        "name: allowed_statements\nmeta:\n  statements: { allow: [create_table], deny: [drop_table] }",
    );
    assert!(matches!(err, LintError::InvalidMeta { .. }));

    let err = build_error("name: allowed_statements\nmeta:\n  statements: { allow: [drop_everything] }");
    assert!(matches!(err, LintError::InvalidMeta { .. }));

    let err = build_error("name: allowed_statements\nmeta:\n  bogus: 1");
    let message = err.to_string();
    assert!(message.contains("[L004]"));
    assert!(message.contains("expected"));
}

#[test]
fn test_partial_meta_keeps_other_defaults() {
    let rule = "name: allowed_statements\nmeta:\n  alter_specs: { allow: [add_columns] }";
    assert!(messages(rule, "CREATE TABLE t (id INT); ALTER TABLE t ADD COLUMN x INT;").is_empty());
    assert_eq!(
        messages(rule, "ALTER TABLE t ADD INDEX idx_x (x);"),
        vec!["ALTER TABLE specification 'add_constraint' is not allowed"]
    );
    assert_eq!(messages(rule, "DROP TABLE t;").len(), 1);
}

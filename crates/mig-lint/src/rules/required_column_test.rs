use crate::error::LintError;
use crate::test_utils::{build_error, messages};

const CREATED_AT: &str = "name: required_column
meta:
  column: created_at
  types: [datetime]
  default_current_timestamp: true";

#[test]
fn test_missing_column() {
    assert_eq!(
        messages(CREATED_AT, "CREATE TABLE t (id BIGINT);"),
        vec!["table 't' is missing required column 'created_at'"]
    );
}

#[test]
fn test_wrong_type_and_default() {
    assert_eq!(
        messages(CREATED_AT, "CREATE TABLE t (created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP);"),
        vec!["column 'created_at' must be one of [DATETIME], found TIMESTAMP"]
    );
    assert_eq!(
        messages(CREATED_AT, "CREATE TABLE t (created_at DATETIME);"),
        vec!["column 'created_at' must have DEFAULT CURRENT_TIMESTAMP"]
    );
    assert!(messages(CREATED_AT, "CREATE TABLE t (created_at DATETIME DEFAULT NOW());").is_empty());
}

#[test]
fn test_primary_key_and_not_null() {
    let rule = "name: required_column\nmeta: { column: id, primary_key: true, not_null: true }";
    assert!(messages(rule, "CREATE TABLE t (id BIGINT PRIMARY KEY);").is_empty());
    assert!(messages(rule, "CREATE TABLE t (id BIGINT NOT NULL, PRIMARY KEY (id));").is_empty());
    assert_eq!(
        messages(rule, "CREATE TABLE t (id BIGINT NOT NULL, x INT, PRIMARY KEY (id, x));"),
        vec!["column 'id' must be the primary key"]
    );
    assert_eq!(
        messages(rule, "CREATE TABLE t (id BIGINT);"),
        vec!["column 'id' must be NOT NULL"]
    );
}

#[test]
fn test_on_update() {
    let rule = "name: required_column\nmeta: { column: updated_at, on_update_current_timestamp: true }";
    assert!(messages(
        rule,
        "CREATE TABLE t (updated_at DATETIME DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP);"
    )
    .is_empty());
    assert_eq!(messages(rule, "CREATE TABLE t (updated_at DATETIME);").len(), 1);
}

#[test]
fn test_only_create_table_checked() {
    assert!(messages(CREATED_AT, "ALTER TABLE t ADD COLUMN x INT; CREATE TABLE u LIKE t;").is_empty());
}

#[test]
fn test_meta_required() {
    assert!(matches!(
        build_error("name: required_column"),
        LintError::InvalidMeta { .. }
    ));
    assert!(matches!(
        build_error("name: required_column\nmeta: { column: x, typo: true }"),
        LintError::InvalidMeta { .. }
    ));
}

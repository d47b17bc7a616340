use crate::error::LintError;
use crate::test_utils::{build_error, messages};

#[test]
fn test_float_double() {
    let rule = "name: float_double";
    assert_eq!(
        messages(rule, "CREATE TABLE t (price FLOAT);"),
        vec!["column 'price' uses FLOAT; use DECIMAL instead"]
    );
    assert_eq!(messages(rule, "ALTER TABLE t MODIFY price DOUBLE PRECISION;").len(), 1);
    assert_eq!(messages(rule, "ALTER TABLE t ADD COLUMN r REAL;").len(), 1);
    assert!(messages(rule, "CREATE TABLE t (price DECIMAL(10,2));").is_empty());
    assert!(matches!(
        build_error("name: float_double\nmeta: { x: 1 }"),
        LintError::InvalidMeta { .. }
    ));
}

#[test]
fn test_varchar_length() {
    let rule = "name: varchar_length\nmeta: { max: 255 }";
    assert!(messages(rule, "CREATE TABLE t (a VARCHAR(255));").is_empty());
    assert_eq!(
        messages(rule, "CREATE TABLE t (a VARCHAR(256));"),
        vec!["column 'a' has VARCHAR length 256, allowed range is 1..=255"]
    );
    assert!(messages("name: varchar_length", "CREATE TABLE t (a VARCHAR(5000));").is_empty());
    assert!(matches!(
        build_error("name: varchar_length\nmeta: { min: 10, max: 5 }"),
        LintError::InvalidMeta { .. }
    ));
}

#[test]
fn test_not_null() {
    let rule = "name: not_null";
    assert!(messages(rule, "CREATE TABLE t (id BIGINT PRIMARY KEY, a INT NOT NULL);").is_empty());
    assert_eq!(
        messages(rule, "ALTER TABLE t CHANGE a b INT NULL;"),
        vec!["column 'b' must be NOT NULL"]
    );
}

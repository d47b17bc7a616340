use super::check_name;
use crate::test_utils::messages;

#[test]
fn test_check_name() {
    assert_eq!(check_name("table", "user_accounts", None), None);
    assert_eq!(check_name("table", "t2", None), None);
    assert!(check_name("table", "Users", None).unwrap().contains("lower case"));
    assert!(check_name("table", "2fa", None).unwrap().contains("digit"));
    assert!(check_name("table", "_tmp", None).unwrap().contains("underscores"));
    assert!(check_name("table", "a__b", None).unwrap().contains("underscores"));
    assert!(check_name("table", "tmp_", None).unwrap().contains("underscores"));
    assert!(check_name("table", "user-accounts", None).unwrap().contains("only contain"));
    assert!(check_name("column", "order", None).unwrap().contains("reserved"));
    assert!(check_name("column", "abcdef", Some(5)).unwrap().contains("longer than 5"));
}

#[test]
fn test_table_name_rule() {
    let rule = "name: table_name";
    assert!(messages(rule, "CREATE TABLE user_accounts (id INT);").is_empty());
    assert_eq!(
        messages(rule, "CREATE TABLE `UserAccounts` (id INT);"),
        vec!["table name 'UserAccounts' must be lower case"]
    );
    assert_eq!(messages(rule, "RENAME TABLE a TO `Bad`;").len(), 1);
    assert_eq!(messages(rule, "ALTER TABLE a RENAME TO `select`;").len(), 1);
}

#[test]
fn test_column_name_rule() {
    let rule = "name: column_name\nmeta: { max_length: 10 }";
    assert!(messages(rule, "CREATE TABLE t (id INT, org_id INT);").is_empty());
    assert_eq!(
        messages(rule, "ALTER TABLE t ADD COLUMN a_very_long_name INT;"),
        vec!["column name 'a_very_long_name' is longer than 10 characters"]
    );
    assert_eq!(messages(rule, "ALTER TABLE t CHANGE a `B` INT;").len(), 1);
    assert_eq!(messages(rule, "ALTER TABLE t RENAME COLUMN a TO `key`;").len(), 1);
}

#[test]
fn test_index_name_prefixes() {
    let rule = "name: index_name\nmeta: { unique_prefix: uk_, index_prefix: idx_ }";
    assert!(messages(
        rule,
        "CREATE TABLE t (id INT, a INT, UNIQUE KEY uk_a (a), KEY idx_id (id), PRIMARY KEY (id));"
    )
    .is_empty());
    assert_eq!(
        messages(rule, "CREATE INDEX a_idx ON t (a);"),
        vec!["index name 'a_idx' must start with 'idx_'"]
    );
    assert_eq!(
        messages(rule, "ALTER TABLE t ADD UNIQUE INDEX (a);"),
        vec!["index on 'a' must be named with prefix 'uk_'"]
    );
    assert_eq!(messages(rule, "ALTER TABLE t RENAME INDEX idx_a TO `IdxA`;").len(), 1);
}

#[test]
fn test_index_name_without_prefixes() {
    let rule = "name: index_name";
    assert!(messages(rule, "CREATE TABLE t (a INT, KEY (a));").is_empty());
    assert_eq!(messages(rule, "CREATE TABLE t (a INT, KEY `Idx` (a));").len(), 1);
}

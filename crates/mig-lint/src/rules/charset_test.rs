use crate::test_utils::messages;

#[test]
fn test_charset_required() {
    let rule = "name: charset";
    assert!(messages(rule, "CREATE TABLE t (id INT) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;").is_empty());
    assert!(messages(rule, "CREATE TABLE t (id INT) CHARACTER SET = UTF8;").is_empty());
    assert_eq!(
        messages(rule, "CREATE TABLE t (id INT);"),
        vec!["table 't' must declare a charset (one of utf8mb4, utf8)"]
    );
    assert_eq!(
        messages(rule, "CREATE TABLE t (id INT) DEFAULT CHARSET=latin1;"),
        vec!["table 't' uses charset 'latin1', allowed: utf8mb4, utf8"]
    );
}

#[test]
fn test_charset_custom_allowed() {
    let rule = "name: charset\nmeta: { allowed: [latin1] }";
    assert!(messages(rule, "CREATE TABLE t (id INT) DEFAULT CHARSET=latin1;").is_empty());
}

#[test]
fn test_explicit_collation() {
    let rule = "name: explicit_collation";
    assert!(messages(rule, "CREATE TABLE t (a VARCHAR(10)) DEFAULT CHARSET=utf8mb4;").is_empty());
    assert_eq!(
        messages(rule, "CREATE TABLE t (a VARCHAR(10) CHARACTER SET latin1);"),
        vec!["column 'a' declares an explicit CHARACTER SET; rely on the table default"]
    );
    assert_eq!(
        messages(rule, "ALTER TABLE t MODIFY a VARCHAR(10) COLLATE utf8mb4_bin;"),
        vec!["column 'a' declares an explicit COLLATE; rely on the table default"]
    );
}

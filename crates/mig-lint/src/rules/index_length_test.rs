use super::bytes_per_char;
use crate::test_utils::messages;

const RULE: &str = "name: index_length";

#[test]
fn test_bytes_per_char() {
    assert_eq!(bytes_per_char("utf8mb4"), 4);
    assert_eq!(bytes_per_char("UTF8"), 3);
    assert_eq!(bytes_per_char("latin1"), 1);
}

#[test]
fn test_key_part_limit() {
    assert!(messages(
        RULE,
        "CREATE TABLE t (name VARCHAR(191), KEY idx_name (name)) DEFAULT CHARSET=utf8mb4;"
    )
    .is_empty());
    assert_eq!(
        messages(
            RULE,
            "CREATE TABLE t (name VARCHAR(192), KEY idx_name (name)) DEFAULT CHARSET=utf8mb4;"
        ),
        vec!["key part 'name' of index 'idx_name' is 768 bytes, limit is 767"]
    );
    // A prefix length brings the key part under the limit
    assert!(messages(
        RULE,
        "CREATE TABLE t (name VARCHAR(500), KEY idx_name (name(100)));"
    )
    .is_empty());
}

#[test]
fn test_charset_sizes_key_parts() {
    assert!(messages(
        RULE,
        "CREATE TABLE t (code VARCHAR(700) UNIQUE) DEFAULT CHARSET=latin1;"
    )
    .is_empty());
    assert_eq!(
        messages(
            RULE,
            "CREATE TABLE t (code VARCHAR(300) CHARACTER SET utf8 UNIQUE) DEFAULT CHARSET=latin1;"
        )
        .len(),
        1
    );
}

#[test]
fn test_total_key_limit() {
    let sql = "CREATE TABLE t (a VARCHAR(190), b VARCHAR(190), c VARCHAR(190), d VARCHAR(190), e VARCHAR(190), \
               KEY idx_all (a, b, c, d, e));";
    assert_eq!(
        messages(RULE, sql),
        vec!["index 'idx_all' is 3800 bytes, limit is 3072"]
    );
}

#[test]
fn test_text_requires_prefix() {
    assert_eq!(
        messages(RULE, "CREATE TABLE t (body TEXT, KEY idx_body (body));"),
        vec!["TEXT column 'body' needs a prefix length to be indexed"]
    );
    assert!(messages(RULE, "CREATE TABLE t (body TEXT, KEY idx_body (body(50)));").is_empty());
    assert!(messages(RULE, "CREATE TABLE t (body TEXT, FULLTEXT KEY ft_body (body));").is_empty());
}

#[test]
fn test_alter_uses_script_schema_and_added_columns() {
    let sql = "CREATE TABLE t (id BIGINT);\n\
               ALTER TABLE t ADD COLUMN slug VARCHAR(255), ADD UNIQUE KEY uk_slug (slug);";
    assert_eq!(messages(RULE, sql).len(), 1);
    // Unknown tables are skipped
    assert!(messages(RULE, "ALTER TABLE other ADD INDEX idx_x (x);").is_empty());
}

#[test]
fn test_huge_declared_length_is_reported() {
    assert_eq!(
        messages(RULE, "CREATE TABLE t (c VARCHAR(1100000000), KEY idx_c (c));"),
        vec!["key part 'c' of index 'idx_c' is 4400000000 bytes, limit is 767"]
    );
    assert_eq!(
        messages(
            RULE,
            "CREATE TABLE t (a TEXT, b TEXT, KEY idx_ab (a(4000000000), b(4000000000)));"
        )
        .len(),
        1
    );
}

use super::*;
use crate::test_utils::config;
use mig_core::AllowList;

fn builtins() -> Registry {
    Registry::with_builtins()
}

#[test]
fn test_first_match_per_statement() {
    let configs = vec![config("name: not_null"), config("name: float_double")];
    let mut linter = Linter::with_registry(&builtins(), &configs).unwrap();
    let count = linter
        .lint("m", "0001.sql", "CREATE TABLE t (price FLOAT);")
        .unwrap();
    assert_eq!(count, 1);
    let v = linter.violations().next().unwrap();
    assert_eq!(v.rule, "not_null");
    assert_eq!(v.script, "m/0001.sql");
}

#[test]
fn test_violations_per_statement_accumulate() {
    let mut linter = Linter::with_registry(&builtins(), &[config("name: not_null")]).unwrap();
    linter
        .lint(
            "m",
            "0001.sql",
            "CREATE TABLE a (x INT);\nCREATE TABLE b (y INT NOT NULL);\nCREATE TABLE c (z INT);",
        )
        .unwrap();
    linter.lint("n", "0002.sql", "CREATE TABLE d (w INT);").unwrap();
    assert_eq!(linter.violation_count(), 3);
    assert_eq!(linter.errors()["m/0001.sql"].len(), 2);
    assert_eq!(linter.errors()["n/0002.sql"].len(), 1);
    assert!(!linter.is_clean());
}

#[test]
fn test_offending_line_located() {
    let mut linter = Linter::with_registry(&builtins(), &[config("name: not_null")]).unwrap();
    let sql = "-- header\n\nCREATE TABLE t (\n  id BIGINT NOT NULL,\n  name VARCHAR(10)\n);";
    linter.lint("m", "0001.sql", sql).unwrap();
    let v = linter.violations().next().unwrap();
    assert_eq!(v.line, "name VARCHAR(10)");
    assert_eq!(v.line_number, 5);
    assert!(v.statement.starts_with("CREATE TABLE t"));
}

#[test]
fn test_line_falls_back_to_first_line() {
    let mut linter =
        Linter::with_registry(&builtins(), &[config("name: complete_insert")]).unwrap();
    linter
        .lint("m", "0001.sql", "\n\nINSERT INTO t\nVALUES (1);")
        .unwrap();
    let v = linter.violations().next().unwrap();
    assert_eq!(v.line, "INSERT INTO t");
    assert_eq!(v.line_number, 3);
}

#[test]
fn test_alias_reported_and_duplicates_rejected() {
    let aliased = config("name: not_null\nalias: strict_nulls");
    let mut linter = Linter::with_registry(&builtins(), &[aliased.clone()]).unwrap();
    linter.lint("", "0001.sql", "CREATE TABLE t (a INT);").unwrap();
    assert_eq!(linter.violations().next().unwrap().rule, "strict_nulls");
    assert_eq!(linter.violations().next().unwrap().script, "0001.sql");

    let err = Linter::with_registry(&builtins(), &[config("name: not_null"), config("name: not_null")])
        .err()
        .unwrap();
    assert!(matches!(err, LintError::DuplicateAlias(_)));

    // The same rule twice is fine under distinct aliases
    let twice = [aliased, config("name: not_null\nalias: other")];
    assert!(Linter::with_registry(&builtins(), &twice).is_ok());
}

#[test]
fn test_construction_errors() {
    let err = Linter::with_registry(&builtins(), &[config("name: nope")])
        .err()
        .unwrap();
    assert!(matches!(err, LintError::UnknownRule(_)));

    let bad_regex = RuleConfig::named("not_null").with_allow(AllowList {
        patterns: vec!["(".to_string()],
        ..Default::default()
    });
    let err = Linter::with_registry(&builtins(), &[bad_regex]).err().unwrap();
    assert!(matches!(err, LintError::Core(_)));
}

#[test]
fn test_allow_list_exempts_script() {
    let rule = config("name: not_null\nallow:\n  before_date: \"20220101\"\n  modules: [legacy]");
    let mut linter = Linter::with_registry(&builtins(), &[rule]).unwrap();
    let sql = "CREATE TABLE t (a INT);";
    assert_eq!(linter.lint("app", "20210505_old.sql", sql).unwrap(), 0);
    assert_eq!(linter.lint("legacy", "20230101_new.sql", sql).unwrap(), 0);
    assert_eq!(linter.lint("app", "20230101_new.sql", sql).unwrap(), 1);
}

#[test]
fn test_parse_error_names_script() {
    let mut linter = Linter::with_registry(&builtins(), &[config("name: not_null")]).unwrap();
    let err = linter.lint("m", "bad.sql", "CREATE TABLE (").unwrap_err();
    assert!(matches!(err, LintError::Parse { script, .. } if script == "m/bad.sql"));
}

#[test]
fn test_script_local_schema_visible_to_rules() {
    let rule = config("name: index_length");
    let mut linter = Linter::with_registry(&builtins(), &[rule]).unwrap();
    let sql = "CREATE TABLE t (body VARCHAR(1000) NOT NULL) DEFAULT CHARSET=utf8mb4;\n\
               CREATE INDEX idx_body ON t (body);";
    assert_eq!(linter.lint("m", "0001.sql", sql).unwrap(), 1);
    let v = linter.violations().next().unwrap();
    assert!(v.message.contains("idx_body"), "{}", v.message);
    assert_eq!(v.line_number, 2);
}

#[test]
fn test_report_groups_by_script() {
    let mut linter = Linter::with_registry(&builtins(), &[config("name: not_null")]).unwrap();
    linter.lint("m", "0001.sql", "CREATE TABLE t (a INT);").unwrap();
    let report = linter.report();
    assert!(report.contains("m/0001.sql (1 violations)"));
    assert!(report.contains("[not_null] column 'a' must be NOT NULL"));
    assert!(report.contains("1 violations in 1 scripts"));
}

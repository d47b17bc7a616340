//! Linting whole scripts through the public API.

use mig_core::{AllowList, RuleConfig};
use mig_lint::{Linter, Registry};

fn created_at_rule() -> RuleConfig {
    let meta = serde_yaml::from_str(
        "column: created_at\ntypes: [DATETIME]\ndefault_current_timestamp: true",
    )
    .unwrap();
    RuleConfig::named("required_column").with_meta(meta)
}

#[test]
fn test_missing_required_column_is_reported_once() {
    let mut linter = Linter::new(&[created_at_rule()]).unwrap();
    let found = linter
        .lint(
            "billing",
            "20240301_invoices.sql",
            "CREATE TABLE invoices (\n  id BIGINT NOT NULL PRIMARY KEY,\n  total DECIMAL(10,2)\n);\n",
        )
        .unwrap();

    assert_eq!(found, 1);
    let violations: Vec<_> = linter.violations().collect();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].rule, "required_column");
    assert_eq!(violations[0].script, "billing/20240301_invoices.sql");
    assert!(violations[0].message.contains("created_at"));
    assert!(!linter.is_clean());
}

#[test]
fn test_adding_required_column_makes_script_clean() {
    let mut linter = Linter::new(&[created_at_rule()]).unwrap();
    let found = linter
        .lint(
            "billing",
            "20240301_invoices.sql",
            "CREATE TABLE invoices (\n  id BIGINT NOT NULL PRIMARY KEY,\n  \
             created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP\n);\n",
        )
        .unwrap();

    assert_eq!(found, 0);
    assert!(linter.is_clean());
}

#[test]
fn test_allow_list_and_rule_order() {
    let registry = Registry::with_builtins();
    let configs = vec![
        RuleConfig::named("destruct").with_allow(AllowList {
            modules: vec!["legacy".to_string()],
            ..Default::default()
        }),
        RuleConfig::named("table_name"),
    ];
    let mut linter = Linter::with_registry(&registry, &configs).unwrap();

    let script = "DROP TABLE `Old`;\nCREATE TABLE `NewOne` (id INT);\n";
    linter.lint("legacy", "20240101_cleanup.sql", script).unwrap();
    linter.lint("app", "20240101_cleanup.sql", script).unwrap();

    let legacy = &linter.errors()["legacy/20240101_cleanup.sql"];
    assert_eq!(legacy.len(), 1);
    assert_eq!(legacy[0].rule, "table_name");
    assert_eq!(legacy[0].line_number, 2);

    let app = &linter.errors()["app/20240101_cleanup.sql"];
    let rules: Vec<_> = app.iter().map(|v| v.rule.as_str()).collect();
    assert_eq!(rules, vec!["destruct", "table_name"]);

    let report = linter.report();
    assert!(report.contains("app/20240101_cleanup.sql (2 violations)"));
    assert!(report.trim_end().ends_with("3 violations in 2 scripts"));
}

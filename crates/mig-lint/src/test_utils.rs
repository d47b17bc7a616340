//! Helpers shared by rule tests

use crate::error::LintError;
use crate::linter::Linter;
use crate::registry::Registry;
use crate::violation::Violation;
use mig_core::RuleConfig;

/// Parse one rule configuration from YAML.
pub(crate) fn config(yaml: &str) -> RuleConfig {
    serde_yaml::from_str(yaml).unwrap()
}

/// Lint `sql` as `m/20240101_test.sql` with a single configured rule.
pub(crate) fn lint_with(rule_yaml: &str, sql: &str) -> Vec<Violation> {
    let mut linter = Linter::with_registry(&Registry::with_builtins(), &[config(rule_yaml)]).unwrap();
    linter.lint("m", "20240101_test.sql", sql).unwrap();
    linter.violations().cloned().collect()
}

/// Messages produced by linting `sql` with one rule.
pub(crate) fn messages(rule_yaml: &str, sql: &str) -> Vec<String> {
    lint_with(rule_yaml, sql)
        .into_iter()
        .map(|v| v.message)
        .collect()
}

/// Error from binding a rule configuration.
pub(crate) fn build_error(rule_yaml: &str) -> LintError {
    match Linter::with_registry(&Registry::with_builtins(), &[config(rule_yaml)]) {
        Ok(_) => panic!("expected configuration to be rejected: {rule_yaml}"),
        Err(e) => e,
    }
}

//! Character set rules: `charset`, `explicit_collation`.

use super::column_type::no_meta;
use super::{created_table, defined_columns};
use crate::error::LintResult;
use crate::registry::RuleSpec;
use crate::rule::{invalid_meta, parse_meta, Finding, LintContext, Rule};
use mig_core::RuleConfig;
use mig_sql::ast::StatementNode;
use serde::Deserialize;

pub const CHARSET: RuleSpec = RuleSpec {
    name: "charset",
    description: "CREATE TABLE must declare an allowed default charset",
    factory: build_charset,
};

pub const EXPLICIT_COLLATION: RuleSpec = RuleSpec {
    name: "explicit_collation",
    description: "Columns must not override the table charset or collation",
    factory: build_explicit_collation,
};

const CHARSET_EXPECTED: &str = "{allowed?: [charset]}";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Charset {
    #[serde(default = "default_allowed")]
    allowed: Vec<String>,
}

fn default_allowed() -> Vec<String> {
    vec!["utf8mb4".to_string(), "utf8".to_string()]
}

impl Default for Charset {
    fn default() -> Self {
        Self {
            allowed: default_allowed(),
        }
    }
}

fn build_charset(config: &RuleConfig) -> LintResult<Box<dyn Rule>> {
    let meta: Charset = parse_meta(config, CHARSET_EXPECTED)?;
    if meta.allowed.is_empty() {
        return Err(invalid_meta(config, "allowed must not be empty", CHARSET_EXPECTED));
    }
    Ok(Box::new(meta))
}

impl Rule for Charset {
    fn check(&self, node: &StatementNode, _ctx: &LintContext<'_>) -> Option<Finding> {
        let table = created_table(&node.statement)?;
        match table.charset() {
            None => Some(Finding::new(format!(
                "table '{}' must declare a charset (one of {})",
                table.name,
                self.allowed.join(", ")
            ))),
            Some(charset) if !self.allowed.iter().any(|a| a.eq_ignore_ascii_case(charset)) => {
                Some(
                    Finding::new(format!(
                        "table '{}' uses charset '{}', allowed: {}",
                        table.name,
                        charset,
                        self.allowed.join(", ")
                    ))
                    .at(charset),
                )
            }
            Some(_) => None,
        }
    }
}

struct ExplicitCollation;

fn build_explicit_collation(config: &RuleConfig) -> LintResult<Box<dyn Rule>> {
    no_meta(config)?;
    Ok(Box::new(ExplicitCollation))
}

impl Rule for ExplicitCollation {
    fn check(&self, node: &StatementNode, _ctx: &LintContext<'_>) -> Option<Finding> {
        defined_columns(&node.statement).into_iter().find_map(|column| {
            let what = match (&column.charset, &column.collate) {
                (Some(_), _) => "CHARACTER SET",
                (None, Some(_)) => "COLLATE",
                (None, None) => return None,
            };
            Some(
                Finding::new(format!(
                    "column '{}' declares an explicit {}; rely on the table default",
                    column.name, what
                ))
                .at(&column.name),
            )
        })
    }
}

#[cfg(test)]
#[path = "charset_test.rs"]
mod tests;

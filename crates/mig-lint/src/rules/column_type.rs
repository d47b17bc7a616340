//! Column shape rules: `float_double`, `varchar_length`, `not_null`.

use super::defined_columns;
use crate::error::LintResult;
use crate::registry::RuleSpec;
use crate::rule::{invalid_meta, parse_meta, Finding, LintContext, Rule};
use mig_core::RuleConfig;
use mig_sql::ast::StatementNode;
use serde::Deserialize;

pub const FLOAT_DOUBLE: RuleSpec = RuleSpec {
    name: "float_double",
    description: "FLOAT, DOUBLE and REAL columns are not allowed; use DECIMAL",
    factory: build_float_double,
};

pub const VARCHAR_LENGTH: RuleSpec = RuleSpec {
    name: "varchar_length",
    description: "VARCHAR lengths stay within configured bounds",
    factory: build_varchar_length,
};

pub const NOT_NULL: RuleSpec = RuleSpec {
    name: "not_null",
    description: "Columns must be declared NOT NULL",
    factory: build_not_null,
};

struct FloatDouble;

fn build_float_double(config: &RuleConfig) -> LintResult<Box<dyn Rule>> {
    no_meta(config)?;
    Ok(Box::new(FloatDouble))
}

impl Rule for FloatDouble {
    fn check(&self, node: &StatementNode, _ctx: &LintContext<'_>) -> Option<Finding> {
        defined_columns(&node.statement).into_iter().find_map(|column| {
            let ty = column.data_type.canonical_name();
            matches!(ty, "FLOAT" | "DOUBLE" | "REAL" | "FLOAT4").then(|| {
                Finding::new(format!(
                    "column '{}' uses {}; use DECIMAL instead",
                    column.name, column.data_type.name
                ))
                .at(&column.name)
            })
        })
    }
}

const VARCHAR_EXPECTED: &str = "{min?: integer, max?: integer}";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VarcharLength {
    #[serde(default = "default_min")]
    min: u32,
    #[serde(default = "default_max")]
    max: u32,
}

fn default_min() -> u32 {
    1
}

fn default_max() -> u32 {
    5000
}

impl Default for VarcharLength {
    fn default() -> Self {
        Self {
            min: default_min(),
            max: default_max(),
        }
    }
}

fn build_varchar_length(config: &RuleConfig) -> LintResult<Box<dyn Rule>> {
    let meta: VarcharLength = parse_meta(config, VARCHAR_EXPECTED)?;
    if meta.min > meta.max {
        return Err(invalid_meta(
            config,
            format!("min {} is greater than max {}", meta.min, meta.max),
            VARCHAR_EXPECTED,
        ));
    }
    Ok(Box::new(meta))
}

impl Rule for VarcharLength {
    fn check(&self, node: &StatementNode, _ctx: &LintContext<'_>) -> Option<Finding> {
        defined_columns(&node.statement).into_iter().find_map(|column| {
            if column.data_type.canonical_name() != "VARCHAR" {
                return None;
            }
            let length = column.data_type.length()?;
            (length < self.min || length > self.max).then(|| {
                Finding::new(format!(
                    "column '{}' has VARCHAR length {}, allowed range is {}..={}",
                    column.name, length, self.min, self.max
                ))
                .at(&column.name)
            })
        })
    }
}

struct NotNull;

fn build_not_null(config: &RuleConfig) -> LintResult<Box<dyn Rule>> {
    no_meta(config)?;
    Ok(Box::new(NotNull))
}

impl Rule for NotNull {
    fn check(&self, node: &StatementNode, _ctx: &LintContext<'_>) -> Option<Finding> {
        defined_columns(&node.statement).into_iter().find_map(|column| {
            (!column.is_not_null()).then(|| {
                Finding::new(format!("column '{}' must be NOT NULL", column.name)).at(&column.name)
            })
        })
    }
}

/// Reject metadata for rules that take none.
pub(crate) fn no_meta(config: &RuleConfig) -> LintResult<()> {
    match &config.meta {
        None | Some(serde_yaml::Value::Null) => Ok(()),
        Some(_) => Err(invalid_meta(config, "this rule takes no meta", "no meta")),
    }
}

#[cfg(test)]
#[path = "column_type_test.rs"]
mod tests;

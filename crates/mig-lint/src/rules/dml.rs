//! DML rules: `manual_time_setter`, `complete_insert`.

use super::column_type::no_meta;
use crate::error::LintResult;
use crate::registry::RuleSpec;
use crate::rule::{parse_meta, Finding, LintContext, Rule};
use mig_core::RuleConfig;
use mig_sql::ast::{Statement, StatementNode};
use serde::Deserialize;

pub const MANUAL_TIME_SETTER: RuleSpec = RuleSpec {
    name: "manual_time_setter",
    description: "INSERT/UPDATE must not assign engine-maintained timestamp columns",
    factory: build_manual_time_setter,
};

pub const COMPLETE_INSERT: RuleSpec = RuleSpec {
    name: "complete_insert",
    description: "INSERT must name its target columns",
    factory: build_complete_insert,
};

const TIME_SETTER_EXPECTED: &str = "{columns?: [column]}";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManualTimeSetter {
    #[serde(default = "default_columns")]
    columns: Vec<String>,
}

fn default_columns() -> Vec<String> {
    vec!["created_at".to_string(), "updated_at".to_string()]
}

impl Default for ManualTimeSetter {
    fn default() -> Self {
        Self {
            columns: default_columns(),
        }
    }
}

fn build_manual_time_setter(config: &RuleConfig) -> LintResult<Box<dyn Rule>> {
    let meta: ManualTimeSetter = parse_meta(config, TIME_SETTER_EXPECTED)?;
    Ok(Box::new(meta))
}

impl Rule for ManualTimeSetter {
    fn check(&self, node: &StatementNode, _ctx: &LintContext<'_>) -> Option<Finding> {
        let assigned: Vec<&String> = match &node.statement {
            Statement::Insert(insert) => insert.columns.iter().chain(&insert.on_duplicate).collect(),
            Statement::Update(update) => update.assignments.iter().collect(),
            _ => return None,
        };
        assigned
            .into_iter()
            .find(|col| self.columns.iter().any(|c| c.eq_ignore_ascii_case(col)))
            .map(|col| {
                Finding::new(format!(
                    "column '{}' is maintained by the database and must not be set manually",
                    col
                ))
                .at(col.as_str())
            })
    }
}

struct CompleteInsert;

fn build_complete_insert(config: &RuleConfig) -> LintResult<Box<dyn Rule>> {
    no_meta(config)?;
    Ok(Box::new(CompleteInsert))
}

impl Rule for CompleteInsert {
    fn check(&self, node: &StatementNode, _ctx: &LintContext<'_>) -> Option<Finding> {
        match &node.statement {
            Statement::Insert(insert) if insert.columns.is_empty() && !insert.set_form => {
                Some(Finding::new(format!(
                    "INSERT into '{}' must list its columns",
                    insert.table
                )))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "dml_test.rs"]
mod tests;

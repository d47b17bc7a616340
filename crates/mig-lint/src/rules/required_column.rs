//! `required_column`: every created table must carry a given column.
//!
//! ```yaml
//! - name: required_column
//!   alias: created_at_exists
//!   meta:
//!     column: created_at
//!     types: [DATETIME, TIMESTAMP]
//!     not_null: true
//!     default_current_timestamp: true
//! ```

use super::created_table;
use crate::error::LintResult;
use crate::registry::RuleSpec;
use crate::rule::{invalid_meta, parse_required_meta, Finding, LintContext, Rule};
use mig_core::RuleConfig;
use mig_sql::ast::StatementNode;
use serde::Deserialize;

pub const SPEC: RuleSpec = RuleSpec {
    name: "required_column",
    description: "CREATE TABLE must define a required column with the expected shape",
    factory: build,
};

const EXPECTED: &str = "{column: name, types?: [type], not_null?: bool, primary_key?: bool, \
                        default_current_timestamp?: bool, on_update_current_timestamp?: bool}";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RequiredColumn {
    column: String,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    not_null: bool,
    #[serde(default)]
    primary_key: bool,
    #[serde(default)]
    default_current_timestamp: bool,
    #[serde(default)]
    on_update_current_timestamp: bool,
}

fn build(config: &RuleConfig) -> LintResult<Box<dyn Rule>> {
    let mut meta: RequiredColumn = parse_required_meta(config, EXPECTED)?;
    if meta.column.trim().is_empty() {
        return Err(invalid_meta(config, "column must not be empty", EXPECTED));
    }
    for ty in &mut meta.types {
        *ty = ty.trim().to_ascii_uppercase();
    }
    Ok(Box::new(meta))
}

impl Rule for RequiredColumn {
    fn check(&self, node: &StatementNode, _ctx: &LintContext<'_>) -> Option<Finding> {
        let table = created_table(&node.statement)?;
        let Some(column) = table.column(&self.column) else {
            return Some(
                Finding::new(format!(
                    "table '{}' is missing required column '{}'",
                    table.name, self.column
                ))
                .at(&table.name),
            );
        };

        let mismatch = |what: &str| {
            Some(
                Finding::new(format!("column '{}' {}", column.name, what)).at(&column.name),
            )
        };

        if !self.types.is_empty() {
            let name = &column.data_type.name;
            let canonical = column.data_type.canonical_name();
            if !self.types.iter().any(|t| t == name || t == canonical) {
                return mismatch(&format!(
                    "must be one of [{}], found {}",
                    self.types.join(", "),
                    name
                ));
            }
        }
        if self.not_null && !column.is_not_null() {
            return mismatch("must be NOT NULL");
        }
        if self.primary_key {
            let normalized = table.normalized();
            let is_primary = normalized
                .constraint("PRIMARY")
                .map(|pk| {
                    let cols = pk.column_names();
                    cols.len() == 1 && cols[0].eq_ignore_ascii_case(&column.name)
                })
                .unwrap_or(false);
            if !is_primary {
                return mismatch("must be the primary key");
            }
        }
        if self.default_current_timestamp
            && !column
                .default
                .as_ref()
                .is_some_and(|d| d.is_current_timestamp())
        {
            return mismatch("must have DEFAULT CURRENT_TIMESTAMP");
        }
        if self.on_update_current_timestamp
            && !column
                .on_update
                .as_ref()
                .is_some_and(|d| d.is_current_timestamp())
        {
            return mismatch("must have ON UPDATE CURRENT_TIMESTAMP");
        }
        None
    }
}

#[cfg(test)]
#[path = "required_column_test.rs"]
mod tests;

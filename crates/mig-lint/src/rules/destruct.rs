//! `destruct`: ban operations that destroy data or break readers.
//!
//! All operations are forbidden unless `meta.forbid` narrows the set.

use crate::error::LintResult;
use crate::registry::RuleSpec;
use crate::rule::{parse_meta, Finding, LintContext, Rule};
use mig_core::RuleConfig;
use mig_sql::ast::{AlterSpec, Statement, StatementNode};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;

pub const SPEC: RuleSpec = RuleSpec {
    name: "destruct",
    description: "Data-destroying or renaming operations are not allowed",
    factory: build,
};

const EXPECTED: &str = "{forbid?: [drop_database|drop_table|drop_column|truncate_table|rename_table|rename_column]}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Operation {
    DropDatabase,
    DropTable,
    DropColumn,
    TruncateTable,
    RenameTable,
    RenameColumn,
}

impl Operation {
    const ALL: [Operation; 6] = [
        Operation::DropDatabase,
        Operation::DropTable,
        Operation::DropColumn,
        Operation::TruncateTable,
        Operation::RenameTable,
        Operation::RenameColumn,
    ];
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::DropDatabase => "DROP DATABASE",
            Operation::DropTable => "DROP TABLE",
            Operation::DropColumn => "DROP COLUMN",
            Operation::TruncateTable => "TRUNCATE TABLE",
            Operation::RenameTable => "RENAME TABLE",
            Operation::RenameColumn => "RENAME COLUMN",
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Meta {
    #[serde(default)]
    forbid: Option<BTreeSet<Operation>>,
}

struct Destruct {
    forbid: BTreeSet<Operation>,
}

fn build(config: &RuleConfig) -> LintResult<Box<dyn Rule>> {
    let meta: Meta = parse_meta(config, EXPECTED)?;
    Ok(Box::new(Destruct {
        forbid: meta
            .forbid
            .unwrap_or_else(|| Operation::ALL.into_iter().collect()),
    }))
}

/// Destructive operations a statement performs, in order.
fn operations(statement: &Statement) -> Vec<(Operation, Option<&str>)> {
    match statement {
        Statement::DropDatabase { .. } => vec![(Operation::DropDatabase, None)],
        Statement::DropTable(_) => vec![(Operation::DropTable, None)],
        Statement::Truncate(_) => vec![(Operation::TruncateTable, None)],
        Statement::RenameTable(_) => vec![(Operation::RenameTable, None)],
        Statement::AlterTable(alter) => alter
            .specs
            .iter()
            .filter_map(|spec| match spec {
                AlterSpec::DropColumn(name) => Some((Operation::DropColumn, Some(name.as_str()))),
                AlterSpec::RenameTable(_) => Some((Operation::RenameTable, None)),
                AlterSpec::RenameColumn { old_name, .. } => {
                    Some((Operation::RenameColumn, Some(old_name.as_str())))
                }
                AlterSpec::ChangeColumn {
                    old_name, column, ..
                } if !old_name.eq_ignore_ascii_case(&column.name) => {
                    Some((Operation::RenameColumn, Some(old_name.as_str())))
                }
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

impl Rule for Destruct {
    fn check(&self, node: &StatementNode, _ctx: &LintContext<'_>) -> Option<Finding> {
        operations(&node.statement)
            .into_iter()
            .find(|(op, _)| self.forbid.contains(op))
            .map(|(op, target)| match target {
                Some(column) => {
                    Finding::new(format!("{} of '{}' is not allowed", op, column)).at(column)
                }
                None => Finding::new(format!("{} is not allowed", op)),
            })
    }
}

#[cfg(test)]
#[path = "destruct_test.rs"]
mod tests;

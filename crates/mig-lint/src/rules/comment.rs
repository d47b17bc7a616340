//! `table_comment` and `column_comment`.

use super::column_type::no_meta;
use super::{created_table, defined_columns};
use crate::error::LintResult;
use crate::registry::RuleSpec;
use crate::rule::{Finding, LintContext, Rule};
use mig_core::RuleConfig;
use mig_sql::ast::StatementNode;

pub const TABLE_COMMENT: RuleSpec = RuleSpec {
    name: "table_comment",
    description: "CREATE TABLE must carry a non-empty COMMENT",
    factory: build_table_comment,
};

pub const COLUMN_COMMENT: RuleSpec = RuleSpec {
    name: "column_comment",
    description: "Column definitions must carry a non-empty COMMENT",
    factory: build_column_comment,
};

struct TableComment;

fn build_table_comment(config: &RuleConfig) -> LintResult<Box<dyn Rule>> {
    no_meta(config)?;
    Ok(Box::new(TableComment))
}

impl Rule for TableComment {
    fn check(&self, node: &StatementNode, _ctx: &LintContext<'_>) -> Option<Finding> {
        let table = created_table(&node.statement)?;
        let commented = table
            .option("COMMENT")
            .is_some_and(|o| !o.value.text().trim().is_empty());
        (!commented).then(|| Finding::new(format!("table '{}' has no COMMENT", table.name)))
    }
}

struct ColumnComment;

fn build_column_comment(config: &RuleConfig) -> LintResult<Box<dyn Rule>> {
    no_meta(config)?;
    Ok(Box::new(ColumnComment))
}

impl Rule for ColumnComment {
    fn check(&self, node: &StatementNode, _ctx: &LintContext<'_>) -> Option<Finding> {
        defined_columns(&node.statement).into_iter().find_map(|column| {
            let commented = column
                .comment
                .as_deref()
                .is_some_and(|c| !c.trim().is_empty());
            (!commented).then(|| {
                Finding::new(format!("column '{}' has no COMMENT", column.name)).at(&column.name)
            })
        })
    }
}

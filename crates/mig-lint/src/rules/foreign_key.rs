//! `foreign_key`: foreign key constraints are not allowed.

use super::added_constraints;
use super::column_type::no_meta;
use crate::error::LintResult;
use crate::registry::RuleSpec;
use crate::rule::{Finding, LintContext, Rule};
use mig_core::RuleConfig;
use mig_sql::ast::{ConstraintKind, StatementNode};

pub const SPEC: RuleSpec = RuleSpec {
    name: "foreign_key",
    description: "FOREIGN KEY constraints are not allowed",
    factory: build,
};

struct ForeignKey;

fn build(config: &RuleConfig) -> LintResult<Box<dyn Rule>> {
    no_meta(config)?;
    Ok(Box::new(ForeignKey))
}

impl Rule for ForeignKey {
    fn check(&self, node: &StatementNode, _ctx: &LintContext<'_>) -> Option<Finding> {
        added_constraints(&node.statement)
            .into_iter()
            .find(|c| matches!(c.kind, ConstraintKind::ForeignKey(_)))
            .map(|c| {
                let message = match &c.name {
                    Some(name) => format!("foreign key '{}' is not allowed", name),
                    None => "foreign keys are not allowed".to_string(),
                };
                Finding::new(message).at("FOREIGN KEY")
            })
    }
}

//! `allowed_statements`: restrict which statement and ALTER TABLE
//! specification kinds a migration may contain.
//!
//! ```yaml
//! - name: allowed_statements
//!   meta:
//!     statements: { allow: [create_table, alter_table, insert] }
//!     alter_specs: { deny: [drop_column, rename_table] }
//! ```

use crate::error::LintResult;
use crate::registry::RuleSpec;
use crate::rule::{invalid_meta, parse_meta, Finding, LintContext, Rule};
use mig_core::RuleConfig;
use mig_sql::ast::{AlterSpecKind, Statement, StatementKind, StatementNode};
use serde::Deserialize;
use std::collections::BTreeSet;

pub const SPEC: RuleSpec = RuleSpec {
    name: "allowed_statements",
    description: "Only permitted statement and ALTER TABLE kinds may appear",
    factory: build,
};

const EXPECTED: &str = "{statements?: {allow|deny: [kind]}, alter_specs?: {allow|deny: [kind]}}";

const DEFAULT_STATEMENTS: &[StatementKind] = &[
    StatementKind::CreateTable,
    StatementKind::AlterTable,
    StatementKind::CreateIndex,
    StatementKind::DropIndex,
    StatementKind::Select,
    StatementKind::Insert,
    StatementKind::Update,
    StatementKind::Show,
    StatementKind::Set,
];

const DEFAULT_ALTER_SPECS: &[AlterSpecKind] = &[
    AlterSpecKind::TableOptions,
    AlterSpecKind::AddColumns,
    AlterSpecKind::AddConstraint,
    AlterSpecKind::DropIndex,
    AlterSpecKind::ModifyColumn,
    AlterSpecKind::ChangeColumn,
    AlterSpecKind::AlterColumn,
    AlterSpecKind::RenameIndex,
];

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Meta {
    statements: Option<KindFilter<StatementKind>>,
    alter_specs: Option<KindFilter<AlterSpecKind>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KindFilter<K: Ord> {
    allow: Option<BTreeSet<K>>,
    deny: Option<BTreeSet<K>>,
}

/// Permitted set, or everything except a forbidden set.
#[derive(Debug, Clone)]
enum Permitted<K: Ord> {
    Only(BTreeSet<K>),
    AllBut(BTreeSet<K>),
}

impl<K: Ord + Copy> Permitted<K> {
    fn from_filter(
        filter: Option<KindFilter<K>>,
        default: &[K],
        config: &RuleConfig,
    ) -> LintResult<Self> {
        match filter {
            None => Ok(Permitted::Only(default.iter().copied().collect())),
            Some(KindFilter {
                allow: Some(allow),
                deny: None,
            }) => Ok(Permitted::Only(allow)),
            Some(KindFilter {
                allow: None,
                deny: Some(deny),
            }) => Ok(Permitted::AllBut(deny)),
            Some(_) => Err(invalid_meta(
                config,
                "exactly one of 'allow' or 'deny' must be given",
                EXPECTED,
            )),
        }
    }

    fn permits(&self, kind: K) -> bool {
        match self {
            Permitted::Only(set) => set.contains(&kind),
            Permitted::AllBut(set) => !set.contains(&kind),
        }
    }
}

struct AllowedStatements {
    statements: Permitted<StatementKind>,
    alter_specs: Permitted<AlterSpecKind>,
}

fn build(config: &RuleConfig) -> LintResult<Box<dyn Rule>> {
    let meta: Meta = parse_meta(config, EXPECTED)?;
    Ok(Box::new(AllowedStatements {
        statements: Permitted::from_filter(meta.statements, DEFAULT_STATEMENTS, config)?,
        alter_specs: Permitted::from_filter(meta.alter_specs, DEFAULT_ALTER_SPECS, config)?,
    }))
}

impl Rule for AllowedStatements {
    fn check(&self, node: &StatementNode, _ctx: &LintContext<'_>) -> Option<Finding> {
        let kind = node.kind();
        if !self.statements.permits(kind) {
            return Some(Finding::new(format!("statement kind '{}' is not allowed", kind)));
        }
        if let Statement::AlterTable(alter) = &node.statement {
            for spec in &alter.specs {
                let spec_kind = spec.kind();
                if !self.alter_specs.permits(spec_kind) {
                    return Some(Finding::new(format!(
                        "ALTER TABLE specification '{}' is not allowed",
                        spec_kind
                    )));
                }
            }
        }
        None
    }
}

#[cfg(test)]
#[path = "allowed_statements_test.rs"]
mod tests;

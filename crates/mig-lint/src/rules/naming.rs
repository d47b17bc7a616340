//! Naming rules: `table_name`, `column_name`, `index_name`.
//!
//! Names are lower-case letters, digits and underscores, start with a
//! letter, have no leading, trailing or doubled underscores and are not
//! reserved words.

use crate::error::LintResult;
use crate::registry::RuleSpec;
use crate::rule::{parse_meta, Finding, LintContext, Rule};
use mig_core::RuleConfig;
use mig_sql::ast::{AlterSpec, Constraint, ConstraintKind, Statement, StatementNode};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

pub const TABLE_NAME: RuleSpec = RuleSpec {
    name: "table_name",
    description: "Table names are lower_snake_case, not reserved, optionally length-bounded",
    factory: build_table_name,
};

pub const COLUMN_NAME: RuleSpec = RuleSpec {
    name: "column_name",
    description: "Column names are lower_snake_case, not reserved, optionally length-bounded",
    factory: build_column_name,
};

pub const INDEX_NAME: RuleSpec = RuleSpec {
    name: "index_name",
    description: "Index names are lower_snake_case with optional required prefixes",
    factory: build_index_name,
};

const NAME_EXPECTED: &str = "{max_length?: integer}";
const INDEX_EXPECTED: &str = "{max_length?: integer, unique_prefix?: string, index_prefix?: string}";

/// MySQL reserved words most likely to be mistaken for names.
const RESERVED: &[&str] = &[
    "add", "all", "alter", "analyze", "and", "as", "asc", "before", "between", "bigint",
    "binary", "blob", "both", "by", "call", "cascade", "case", "change", "char", "character",
    "check", "collate", "column", "condition", "constraint", "continue", "convert", "create",
    "cross", "current_date", "current_time", "current_timestamp", "current_user", "cursor",
    "database", "databases", "day_hour", "dec", "decimal", "declare", "default",
    "delayed", "delete", "desc", "describe", "distinct", "div", "double", "drop", "dual",
    "each", "else", "elseif", "enclosed", "escaped", "exists", "exit", "explain", "false",
    "fetch", "float", "for", "force", "foreign", "from", "fulltext", "function", "generated",
    "get", "grant", "group", "groups", "having", "high_priority", "if", "ignore", "in",
    "index", "infile", "inner", "inout", "insert", "int", "integer", "interval", "into", "is",
    "iterate", "join", "key", "keys", "kill", "lead", "leading", "leave", "left", "like",
    "limit", "lines", "load", "localtime", "localtimestamp", "lock", "long", "longblob",
    "longtext", "loop", "match", "mediumint", "mediumtext", "mod", "modifies", "natural",
    "not", "null", "numeric", "of", "on", "optimize", "option", "optionally", "or", "order",
    "out", "outer", "over", "partition", "precision", "primary", "procedure", "range",
    "rank", "read", "reads", "real", "recursive", "references", "regexp", "release",
    "rename", "repeat", "replace", "require", "restrict", "return", "revoke", "right",
    "rlike", "row", "rows", "schema", "schemas", "select", "separator", "set", "show",
    "smallint", "spatial", "sql", "ssl", "starting", "stored", "straight_join", "system",
    "table", "terminated", "then", "tinyint", "tinytext", "to", "trailing", "trigger",
    "true", "undo", "union", "unique", "unlock", "unsigned", "update", "usage", "use",
    "using", "utc_date", "utc_time", "utc_timestamp", "values", "varbinary", "varchar",
    "varying", "virtual", "when", "where", "while", "window", "with", "write", "xor",
    "year_month", "zerofill",
];

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_pattern() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9]*(_[a-z0-9]+)*$").expect("valid regex"))
}

/// Problem with `name`, if any. `what` is "table", "column" or "index".
pub(crate) fn check_name(what: &str, name: &str, max_length: Option<usize>) -> Option<String> {
    if !name_pattern().is_match(name) {
        let reason = if name.chars().any(|c| c.is_ascii_uppercase()) {
            "must be lower case"
        } else if name.starts_with(|c: char| c.is_ascii_digit()) {
            "must not start with a digit"
        } else if name.starts_with('_') || name.ends_with('_') || name.contains("__") {
            "must not have leading, trailing or repeated underscores"
        } else {
            "may only contain lower-case letters, digits and underscores"
        };
        return Some(format!("{} name '{}' {}", what, name, reason));
    }
    if RESERVED.contains(&name) {
        return Some(format!("{} name '{}' is a reserved word", what, name));
    }
    if let Some(max) = max_length {
        if name.len() > max {
            return Some(format!(
                "{} name '{}' is longer than {} characters",
                what, name, max
            ));
        }
    }
    None
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NameMeta {
    #[serde(default)]
    max_length: Option<usize>,
}

struct TableName {
    max_length: Option<usize>,
}

fn build_table_name(config: &RuleConfig) -> LintResult<Box<dyn Rule>> {
    let meta: NameMeta = parse_meta(config, NAME_EXPECTED)?;
    Ok(Box::new(TableName {
        max_length: meta.max_length,
    }))
}

impl Rule for TableName {
    fn check(&self, node: &StatementNode, _ctx: &LintContext<'_>) -> Option<Finding> {
        let names: Vec<&str> = match &node.statement {
            Statement::CreateTable(create) => vec![create.name.as_str()],
            Statement::RenameTable(rename) => rename.pairs.iter().map(|(_, to)| to.as_str()).collect(),
            Statement::AlterTable(alter) => alter
                .specs
                .iter()
                .filter_map(|s| match s {
                    AlterSpec::RenameTable(to) => Some(to.as_str()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        names.into_iter().find_map(|name| {
            check_name("table", name, self.max_length).map(|m| Finding::new(m).at(name))
        })
    }
}

struct ColumnName {
    max_length: Option<usize>,
}

fn build_column_name(config: &RuleConfig) -> LintResult<Box<dyn Rule>> {
    let meta: NameMeta = parse_meta(config, NAME_EXPECTED)?;
    Ok(Box::new(ColumnName {
        max_length: meta.max_length,
    }))
}

impl Rule for ColumnName {
    fn check(&self, node: &StatementNode, _ctx: &LintContext<'_>) -> Option<Finding> {
        let mut names: Vec<&str> = Vec::new();
        match &node.statement {
            Statement::CreateTable(create) => {
                names.extend(create.columns.iter().map(|c| c.name.as_str()))
            }
            Statement::AlterTable(alter) => {
                for spec in &alter.specs {
                    match spec {
                        AlterSpec::AddColumns { columns, .. } => {
                            names.extend(columns.iter().map(|c| c.name.as_str()))
                        }
                        AlterSpec::ChangeColumn { column, .. } => names.push(&column.name),
                        AlterSpec::RenameColumn { new_name, .. } => names.push(new_name),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        names.into_iter().find_map(|name| {
            check_name("column", name, self.max_length).map(|m| Finding::new(m).at(name))
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct IndexName {
    #[serde(default)]
    max_length: Option<usize>,
    /// Required prefix for UNIQUE indexes, e.g. `uk_`.
    #[serde(default)]
    unique_prefix: Option<String>,
    /// Required prefix for plain indexes, e.g. `idx_`.
    #[serde(default)]
    index_prefix: Option<String>,
}

fn build_index_name(config: &RuleConfig) -> LintResult<Box<dyn Rule>> {
    let meta: IndexName = parse_meta(config, INDEX_EXPECTED)?;
    Ok(Box::new(meta))
}

impl IndexName {
    fn required_prefix(&self, kind: &ConstraintKind) -> Option<&str> {
        match kind {
            ConstraintKind::Unique => self.unique_prefix.as_deref(),
            ConstraintKind::Index | ConstraintKind::Fulltext | ConstraintKind::Spatial => {
                self.index_prefix.as_deref()
            }
            _ => None,
        }
    }

    fn check_constraint(&self, constraint: &Constraint) -> Option<Finding> {
        if !constraint.kind.is_index() {
            return None;
        }
        let prefix = self.required_prefix(&constraint.kind);
        let Some(name) = constraint.name.as_deref() else {
            let first = constraint.columns.first().map(|p| p.column.as_str())?;
            return prefix.map(|p| {
                Finding::new(format!(
                    "index on '{}' must be named with prefix '{}'",
                    first, p
                ))
                .at(first)
            });
        };
        if let Some(message) = check_name("index", name, self.max_length) {
            return Some(Finding::new(message).at(name));
        }
        match prefix {
            Some(p) if !name.starts_with(p) => Some(
                Finding::new(format!("index name '{}' must start with '{}'", name, p)).at(name),
            ),
            _ => None,
        }
    }
}

impl Rule for IndexName {
    fn check(&self, node: &StatementNode, _ctx: &LintContext<'_>) -> Option<Finding> {
        match &node.statement {
            Statement::CreateTable(create) => create
                .constraints
                .iter()
                .find_map(|c| self.check_constraint(c)),
            Statement::CreateIndex(index) => self.check_constraint(&index.constraint()),
            Statement::AlterTable(alter) => alter.specs.iter().find_map(|spec| match spec {
                AlterSpec::AddConstraint(c) => self.check_constraint(c),
                AlterSpec::RenameIndex { new_name, .. } => {
                    check_name("index", new_name, self.max_length)
                        .map(|m| Finding::new(m).at(new_name))
                }
                _ => None,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "naming_test.rs"]
mod tests;

//! `index_length`: keep index keys within InnoDB's byte limits.
//!
//! Each key part is sized from the column type, its prefix length and the
//! charset's bytes per character. A single key part may not exceed
//! `max_key_part_bytes` (767 by default, the COMPACT row format limit) and a
//! whole key may not exceed `max_key_bytes` (3072). TEXT and BLOB columns can
//! only be indexed through a prefix.

use crate::error::LintResult;
use crate::registry::RuleSpec;
use crate::rule::{invalid_meta, parse_meta, Finding, LintContext, Rule};
use mig_core::RuleConfig;
use mig_sql::ast::{
    AlterSpec, ColumnDef, Constraint, ConstraintKind, CreateTable, KeyPart, Statement,
    StatementNode,
};
use serde::Deserialize;

pub const SPEC: RuleSpec = RuleSpec {
    name: "index_length",
    description: "Index keys stay within per-column and total byte limits",
    factory: build,
};

const EXPECTED: &str = "{max_key_part_bytes?: integer, max_key_bytes?: integer}";

const DEFAULT_CHARSET: &str = "utf8mb4";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IndexLength {
    #[serde(default = "default_key_part")]
    max_key_part_bytes: u32,
    #[serde(default = "default_key")]
    max_key_bytes: u32,
}

fn default_key_part() -> u32 {
    767
}

fn default_key() -> u32 {
    3072
}

impl Default for IndexLength {
    fn default() -> Self {
        Self {
            max_key_part_bytes: default_key_part(),
            max_key_bytes: default_key(),
        }
    }
}

fn build(config: &RuleConfig) -> LintResult<Box<dyn Rule>> {
    let meta: IndexLength = parse_meta(config, EXPECTED)?;
    if meta.max_key_part_bytes == 0 || meta.max_key_bytes < meta.max_key_part_bytes {
        return Err(invalid_meta(
            config,
            "limits must be positive and max_key_bytes >= max_key_part_bytes",
            EXPECTED,
        ));
    }
    Ok(Box::new(meta))
}

/// Bytes per character for a charset name.
pub(crate) fn bytes_per_char(charset: &str) -> u64 {
    let charset = charset.to_ascii_lowercase();
    match charset.as_str() {
        "latin1" | "ascii" | "binary" | "latin2" | "cp1250" | "cp1251" | "cp1252" => 1,
        "gbk" | "gb2312" | "big5" | "ucs2" | "utf16" => 2,
        "utf8" | "utf8mb3" | "ujis" | "eucjpms" => 3,
        _ => 4,
    }
}

/// Storage bytes of a key part, or an error message for unindexable parts.
fn key_part_bytes(
    part: &KeyPart,
    column: &ColumnDef,
    table_charset: &str,
) -> Result<u64, String> {
    let ty = &column.data_type;
    let charset = column.charset.as_deref().unwrap_or(table_charset);
    let chars = |declared: Option<u32>| u64::from(part.length.or(declared).unwrap_or(1));
    let length = |default: u32| u64::from(ty.length().unwrap_or(default));

    let bytes = match ty.canonical_name() {
        "TINYINT" | "YEAR" => 1,
        "SMALLINT" => 2,
        "MEDIUMINT" | "DATE" | "TIME" => 3,
        "INT" | "FLOAT" | "TIMESTAMP" => 4,
        "BIGINT" | "DOUBLE" | "REAL" | "DATETIME" => 8,
        "DECIMAL" => length(10) / 2 + 1,
        "BIT" => length(1).div_ceil(8),
        "ENUM" => 2,
        "SET" => 8,
        "CHAR" | "VARCHAR" => chars(ty.length()).saturating_mul(bytes_per_char(charset)),
        "BINARY" | "VARBINARY" => chars(ty.length()),
        _ if ty.is_text() || ty.is_blob() => match part.length {
            Some(prefix) if ty.is_blob() => u64::from(prefix),
            Some(prefix) => u64::from(prefix).saturating_mul(bytes_per_char(charset)),
            None => {
                return Err(format!(
                    "{} column '{}' needs a prefix length to be indexed",
                    ty.name, column.name
                ))
            }
        },
        _ => 0,
    };
    Ok(bytes)
}

impl IndexLength {
    fn check_key(&self, constraint: &Constraint, table: &CreateTable, extra: &[&ColumnDef]) -> Option<Finding> {
        if !(constraint.kind.is_index() || constraint.kind == ConstraintKind::PrimaryKey) {
            return None;
        }
        // FULLTEXT and SPATIAL indexes are not bounded by key length
        if matches!(constraint.kind, ConstraintKind::Fulltext | ConstraintKind::Spatial) {
            return None;
        }
        let table_charset = table.charset().unwrap_or(DEFAULT_CHARSET);
        let key_name = constraint
            .name
            .clone()
            .unwrap_or_else(|| match constraint.kind {
                ConstraintKind::PrimaryKey => "PRIMARY".to_string(),
                _ => constraint
                    .columns
                    .first()
                    .map(|p| p.column.clone())
                    .unwrap_or_default(),
            });

        let mut total: u64 = 0;
        for part in &constraint.columns {
            let column = table
                .column(&part.column)
                .or_else(|| extra.iter().copied().find(|c| c.name.eq_ignore_ascii_case(&part.column)));
            let Some(column) = column else {
                continue;
            };
            let bytes = match key_part_bytes(part, column, table_charset) {
                Ok(bytes) => bytes,
                Err(message) => return Some(Finding::new(message).at(&key_name)),
            };
            if bytes > u64::from(self.max_key_part_bytes) {
                return Some(
                    Finding::new(format!(
                        "key part '{}' of index '{}' is {} bytes, limit is {}",
                        column.name, key_name, bytes, self.max_key_part_bytes
                    ))
                    .at(&key_name),
                );
            }
            total = total.saturating_add(bytes);
        }
        (total > u64::from(self.max_key_bytes)).then(|| {
            Finding::new(format!(
                "index '{}' is {} bytes, limit is {}",
                key_name, total, self.max_key_bytes
            ))
            .at(&key_name)
        })
    }
}

impl Rule for IndexLength {
    fn check(&self, node: &StatementNode, ctx: &LintContext<'_>) -> Option<Finding> {
        match &node.statement {
            Statement::CreateTable(create) if create.like.is_none() => {
                let table = create.normalized();
                table
                    .constraints
                    .iter()
                    .find_map(|c| self.check_key(c, &table, &[]))
            }
            Statement::CreateIndex(index) => {
                let table = ctx.schema.table(&index.table)?;
                self.check_key(&index.constraint(), table, &[])
            }
            Statement::AlterTable(alter) => {
                let empty = CreateTable {
                    name: alter.name.clone(),
                    ..Default::default()
                };
                let table = ctx.schema.table(&alter.name).unwrap_or(&empty);
                let added: Vec<&ColumnDef> = alter
                    .specs
                    .iter()
                    .flat_map(|spec| match spec {
                        AlterSpec::AddColumns { columns, .. } => columns.iter().collect::<Vec<_>>(),
                        _ => Vec::new(),
                    })
                    .collect();
                alter.specs.iter().find_map(|spec| match spec {
                    AlterSpec::AddConstraint(c) => self.check_key(c, table, &added),
                    _ => None,
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "index_length_test.rs"]
mod tests;

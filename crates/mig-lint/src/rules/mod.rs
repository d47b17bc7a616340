//! Built-in lint rules

pub mod allowed_statements;
pub mod charset;
pub mod column_type;
pub mod comment;
pub mod destruct;
pub mod dml;
pub mod foreign_key;
pub mod index_length;
pub mod naming;
pub mod required_column;

use crate::registry::RuleSpec;
use mig_sql::ast::{AlterSpec, ColumnDef, Constraint, CreateTable, Statement};

/// Every built-in rule.
pub fn builtins() -> Vec<RuleSpec> {
    vec![
        allowed_statements::SPEC,
        required_column::SPEC,
        naming::TABLE_NAME,
        naming::COLUMN_NAME,
        naming::INDEX_NAME,
        column_type::FLOAT_DOUBLE,
        column_type::VARCHAR_LENGTH,
        column_type::NOT_NULL,
        charset::CHARSET,
        charset::EXPLICIT_COLLATION,
        index_length::SPEC,
        destruct::SPEC,
        dml::MANUAL_TIME_SETTER,
        dml::COMPLETE_INSERT,
        comment::TABLE_COMMENT,
        comment::COLUMN_COMMENT,
        foreign_key::SPEC,
    ]
}

/// Column definitions a statement introduces or redefines.
pub(crate) fn defined_columns(statement: &Statement) -> Vec<&ColumnDef> {
    match statement {
        Statement::CreateTable(create) => create.columns.iter().collect(),
        Statement::AlterTable(alter) => alter
            .specs
            .iter()
            .flat_map(|spec| match spec {
                AlterSpec::AddColumns { columns, .. } => columns.iter().collect::<Vec<_>>(),
                AlterSpec::ModifyColumn { column, .. } | AlterSpec::ChangeColumn { column, .. } => {
                    vec![column]
                }
                _ => Vec::new(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Constraints a statement adds, with inline column keys moved to table level.
pub(crate) fn added_constraints(statement: &Statement) -> Vec<Constraint> {
    match statement {
        Statement::CreateTable(create) => create.normalized().constraints,
        Statement::AlterTable(alter) => alter
            .specs
            .iter()
            .filter_map(|spec| match spec {
                AlterSpec::AddConstraint(c) => Some(c.clone()),
                _ => None,
            })
            .collect(),
        Statement::CreateIndex(index) => vec![index.constraint()],
        _ => Vec::new(),
    }
}

/// The CREATE TABLE of a statement, unless it copies another table.
pub(crate) fn created_table(statement: &Statement) -> Option<&CreateTable> {
    match statement {
        Statement::CreateTable(create) if create.like.is_none() => Some(create),
        _ => None,
    }
}

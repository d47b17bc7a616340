//! Schema tracker: table definitions accumulated by replaying DDL.
//!
//! Two independently built schemas (for example the sandbox after migrating
//! and the expected target) are compared structurally. The comparison ignores
//! column order, integer display widths, the `AUTO_INCREMENT` counter and
//! whether a key was declared inline or at table level.

use crate::ast::*;
use crate::error::{SqlError, SqlResult};
use std::collections::BTreeMap;
use std::fmt;

/// Table definitions keyed by lower-cased table name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    tables: BTreeMap<String, CreateTable>,
}

/// One structural difference between two schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Difference {
    /// Table present only in the left schema.
    OnlyInLeft(String),
    /// Table present only in the right schema.
    OnlyInRight(String),
    /// Table present in both with a differing definition.
    Table { table: String, detail: String },
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difference::OnlyInLeft(t) => write!(f, "table '{}' exists only on the left", t),
            Difference::OnlyInRight(t) => write!(f, "table '{}' exists only on the right", t),
            Difference::Table { table, detail } => write!(f, "table '{}': {}", table, detail),
        }
    }
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema holding the given definitions.
    pub fn from_tables(tables: impl IntoIterator<Item = CreateTable>) -> Self {
        let mut schema = Self::new();
        for table in tables {
            schema.insert(table);
        }
        schema
    }

    /// Add or replace a table definition.
    pub fn insert(&mut self, table: CreateTable) {
        let mut table = table.normalized();
        table.if_not_exists = false;
        self.tables.insert(key(&table.name), table);
    }

    pub fn table(&self, name: &str) -> Option<&CreateTable> {
        self.tables.get(&key(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(&key(name))
    }

    pub fn tables(&self) -> impl Iterator<Item = &CreateTable> {
        self.tables.values()
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.values().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn table_mut(&mut self, name: &str) -> SqlResult<&mut CreateTable> {
        self.tables
            .get_mut(&key(name))
            .ok_or_else(|| SqlError::UnknownTable(name.to_string()))
    }

    /// Replay every statement in order.
    pub fn apply_all(&mut self, nodes: &[StatementNode]) -> SqlResult<()> {
        for node in nodes {
            self.apply(&node.statement)?;
        }
        Ok(())
    }

    /// Replay one statement. Statements that do not change structure are
    /// accepted and ignored.
    pub fn apply(&mut self, statement: &Statement) -> SqlResult<()> {
        match statement {
            Statement::CreateTable(create) => self.create_table(create),
            Statement::AlterTable(alter) => self.alter_table(alter),
            Statement::DropTable(drop) => {
                for name in &drop.names {
                    if self.tables.remove(&key(name)).is_none() && !drop.if_exists {
                        return Err(SqlError::UnknownTable(name.clone()));
                    }
                }
                Ok(())
            }
            Statement::RenameTable(rename) => {
                for (from, to) in &rename.pairs {
                    self.rename_table(from, to)?;
                }
                Ok(())
            }
            Statement::CreateIndex(index) => {
                let table = self.table_mut(&index.table)?;
                if table.constraint(&index.name).is_some() {
                    return Err(SqlError::DuplicateIndex {
                        table: table.name.clone(),
                        index: index.name.clone(),
                    });
                }
                table.add_constraint(index.constraint());
                Ok(())
            }
            Statement::DropIndex(drop) => {
                let table = self.table_mut(&drop.table)?;
                remove_constraint(table, &drop.name)
            }
            Statement::Truncate(truncate) => self.table_mut(&truncate.table).map(|_| ()),
            Statement::CreateDatabase { .. }
            | Statement::AlterDatabase { .. }
            | Statement::DropDatabase { .. }
            | Statement::CreateView { .. }
            | Statement::DropView { .. }
            | Statement::Insert(_)
            | Statement::Update(_)
            | Statement::Delete { .. }
            | Statement::Select
            | Statement::Show
            | Statement::Set
            | Statement::Transaction(_)
            | Statement::Other { .. } => Ok(()),
        }
    }

    fn create_table(&mut self, create: &CreateTable) -> SqlResult<()> {
        if self.contains(&create.name) {
            if create.if_not_exists {
                return Ok(());
            }
            return Err(SqlError::DuplicateTable(create.name.clone()));
        }
        let table = match &create.like {
            Some(source) => {
                let mut copy = self
                    .table(source)
                    .cloned()
                    .ok_or_else(|| SqlError::UnknownTable(source.clone()))?;
                copy.name = create.name.clone();
                copy.options.retain(|o| o.name != "AUTO_INCREMENT");
                copy
            }
            None => create.clone(),
        };
        self.insert(table);
        Ok(())
    }

    fn rename_table(&mut self, from: &str, to: &str) -> SqlResult<()> {
        if self.contains(to) && !from.eq_ignore_ascii_case(to) {
            return Err(SqlError::DuplicateTable(to.to_string()));
        }
        let mut table = self
            .tables
            .remove(&key(from))
            .ok_or_else(|| SqlError::UnknownTable(from.to_string()))?;
        table.name = to.to_string();
        self.tables.insert(key(to), table);
        Ok(())
    }

    fn alter_table(&mut self, alter: &AlterTable) -> SqlResult<()> {
        let mut name = alter.name.clone();
        // Work on a copy so a failing specification leaves the schema untouched
        let mut table = self
            .table(&name)
            .cloned()
            .ok_or_else(|| SqlError::UnknownTable(name.clone()))?;

        for spec in &alter.specs {
            if let AlterSpec::RenameTable(new_name) = spec {
                if self.contains(new_name) && !new_name.eq_ignore_ascii_case(&name) {
                    return Err(SqlError::DuplicateTable(new_name.clone()));
                }
                table.name = new_name.clone();
                continue;
            }
            apply_spec(&mut table, spec)?;
        }

        if !table.name.eq_ignore_ascii_case(&name) {
            self.tables.remove(&key(&name));
            name = table.name.clone();
        }
        self.tables.insert(key(&name), table);
        Ok(())
    }

    /// Structural differences between `self` (left) and `other` (right).
    pub fn diff(&self, other: &Schema) -> Vec<Difference> {
        let mut out = Vec::new();
        for (k, left) in &self.tables {
            match other.tables.get(k) {
                None => out.push(Difference::OnlyInLeft(left.name.clone())),
                Some(right) => {
                    for detail in table_differences(left, right) {
                        out.push(Difference::Table {
                            table: left.name.clone(),
                            detail,
                        });
                    }
                }
            }
        }
        for (k, right) in &other.tables {
            if !self.tables.contains_key(k) {
                out.push(Difference::OnlyInRight(right.name.clone()));
            }
        }
        out
    }

    /// True when `diff` finds nothing.
    pub fn structurally_eq(&self, other: &Schema) -> bool {
        self.diff(other).is_empty()
    }
}

fn apply_spec(table: &mut CreateTable, spec: &AlterSpec) -> SqlResult<()> {
    match spec {
        AlterSpec::Options(options) => {
            for option in options {
                table.options.retain(|o| o.name != option.name);
                table.options.push(option.clone());
            }
        }
        AlterSpec::AddColumns { columns, position } => {
            for column in columns {
                if table.column(&column.name).is_some() {
                    return Err(SqlError::DuplicateColumn {
                        table: table.name.clone(),
                        column: column.name.clone(),
                    });
                }
                let index = position_index(table, position, table.columns.len())?;
                insert_column(table, index, column.clone());
            }
        }
        AlterSpec::AddConstraint(constraint) => {
            if let Some(name) = &constraint.name {
                if table.constraint(name).is_some() {
                    return Err(SqlError::DuplicateIndex {
                        table: table.name.clone(),
                        index: name.clone(),
                    });
                }
            }
            table.add_constraint(constraint.clone());
        }
        AlterSpec::DropColumn(name) => {
            let index = require_column(table, name)?;
            table.columns.remove(index);
            for constraint in &mut table.constraints {
                constraint
                    .columns
                    .retain(|p| !p.column.eq_ignore_ascii_case(name));
            }
            table
                .constraints
                .retain(|c| !c.columns.is_empty() || matches!(c.kind, ConstraintKind::Check(_)));
        }
        AlterSpec::DropPrimaryKey => remove_constraint(table, "PRIMARY")?,
        AlterSpec::DropIndex(name) | AlterSpec::DropForeignKey(name) | AlterSpec::DropCheck(name) => {
            remove_constraint(table, name)?
        }
        AlterSpec::ModifyColumn { column, position } => {
            let index = require_column(table, &column.name)?;
            table.columns.remove(index);
            let index = position_index(table, position, index)?;
            insert_column(table, index, column.clone());
        }
        AlterSpec::ChangeColumn {
            old_name,
            column,
            position,
        } => {
            let index = require_column(table, old_name)?;
            if !old_name.eq_ignore_ascii_case(&column.name) && table.column(&column.name).is_some()
            {
                return Err(SqlError::DuplicateColumn {
                    table: table.name.clone(),
                    column: column.name.clone(),
                });
            }
            table.columns.remove(index);
            rename_key_parts(table, old_name, &column.name);
            let index = position_index(table, position, index)?;
            insert_column(table, index, column.clone());
        }
        AlterSpec::AlterColumn { name, action } => {
            let index = require_column(table, name)?;
            match action {
                AlterColumnAction::SetDefault(expr) => table.columns[index].default = Some(expr.clone()),
                AlterColumnAction::DropDefault => table.columns[index].default = None,
                AlterColumnAction::SetVisible(_) => {}
            }
        }
        AlterSpec::RenameColumn { old_name, new_name } => {
            let index = require_column(table, old_name)?;
            if !old_name.eq_ignore_ascii_case(new_name) && table.column(new_name).is_some() {
                return Err(SqlError::DuplicateColumn {
                    table: table.name.clone(),
                    column: new_name.clone(),
                });
            }
            table.columns[index].name = new_name.clone();
            rename_key_parts(table, old_name, new_name);
        }
        AlterSpec::RenameIndex { old_name, new_name } => {
            let table_name = table.name.clone();
            let constraint = table
                .constraints
                .iter_mut()
                .find(|c| c.has_name(old_name))
                .ok_or_else(|| SqlError::UnknownIndex {
                    table: table_name,
                    index: old_name.clone(),
                })?;
            constraint.name = Some(new_name.clone());
        }
        AlterSpec::ConvertCharset { charset, collate } => {
            table.options.retain(|o| o.name != "CHARSET" && o.name != "COLLATE");
            table
                .options
                .push(TableOption::new("CHARSET", Expr::Raw(charset.clone())));
            if let Some(collate) = collate {
                table
                    .options
                    .push(TableOption::new("COLLATE", Expr::Raw(collate.clone())));
            }
            for column in &mut table.columns {
                if column.charset.is_some() {
                    column.charset = Some(charset.clone());
                    column.collate = collate.clone();
                }
            }
        }
        // Renames are handled by the caller; the rest do not change structure
        AlterSpec::RenameTable(_)
        | AlterSpec::Lock(_)
        | AlterSpec::Algorithm(_)
        | AlterSpec::Force
        | AlterSpec::Partition(_)
        | AlterSpec::Keys { .. }
        | AlterSpec::Tablespace(_)
        | AlterSpec::CheckEnforcement { .. }
        | AlterSpec::Validation(_)
        | AlterSpec::OrderBy(_)
        | AlterSpec::IndexVisibility { .. }
        | AlterSpec::SecondaryLoad
        | AlterSpec::SecondaryUnload => {}
    }
    Ok(())
}

fn require_column(table: &CreateTable, name: &str) -> SqlResult<usize> {
    table
        .column_index(name)
        .ok_or_else(|| SqlError::UnknownColumn {
            table: table.name.clone(),
            column: name.to_string(),
        })
}

fn position_index(
    table: &CreateTable,
    position: &Option<ColumnPosition>,
    default: usize,
) -> SqlResult<usize> {
    match position {
        None => Ok(default.min(table.columns.len())),
        Some(ColumnPosition::First) => Ok(0),
        Some(ColumnPosition::After(name)) => Ok(require_column(table, name)? + 1),
    }
}

/// Insert a column, moving inline key flags to table-level constraints.
fn insert_column(table: &mut CreateTable, index: usize, column: ColumnDef) {
    let mut holder = CreateTable {
        columns: vec![column],
        ..Default::default()
    }
    .normalized();
    let column = holder.columns.remove(0);
    table.columns.insert(index, column);
    for constraint in holder.constraints {
        if constraint.kind == ConstraintKind::PrimaryKey && table.constraint("PRIMARY").is_some() {
            continue;
        }
        let unnamed = Constraint {
            name: None,
            ..constraint
        };
        table.add_constraint(unnamed);
    }
}

fn rename_key_parts(table: &mut CreateTable, old_name: &str, new_name: &str) {
    for constraint in &mut table.constraints {
        for part in &mut constraint.columns {
            if part.column.eq_ignore_ascii_case(old_name) {
                part.column = new_name.to_string();
            }
        }
    }
}

fn remove_constraint(table: &mut CreateTable, name: &str) -> SqlResult<()> {
    let before = table.constraints.len();
    table.constraints.retain(|c| !c.has_name(name));
    if table.constraints.len() == before {
        return Err(SqlError::UnknownIndex {
            table: table.name.clone(),
            index: name.to_string(),
        });
    }
    Ok(())
}

/// Column attributes that take part in structural comparison.
#[derive(Debug, PartialEq)]
struct ColumnShape {
    type_name: String,
    args: Vec<String>,
    unsigned: bool,
    not_null: bool,
    default: Option<String>,
    on_update: Option<String>,
    auto_increment: bool,
    comment: String,
}

fn column_shape(column: &ColumnDef, table: &CreateTable) -> ColumnShape {
    let in_primary_key = table.constraint("PRIMARY").is_some_and(|pk| {
        pk.columns
            .iter()
            .any(|p| p.column.eq_ignore_ascii_case(&column.name))
    });
    let not_null = column.is_not_null() || in_primary_key;
    let default = match &column.default {
        Some(Expr::Null) | None => None,
        Some(expr) => Some(expr.text().to_string()),
    };
    let args = if column.data_type.is_integer() {
        Vec::new()
    } else {
        column
            .data_type
            .args
            .iter()
            .map(|a| a.to_ascii_lowercase())
            .collect()
    };
    ColumnShape {
        type_name: column.data_type.canonical_name().to_string(),
        args,
        unsigned: column.data_type.unsigned,
        not_null,
        default,
        on_update: column.on_update.as_ref().map(|e| e.text().to_string()),
        auto_increment: column.auto_increment,
        comment: column.comment.clone().unwrap_or_default(),
    }
}

/// Comparable identity of a constraint.
fn constraint_signature(constraint: &Constraint) -> String {
    let columns: Vec<String> = constraint
        .columns
        .iter()
        .map(|p| match p.length {
            Some(len) => format!("{}({})", p.column.to_ascii_lowercase(), len),
            None => p.column.to_ascii_lowercase(),
        })
        .collect();
    let name = constraint
        .name
        .as_deref()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match &constraint.kind {
        ConstraintKind::PrimaryKey => format!("PRIMARY KEY ({})", columns.join(",")),
        ConstraintKind::Unique => format!("UNIQUE {} ({})", name, columns.join(",")),
        ConstraintKind::Index => format!("KEY {} ({})", name, columns.join(",")),
        ConstraintKind::Fulltext => format!("FULLTEXT {} ({})", name, columns.join(",")),
        ConstraintKind::Spatial => format!("SPATIAL {} ({})", name, columns.join(",")),
        ConstraintKind::ForeignKey(fk) => format!(
            "FOREIGN KEY {} ({}) REFERENCES {} ({})",
            name,
            columns.join(","),
            fk.table.to_ascii_lowercase(),
            fk.columns.join(",").to_ascii_lowercase()
        ),
        ConstraintKind::Check(expr) => format!("CHECK {} ({})", name, expr.to_ascii_lowercase()),
    }
}

fn table_differences(left: &CreateTable, right: &CreateTable) -> Vec<String> {
    let mut out = Vec::new();

    for column in &left.columns {
        match right.column(&column.name) {
            None => out.push(format!("column '{}' exists only on the left", column.name)),
            Some(other) => {
                if column_shape(column, left) != column_shape(other, right) {
                    out.push(format!(
                        "column '{}' differs: {} vs {}",
                        column.name,
                        column.without_keys(),
                        other.without_keys()
                    ));
                }
                if let (Some(a), Some(b)) = (&column.charset, &other.charset) {
                    if !a.eq_ignore_ascii_case(b) {
                        out.push(format!("column '{}' charset {} vs {}", column.name, a, b));
                    }
                }
                if let (Some(a), Some(b)) = (&column.collate, &other.collate) {
                    if !a.eq_ignore_ascii_case(b) {
                        out.push(format!("column '{}' collation {} vs {}", column.name, a, b));
                    }
                }
            }
        }
    }
    for column in &right.columns {
        if left.column(&column.name).is_none() {
            out.push(format!("column '{}' exists only on the right", column.name));
        }
    }

    let left_keys: Vec<String> = left.constraints.iter().map(constraint_signature).collect();
    let right_keys: Vec<String> = right.constraints.iter().map(constraint_signature).collect();
    for k in &left_keys {
        if !right_keys.contains(k) {
            out.push(format!("{} exists only on the left", k));
        }
    }
    for k in &right_keys {
        if !left_keys.contains(k) {
            out.push(format!("{} exists only on the right", k));
        }
    }

    for option in &left.options {
        if option.name == "AUTO_INCREMENT" {
            continue;
        }
        if let Some(other) = right.option(&option.name) {
            if !option.value.text().eq_ignore_ascii_case(other.value.text()) {
                out.push(format!(
                    "option {} is '{}' vs '{}'",
                    option.name,
                    option.value.text(),
                    other.value.text()
                ));
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;

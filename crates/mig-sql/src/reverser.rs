//! DDL reversal: synthesize the statement that undoes a schema change.
//!
//! The reverse of a statement is computed against a snapshot of the target
//! table taken before the statement runs. Data-destructive or otherwise
//! unrecoverable changes are declined with a [`NotReversible`] reason; lookup
//! failures (a dropped index that the snapshot does not have) are errors.

use crate::ast::*;
use crate::dialect::quote_ident;
use crate::error::{SqlError, SqlResult};
use crate::schema::Schema;
use std::fmt;

/// Outcome of reversing one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reversal {
    /// Executable inverse statement.
    Reversed(String),
    /// No safe inverse exists.
    NotReversible(NotReversible),
    /// The statement needs no reversal (DML, an ALTER with nothing to undo).
    NoReversal,
}

impl Reversal {
    pub fn statement(&self) -> Option<&str> {
        match self {
            Reversal::Reversed(sql) => Some(sql),
            _ => None,
        }
    }
}

/// Why a statement cannot be reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotReversible {
    DropDatabase,
    DropTable,
    TruncateTable,
    DropView,
    DropPrimaryIndex,
    UnnamedForeignKey,
    UnnamedCheck,
    DropColumn,
    DropPrimaryKey,
    DropForeignKey,
    DropCheck,
    ColumnVisibility,
    ConvertCharset,
    Lock,
    Algorithm,
    Force,
    Partition,
    Keys,
    Tablespace,
    CheckEnforcement,
    Validation,
    OrderBy,
    IndexVisibility,
    SecondaryLoad,
    SecondaryUnload,
}

impl NotReversible {
    pub fn reason(self) -> &'static str {
        match self {
            NotReversible::DropDatabase => "DROP DATABASE destroys data",
            NotReversible::DropTable => "DROP TABLE destroys data",
            NotReversible::TruncateTable => "TRUNCATE TABLE destroys data",
            NotReversible::DropView => "the dropped view definition is not tracked",
            NotReversible::DropPrimaryIndex => "dropping the PRIMARY index is never reversed",
            NotReversible::UnnamedForeignKey => {
                "an unnamed foreign key gets a server-generated name"
            }
            NotReversible::UnnamedCheck => "an unnamed check constraint gets a server-generated name",
            NotReversible::DropColumn => "DROP COLUMN destroys data",
            NotReversible::DropPrimaryKey => "DROP PRIMARY KEY is not reversed",
            NotReversible::DropForeignKey => "DROP FOREIGN KEY is not reversed",
            NotReversible::DropCheck => "DROP CHECK is not reversed",
            NotReversible::ColumnVisibility => "column visibility is not tracked",
            NotReversible::ConvertCharset => "CONVERT TO CHARACTER SET rewrites every column",
            NotReversible::Lock => "LOCK clauses have no inverse",
            NotReversible::Algorithm => "ALGORITHM clauses have no inverse",
            NotReversible::Force => "FORCE has no inverse",
            NotReversible::Partition => "partition management is not reversed",
            NotReversible::Keys => "ENABLE/DISABLE KEYS is not reversed",
            NotReversible::Tablespace => "tablespace operations are not reversed",
            NotReversible::CheckEnforcement => "check enforcement changes are not reversed",
            NotReversible::Validation => "WITH/WITHOUT VALIDATION has no inverse",
            NotReversible::OrderBy => "ORDER BY has no inverse",
            NotReversible::IndexVisibility => "index visibility is not tracked",
            NotReversible::SecondaryLoad => "SECONDARY_LOAD is not reversed",
            NotReversible::SecondaryUnload => "SECONDARY_UNLOAD is not reversed",
        }
    }
}

impl fmt::Display for NotReversible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Reverse a statement, taking the table snapshot from `schema`.
pub fn reverse_against(schema: &Schema, statement: &Statement) -> SqlResult<Reversal> {
    let snapshot = statement.target_table().and_then(|t| schema.table(t));
    reverse_statement(snapshot, statement)
}

/// Reverse a statement given the target table's definition before it runs.
pub fn reverse_statement(
    snapshot: Option<&CreateTable>,
    statement: &Statement,
) -> SqlResult<Reversal> {
    let reversal = match statement {
        Statement::CreateTable(create) => Reversal::Reversed(
            DropTable {
                names: vec![create.name.clone()],
                if_exists: true,
                temporary: create.temporary,
            }
            .to_string(),
        ),
        Statement::RenameTable(rename) => {
            let pairs = rename
                .pairs
                .iter()
                .rev()
                .map(|(from, to)| (to.clone(), from.clone()))
                .collect();
            Reversal::Reversed(RenameTable { pairs }.to_string())
        }
        Statement::DropDatabase { .. } => Reversal::NotReversible(NotReversible::DropDatabase),
        Statement::DropTable(_) => Reversal::NotReversible(NotReversible::DropTable),
        Statement::Truncate(_) => Reversal::NotReversible(NotReversible::TruncateTable),
        Statement::DropView { .. } => Reversal::NotReversible(NotReversible::DropView),
        Statement::CreateView { name, .. } => {
            Reversal::Reversed(format!("DROP VIEW IF EXISTS {}", quote_ident(name)))
        }
        Statement::CreateIndex(index) => Reversal::Reversed(
            DropIndex {
                name: index.name.clone(),
                table: index.table.clone(),
            }
            .to_string(),
        ),
        Statement::DropIndex(drop) => {
            if drop.name.eq_ignore_ascii_case("PRIMARY") {
                return Ok(Reversal::NotReversible(NotReversible::DropPrimaryIndex));
            }
            let snapshot = require_snapshot(snapshot, &drop.table)?.normalized();
            let constraint = find_constraint(&snapshot, &drop.name)?;
            Reversal::Reversed(
                AlterTable {
                    name: drop.table.clone(),
                    specs: vec![AlterSpec::AddConstraint(constraint.clone())],
                }
                .to_string(),
            )
        }
        Statement::AlterTable(alter) => reverse_alter(snapshot, alter)?,
        Statement::CreateDatabase { .. }
        | Statement::AlterDatabase { .. }
        | Statement::Insert(_)
        | Statement::Update(_)
        | Statement::Delete { .. }
        | Statement::Select
        | Statement::Show
        | Statement::Set
        | Statement::Transaction(_)
        | Statement::Other { .. } => Reversal::NoReversal,
    };
    Ok(reversal)
}

/// `DROP TABLE IF EXISTS` for each table, in reverse creation order.
pub fn drop_tables_reversal<'a>(tables: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut names: Vec<&str> = tables.into_iter().collect();
    names.reverse();
    names
        .into_iter()
        .map(|name| {
            DropTable {
                names: vec![name.to_string()],
                if_exists: true,
                temporary: false,
            }
            .to_string()
        })
        .collect()
}

fn require_snapshot<'a>(
    snapshot: Option<&'a CreateTable>,
    table: &str,
) -> SqlResult<&'a CreateTable> {
    let snapshot = snapshot.ok_or_else(|| SqlError::MissingSnapshot(table.to_string()))?;
    if !snapshot.name.eq_ignore_ascii_case(table) {
        return Err(SqlError::SnapshotMismatch {
            table: table.to_string(),
            snapshot: snapshot.name.clone(),
        });
    }
    Ok(snapshot)
}

fn find_constraint<'a>(snapshot: &'a CreateTable, name: &str) -> SqlResult<&'a Constraint> {
    snapshot
        .constraint(name)
        .ok_or_else(|| SqlError::UnknownIndex {
            table: snapshot.name.clone(),
            index: name.to_string(),
        })
}

fn find_column<'a>(snapshot: &'a CreateTable, name: &str) -> SqlResult<&'a ColumnDef> {
    snapshot
        .column(name)
        .ok_or_else(|| SqlError::UnknownColumn {
            table: snapshot.name.clone(),
            column: name.to_string(),
        })
}

fn reverse_alter(snapshot: Option<&CreateTable>, alter: &AlterTable) -> SqlResult<Reversal> {
    // Snapshot taken from inline keys is normalized so indexes can be found by name
    if let Some(s) = snapshot {
        require_snapshot(Some(s), &alter.name)?;
    }
    let normalized = snapshot.map(|s| s.normalized());
    let snapshot = normalized.as_ref();
    let table = alter.name.as_str();

    let mut target = alter.name.clone();
    let mut reverse = Vec::new();

    for spec in &alter.specs {
        let undo = match spec {
            AlterSpec::Options(options) => {
                let snapshot = require_snapshot(snapshot, table)?;
                let mut previous = Vec::new();
                for option in options {
                    if option.name == "AUTO_INCREMENT" {
                        continue;
                    }
                    match snapshot.option(&option.name) {
                        Some(old) => previous.push(old.clone()),
                        None if option.name == "COMMENT" => previous
                            .push(TableOption::new("COMMENT", Expr::String(String::new()))),
                        // Undeclared before, so the server default was in effect and
                        // there is no value to name; the new option stays in place
                        None => {}
                    }
                }
                if previous.is_empty() {
                    continue;
                }
                AlterSpec::Options(previous)
            }
            AlterSpec::AddColumns { columns, .. } => {
                for column in columns {
                    reverse.push(AlterSpec::DropColumn(column.name.clone()));
                }
                continue;
            }
            AlterSpec::AddConstraint(constraint) => match &constraint.kind {
                ConstraintKind::PrimaryKey => AlterSpec::DropPrimaryKey,
                ConstraintKind::ForeignKey(_) => match &constraint.name {
                    Some(name) => AlterSpec::DropForeignKey(name.clone()),
                    None => return Ok(Reversal::NotReversible(NotReversible::UnnamedForeignKey)),
                },
                ConstraintKind::Check(_) => match &constraint.name {
                    Some(name) => AlterSpec::DropCheck(name.clone()),
                    None => return Ok(Reversal::NotReversible(NotReversible::UnnamedCheck)),
                },
                _ => {
                    let name = match (&constraint.name, constraint.columns.first()) {
                        (Some(name), _) => name.clone(),
                        (None, Some(first)) => match snapshot {
                            Some(s) => s.free_index_name(&first.column),
                            None => first.column.clone(),
                        },
                        (None, None) => continue,
                    };
                    AlterSpec::DropIndex(name)
                }
            },
            AlterSpec::DropIndex(name) => {
                if name.eq_ignore_ascii_case("PRIMARY") {
                    return Ok(Reversal::NotReversible(NotReversible::DropPrimaryIndex));
                }
                let snapshot = require_snapshot(snapshot, table)?;
                AlterSpec::AddConstraint(find_constraint(snapshot, name)?.clone())
            }
            AlterSpec::ModifyColumn { column, .. } => {
                let snapshot = require_snapshot(snapshot, table)?;
                AlterSpec::ModifyColumn {
                    column: find_column(snapshot, &column.name)?.without_keys(),
                    position: None,
                }
            }
            AlterSpec::ChangeColumn {
                old_name, column, ..
            } => {
                let snapshot = require_snapshot(snapshot, table)?;
                AlterSpec::ChangeColumn {
                    old_name: column.name.clone(),
                    column: find_column(snapshot, old_name)?.without_keys(),
                    position: None,
                }
            }
            AlterSpec::AlterColumn { name, action } => match action {
                AlterColumnAction::SetVisible(_) => {
                    return Ok(Reversal::NotReversible(NotReversible::ColumnVisibility))
                }
                AlterColumnAction::SetDefault(_) | AlterColumnAction::DropDefault => {
                    let snapshot = require_snapshot(snapshot, table)?;
                    AlterSpec::ModifyColumn {
                        column: find_column(snapshot, name)?.without_keys(),
                        position: None,
                    }
                }
            },
            AlterSpec::RenameColumn { old_name, new_name } => AlterSpec::RenameColumn {
                old_name: new_name.clone(),
                new_name: old_name.clone(),
            },
            AlterSpec::RenameTable(new_name) => {
                target = new_name.clone();
                AlterSpec::RenameTable(alter.name.clone())
            }
            AlterSpec::RenameIndex { old_name, new_name } => AlterSpec::RenameIndex {
                old_name: new_name.clone(),
                new_name: old_name.clone(),
            },
            other => return Ok(Reversal::NotReversible(declined(other))),
        };
        reverse.push(undo);
    }

    if reverse.is_empty() {
        return Ok(Reversal::NoReversal);
    }
    reverse.reverse();
    Ok(Reversal::Reversed(
        AlterTable {
            name: target,
            specs: reverse,
        }
        .to_string(),
    ))
}

fn declined(spec: &AlterSpec) -> NotReversible {
    match spec {
        AlterSpec::DropColumn(_) => NotReversible::DropColumn,
        AlterSpec::DropPrimaryKey => NotReversible::DropPrimaryKey,
        AlterSpec::DropForeignKey(_) => NotReversible::DropForeignKey,
        AlterSpec::DropCheck(_) => NotReversible::DropCheck,
        AlterSpec::ConvertCharset { .. } => NotReversible::ConvertCharset,
        AlterSpec::Lock(_) => NotReversible::Lock,
        AlterSpec::Algorithm(_) => NotReversible::Algorithm,
        AlterSpec::Force => NotReversible::Force,
        AlterSpec::Partition(_) => NotReversible::Partition,
        AlterSpec::Keys { .. } => NotReversible::Keys,
        AlterSpec::Tablespace(_) => NotReversible::Tablespace,
        AlterSpec::CheckEnforcement { .. } => NotReversible::CheckEnforcement,
        AlterSpec::Validation(_) => NotReversible::Validation,
        AlterSpec::OrderBy(_) => NotReversible::OrderBy,
        AlterSpec::IndexVisibility { .. } => NotReversible::IndexVisibility,
        AlterSpec::SecondaryLoad => NotReversible::SecondaryLoad,
        AlterSpec::SecondaryUnload => NotReversible::SecondaryUnload,
        // Reversible specifications are handled by the caller
        AlterSpec::Options(_)
        | AlterSpec::AddColumns { .. }
        | AlterSpec::AddConstraint(_)
        | AlterSpec::DropIndex(_)
        | AlterSpec::ModifyColumn { .. }
        | AlterSpec::ChangeColumn { .. }
        | AlterSpec::AlterColumn { .. }
        | AlterSpec::RenameColumn { .. }
        | AlterSpec::RenameTable(_)
        | AlterSpec::RenameIndex { .. } => NotReversible::Force,
    }
}

#[cfg(test)]
#[path = "reverser_test.rs"]
mod tests;

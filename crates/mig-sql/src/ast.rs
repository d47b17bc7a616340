//! Statement model for the MySQL DDL/DML subset used by migration scripts.
//!
//! Statements form a closed enum so reversal and linting are exhaustive
//! matches. DDL nodes render back to executable MySQL through `Display`
//! (upper-case keywords, back-quoted names, single-quoted strings).

use crate::dialect::{quote_ident, quote_string};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed statement with its source text and 1-based start line.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementNode {
    pub statement: Statement,
    pub text: String,
    pub line: usize,
}

impl StatementNode {
    /// Kind of the wrapped statement.
    pub fn kind(&self) -> StatementKind {
        self.statement.kind()
    }
}

/// One SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTable),
    AlterTable(AlterTable),
    DropTable(DropTable),
    RenameTable(RenameTable),
    CreateIndex(CreateIndex),
    DropIndex(DropIndex),
    Truncate(Truncate),
    CreateDatabase { name: String, if_not_exists: bool },
    AlterDatabase { name: String },
    DropDatabase { name: String, if_exists: bool },
    CreateView { name: String, or_replace: bool },
    DropView { names: Vec<String>, if_exists: bool },
    Insert(Insert),
    Update(Update),
    Delete { table: String },
    Select,
    Show,
    /// Session/system variable assignment.
    Set,
    Transaction(TransactionKind),
    /// Anything else (procedures, triggers, grants, USE, LOCK TABLES ...).
    Other { keyword: String },
}

impl Statement {
    /// Kind of the statement, as named in lint configuration.
    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::CreateTable(_) => StatementKind::CreateTable,
            Statement::AlterTable(_) => StatementKind::AlterTable,
            Statement::DropTable(_) => StatementKind::DropTable,
            Statement::RenameTable(_) => StatementKind::RenameTable,
            Statement::CreateIndex(_) => StatementKind::CreateIndex,
            Statement::DropIndex(_) => StatementKind::DropIndex,
            Statement::Truncate(_) => StatementKind::TruncateTable,
            Statement::CreateDatabase { .. } => StatementKind::CreateDatabase,
            Statement::AlterDatabase { .. } => StatementKind::AlterDatabase,
            Statement::DropDatabase { .. } => StatementKind::DropDatabase,
            Statement::CreateView { .. } => StatementKind::CreateView,
            Statement::DropView { .. } => StatementKind::DropView,
            Statement::Insert(i) if i.replace => StatementKind::Replace,
            Statement::Insert(_) => StatementKind::Insert,
            Statement::Update(_) => StatementKind::Update,
            Statement::Delete { .. } => StatementKind::Delete,
            Statement::Select => StatementKind::Select,
            Statement::Show => StatementKind::Show,
            Statement::Set => StatementKind::Set,
            Statement::Transaction(_) => StatementKind::Transaction,
            Statement::Other { .. } => StatementKind::Other,
        }
    }

    /// Schema-changing statement.
    pub fn is_ddl(&self) -> bool {
        self.kind().is_ddl()
    }

    /// Data statement.
    pub fn is_dml(&self) -> bool {
        self.kind().is_dml()
    }

    /// Table the statement targets, when there is exactly one.
    pub fn target_table(&self) -> Option<&str> {
        match self {
            Statement::CreateTable(c) => Some(&c.name),
            Statement::AlterTable(a) => Some(&a.name),
            Statement::CreateIndex(c) => Some(&c.table),
            Statement::DropIndex(d) => Some(&d.table),
            Statement::Truncate(t) => Some(&t.table),
            Statement::Insert(i) => Some(&i.table),
            Statement::Update(u) => Some(&u.table),
            Statement::Delete { table } => Some(table),
            _ => None,
        }
    }
}

/// Statement kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    CreateTable,
    AlterTable,
    DropTable,
    RenameTable,
    CreateIndex,
    DropIndex,
    TruncateTable,
    CreateDatabase,
    AlterDatabase,
    DropDatabase,
    CreateView,
    DropView,
    Insert,
    Replace,
    Update,
    Delete,
    Select,
    Show,
    Set,
    Transaction,
    Other,
}

impl StatementKind {
    pub fn is_ddl(self) -> bool {
        matches!(
            self,
            StatementKind::CreateTable
                | StatementKind::AlterTable
                | StatementKind::DropTable
                | StatementKind::RenameTable
                | StatementKind::CreateIndex
                | StatementKind::DropIndex
                | StatementKind::TruncateTable
                | StatementKind::CreateDatabase
                | StatementKind::AlterDatabase
                | StatementKind::DropDatabase
                | StatementKind::CreateView
                | StatementKind::DropView
        )
    }

    pub fn is_dml(self) -> bool {
        matches!(
            self,
            StatementKind::Insert
                | StatementKind::Replace
                | StatementKind::Update
                | StatementKind::Delete
                | StatementKind::Select
                | StatementKind::Show
        )
    }

    /// Configuration name (snake_case).
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::CreateTable => "create_table",
            StatementKind::AlterTable => "alter_table",
            StatementKind::DropTable => "drop_table",
            StatementKind::RenameTable => "rename_table",
            StatementKind::CreateIndex => "create_index",
            StatementKind::DropIndex => "drop_index",
            StatementKind::TruncateTable => "truncate_table",
            StatementKind::CreateDatabase => "create_database",
            StatementKind::AlterDatabase => "alter_database",
            StatementKind::DropDatabase => "drop_database",
            StatementKind::CreateView => "create_view",
            StatementKind::DropView => "drop_view",
            StatementKind::Insert => "insert",
            StatementKind::Replace => "replace",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::Select => "select",
            StatementKind::Show => "show",
            StatementKind::Set => "set",
            StatementKind::Transaction => "transaction",
            StatementKind::Other => "other",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction-control statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Begin,
    Commit,
    Rollback,
    Savepoint,
    Release,
    SetTransaction,
}

/// CREATE TABLE.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateTable {
    pub name: String,
    pub temporary: bool,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<Constraint>,
    pub options: Vec<TableOption>,
    /// `CREATE TABLE t LIKE source`
    pub like: Option<String>,
}

impl CreateTable {
    /// Column by name, case-insensitively.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub(crate) fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Constraint by name, case-insensitively. `PRIMARY` finds the primary key.
    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.has_name(name))
    }

    /// Table option by normalized name.
    pub fn option(&self, name: &str) -> Option<&TableOption> {
        self.options
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case(name))
    }

    /// Table charset, if declared.
    pub fn charset(&self) -> Option<&str> {
        self.option("CHARSET").map(|o| o.value.text())
    }

    /// Copy with inline column keys moved to table level and unnamed
    /// indexes named the way MySQL names them.
    pub fn normalized(&self) -> CreateTable {
        let mut out = self.clone();
        let mut inline = Vec::new();
        for column in &mut out.columns {
            inline.extend(column.take_inline_keys());
        }
        let mut constraints = std::mem::take(&mut out.constraints);
        for c in inline {
            // Inline PRIMARY KEY next to a table-level one is invalid SQL; keep the first
            if c.kind == ConstraintKind::PrimaryKey
                && constraints
                    .iter()
                    .any(|e| e.kind == ConstraintKind::PrimaryKey)
            {
                continue;
            }
            constraints.push(c);
        }
        for c in constraints {
            out.add_constraint(c);
        }
        out
    }

    /// Add a constraint, generating the MySQL default name for unnamed indexes.
    pub(crate) fn add_constraint(&mut self, mut constraint: Constraint) {
        if constraint.name.is_none() && constraint.kind.is_index() {
            if let Some(first) = constraint.columns.first() {
                constraint.name = Some(self.free_index_name(&first.column));
            }
        }
        // Primary key columns are implicitly NOT NULL
        if constraint.kind == ConstraintKind::PrimaryKey {
            for part in &constraint.columns {
                if let Some(i) = self.column_index(&part.column) {
                    self.columns[i].nullable = Some(false);
                }
            }
        }
        self.constraints.push(constraint);
    }

    pub(crate) fn free_index_name(&self, base: &str) -> String {
        if self.constraint(base).is_none() {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", base, n);
            if self.constraint(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }
}

impl fmt::Display for CreateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CREATE ")?;
        if self.temporary {
            write!(f, "TEMPORARY ")?;
        }
        write!(f, "TABLE ")?;
        if self.if_not_exists {
            write!(f, "IF NOT EXISTS ")?;
        }
        write!(f, "{}", quote_ident(&self.name))?;
        if let Some(like) = &self.like {
            return write!(f, " LIKE {}", quote_ident(like));
        }
        write!(f, " (")?;
        let mut first = true;
        for column in &self.columns {
            if !first {
                write!(f, ",")?;
            }
            first = false;
            write!(f, "\n  {}", column)?;
        }
        for constraint in &self.constraints {
            if !first {
                write!(f, ",")?;
            }
            first = false;
            write!(f, "\n  {}", constraint)?;
        }
        write!(f, "\n)")?;
        for option in &self.options {
            write!(f, " {}", option)?;
        }
        Ok(())
    }
}

/// Column definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    /// `Some(true)` for explicit NULL, `Some(false)` for NOT NULL.
    pub nullable: Option<bool>,
    pub default: Option<Expr>,
    pub on_update: Option<Expr>,
    pub auto_increment: bool,
    /// Inline `PRIMARY KEY`.
    pub primary_key: bool,
    /// Inline `UNIQUE [KEY]`.
    pub unique: bool,
    pub comment: Option<String>,
    pub charset: Option<String>,
    pub collate: Option<String>,
}

impl ColumnDef {
    pub fn is_not_null(&self) -> bool {
        self.nullable == Some(false) || self.primary_key
    }

    /// Copy without inline key flags, for MODIFY/CHANGE rendering.
    pub fn without_keys(&self) -> ColumnDef {
        ColumnDef {
            primary_key: false,
            unique: false,
            ..self.clone()
        }
    }

    fn take_inline_keys(&mut self) -> Vec<Constraint> {
        let mut out = Vec::new();
        let part = vec![KeyPart::new(&self.name)];
        if self.primary_key {
            self.primary_key = false;
            self.nullable = Some(false);
            out.push(Constraint::new(None, ConstraintKind::PrimaryKey, part.clone()));
        }
        if self.unique {
            self.unique = false;
            out.push(Constraint::new(None, ConstraintKind::Unique, part));
        }
        out
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", quote_ident(&self.name), self.data_type)?;
        if let Some(charset) = &self.charset {
            write!(f, " CHARACTER SET {}", charset)?;
        }
        if let Some(collate) = &self.collate {
            write!(f, " COLLATE {}", collate)?;
        }
        match self.nullable {
            Some(false) => write!(f, " NOT NULL")?,
            Some(true) => write!(f, " NULL")?,
            None => {}
        }
        if let Some(default) = &self.default {
            write!(f, " DEFAULT {}", default)?;
        }
        if let Some(on_update) = &self.on_update {
            write!(f, " ON UPDATE {}", on_update)?;
        }
        if self.auto_increment {
            write!(f, " AUTO_INCREMENT")?;
        }
        if self.unique {
            write!(f, " UNIQUE KEY")?;
        }
        if self.primary_key {
            write!(f, " PRIMARY KEY")?;
        }
        if let Some(comment) = &self.comment {
            write!(f, " COMMENT {}", quote_string(comment))?;
        }
        Ok(())
    }
}

/// Column data type. `name` is upper-case; `args` hold literal text
/// (`10`, `2`, `'a'`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataType {
    pub name: String,
    pub args: Vec<String>,
    pub unsigned: bool,
    pub zerofill: bool,
}

impl DataType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            ..Default::default()
        }
    }

    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Name with aliases folded (INTEGER -> INT, NUMERIC -> DECIMAL ...).
    pub fn canonical_name(&self) -> &str {
        match self.name.as_str() {
            "INTEGER" => "INT",
            "NUMERIC" | "DEC" | "FIXED" => "DECIMAL",
            "BOOL" | "BOOLEAN" => "TINYINT",
            "DOUBLE PRECISION" | "FLOAT8" => "DOUBLE",
            "CHARACTER" => "CHAR",
            "INT1" => "TINYINT",
            "INT2" => "SMALLINT",
            "INT3" | "MIDDLEINT" => "MEDIUMINT",
            "INT4" => "INT",
            "INT8" => "BIGINT",
            other => other,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.canonical_name(),
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT"
        )
    }

    pub fn is_text(&self) -> bool {
        matches!(
            self.canonical_name(),
            "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "JSON"
        )
    }

    pub fn is_blob(&self) -> bool {
        matches!(
            self.canonical_name(),
            "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB"
        )
    }

    /// First numeric argument (length or precision).
    pub fn length(&self) -> Option<u32> {
        self.args.first().and_then(|a| a.parse().ok())
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "({})", self.args.join(","))?;
        }
        if self.unsigned {
            write!(f, " UNSIGNED")?;
        }
        if self.zerofill {
            write!(f, " ZEROFILL")?;
        }
        Ok(())
    }
}

/// Literal-ish expression used for defaults and option values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Null,
    Number(String),
    String(String),
    Bool(bool),
    /// `CURRENT_TIMESTAMP[(fsp)]`, also `NOW()` and `LOCALTIMESTAMP`.
    CurrentTimestamp(Option<u32>),
    /// Keyword or parenthesized expression, rendered as written.
    Raw(String),
}

impl Expr {
    /// Text used for comparison; quoting is not significant.
    pub fn text(&self) -> &str {
        match self {
            Expr::Null => "NULL",
            Expr::Number(n) => n,
            Expr::String(s) => s,
            Expr::Bool(true) => "1",
            Expr::Bool(false) => "0",
            Expr::CurrentTimestamp(_) => "CURRENT_TIMESTAMP",
            Expr::Raw(r) => r,
        }
    }

    pub fn is_current_timestamp(&self) -> bool {
        matches!(self, Expr::CurrentTimestamp(_))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Null => write!(f, "NULL"),
            Expr::Number(n) => write!(f, "{}", n),
            Expr::String(s) => write!(f, "{}", quote_string(s)),
            Expr::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Expr::CurrentTimestamp(None) => write!(f, "CURRENT_TIMESTAMP"),
            Expr::CurrentTimestamp(Some(p)) => write!(f, "CURRENT_TIMESTAMP({})", p),
            Expr::Raw(r) => write!(f, "{}", r),
        }
    }
}

/// One column of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPart {
    pub column: String,
    /// Prefix length.
    pub length: Option<u32>,
}

impl KeyPart {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            length: None,
        }
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote_ident(&self.column))?;
        if let Some(len) = self.length {
            write!(f, "({})", len)?;
        }
        Ok(())
    }
}

/// Table-level key or constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub name: Option<String>,
    pub kind: ConstraintKind,
    pub columns: Vec<KeyPart>,
    pub using: Option<String>,
    pub comment: Option<String>,
}

impl Constraint {
    pub fn new(name: Option<String>, kind: ConstraintKind, columns: Vec<KeyPart>) -> Self {
        Self {
            name,
            kind,
            columns,
            using: None,
            comment: None,
        }
    }

    /// Name match; the primary key answers to `PRIMARY`.
    pub fn has_name(&self, name: &str) -> bool {
        if self.kind == ConstraintKind::PrimaryKey {
            return name.eq_ignore_ascii_case("PRIMARY");
        }
        self.name
            .as_deref()
            .is_some_and(|n| n.eq_ignore_ascii_case(name))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|p| p.column.as_str()).collect()
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().map(quote_ident);
        let parts = self
            .columns
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        match &self.kind {
            ConstraintKind::PrimaryKey => write!(f, "PRIMARY KEY ({})", parts)?,
            ConstraintKind::Unique
            | ConstraintKind::Index
            | ConstraintKind::Fulltext
            | ConstraintKind::Spatial => {
                let keyword = match self.kind {
                    ConstraintKind::Unique => "UNIQUE KEY",
                    ConstraintKind::Fulltext => "FULLTEXT KEY",
                    ConstraintKind::Spatial => "SPATIAL KEY",
                    _ => "KEY",
                };
                write!(f, "{}", keyword)?;
                if let Some(name) = &name {
                    write!(f, " {}", name)?;
                }
                write!(f, " ({})", parts)?;
            }
            ConstraintKind::ForeignKey(fk) => {
                if let Some(name) = &name {
                    write!(f, "CONSTRAINT {} ", name)?;
                }
                let refs = fk
                    .columns
                    .iter()
                    .map(|c| quote_ident(c))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "FOREIGN KEY ({}) REFERENCES {} ({})",
                    parts,
                    quote_ident(&fk.table),
                    refs
                )?;
                if let Some(action) = &fk.on_delete {
                    write!(f, " ON DELETE {}", action)?;
                }
                if let Some(action) = &fk.on_update {
                    write!(f, " ON UPDATE {}", action)?;
                }
            }
            ConstraintKind::Check(expr) => {
                if let Some(name) = &name {
                    write!(f, "CONSTRAINT {} ", name)?;
                }
                write!(f, "CHECK ({})", expr)?;
            }
        }
        if let Some(using) = &self.using {
            write!(f, " USING {}", using)?;
        }
        if let Some(comment) = &self.comment {
            write!(f, " COMMENT {}", quote_string(comment))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    Index,
    Fulltext,
    Spatial,
    ForeignKey(ForeignKeyRef),
    /// Check expression as written.
    Check(String),
}

impl ConstraintKind {
    /// Kinds backed by an index that MySQL names after the first column.
    pub fn is_index(&self) -> bool {
        matches!(
            self,
            ConstraintKind::Unique
                | ConstraintKind::Index
                | ConstraintKind::Fulltext
                | ConstraintKind::Spatial
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    pub table: String,
    pub columns: Vec<String>,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
}

/// Table option. Names are normalized: `CHARACTER SET`/`DEFAULT CHARSET`
/// become `CHARSET`, `DEFAULT COLLATE` becomes `COLLATE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOption {
    pub name: String,
    pub value: Expr,
}

impl TableOption {
    pub fn new(name: impl Into<String>, value: Expr) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl fmt::Display for TableOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name.as_str() {
            "CHARSET" => write!(f, "DEFAULT CHARSET={}", self.value),
            "COLLATE" => write!(f, "COLLATE={}", self.value),
            name => write!(f, "{}={}", name, self.value),
        }
    }
}

/// ALTER TABLE.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterTable {
    pub name: String,
    pub specs: Vec<AlterSpec>,
}

impl fmt::Display for AlterTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ALTER TABLE {}", quote_ident(&self.name))?;
        for (i, spec) in self.specs.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {}", spec)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnPosition {
    First,
    After(String),
}

impl fmt::Display for ColumnPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnPosition::First => write!(f, "FIRST"),
            ColumnPosition::After(c) => write!(f, "AFTER {}", quote_ident(c)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlterColumnAction {
    SetDefault(Expr),
    DropDefault,
    SetVisible(bool),
}

/// One ALTER TABLE specification.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterSpec {
    Options(Vec<TableOption>),
    AddColumns {
        columns: Vec<ColumnDef>,
        position: Option<ColumnPosition>,
    },
    AddConstraint(Constraint),
    DropColumn(String),
    DropPrimaryKey,
    DropIndex(String),
    DropForeignKey(String),
    /// `DROP CHECK` / `DROP CONSTRAINT`.
    DropCheck(String),
    ModifyColumn {
        column: ColumnDef,
        position: Option<ColumnPosition>,
    },
    ChangeColumn {
        old_name: String,
        column: ColumnDef,
        position: Option<ColumnPosition>,
    },
    AlterColumn {
        name: String,
        action: AlterColumnAction,
    },
    RenameColumn {
        old_name: String,
        new_name: String,
    },
    RenameTable(String),
    RenameIndex {
        old_name: String,
        new_name: String,
    },
    ConvertCharset {
        charset: String,
        collate: Option<String>,
    },
    Lock(String),
    Algorithm(String),
    Force,
    /// Any partition-management clause, as written.
    Partition(String),
    Keys {
        enable: bool,
    },
    /// `DISCARD|IMPORT TABLESPACE`, as written.
    Tablespace(String),
    /// `ALTER CHECK|CONSTRAINT name [NOT] ENFORCED`.
    CheckEnforcement {
        name: String,
        enforced: bool,
    },
    Validation(bool),
    OrderBy(Vec<String>),
    IndexVisibility {
        name: String,
        visible: bool,
    },
    SecondaryLoad,
    SecondaryUnload,
}

impl AlterSpec {
    pub fn kind(&self) -> AlterSpecKind {
        match self {
            AlterSpec::Options(_) => AlterSpecKind::TableOptions,
            AlterSpec::AddColumns { .. } => AlterSpecKind::AddColumns,
            AlterSpec::AddConstraint(_) => AlterSpecKind::AddConstraint,
            AlterSpec::DropColumn(_) => AlterSpecKind::DropColumn,
            AlterSpec::DropPrimaryKey => AlterSpecKind::DropPrimaryKey,
            AlterSpec::DropIndex(_) => AlterSpecKind::DropIndex,
            AlterSpec::DropForeignKey(_) => AlterSpecKind::DropForeignKey,
            AlterSpec::DropCheck(_) => AlterSpecKind::DropCheck,
            AlterSpec::ModifyColumn { .. } => AlterSpecKind::ModifyColumn,
            AlterSpec::ChangeColumn { .. } => AlterSpecKind::ChangeColumn,
            AlterSpec::AlterColumn { .. } => AlterSpecKind::AlterColumn,
            AlterSpec::RenameColumn { .. } => AlterSpecKind::RenameColumn,
            AlterSpec::RenameTable(_) => AlterSpecKind::RenameTable,
            AlterSpec::RenameIndex { .. } => AlterSpecKind::RenameIndex,
            AlterSpec::ConvertCharset { .. } => AlterSpecKind::ConvertCharset,
            AlterSpec::Lock(_) => AlterSpecKind::Lock,
            AlterSpec::Algorithm(_) => AlterSpecKind::Algorithm,
            AlterSpec::Force => AlterSpecKind::Force,
            AlterSpec::Partition(_) => AlterSpecKind::Partition,
            AlterSpec::Keys { .. } => AlterSpecKind::Keys,
            AlterSpec::Tablespace(_) => AlterSpecKind::Tablespace,
            AlterSpec::CheckEnforcement { .. } => AlterSpecKind::CheckEnforcement,
            AlterSpec::Validation(_) => AlterSpecKind::Validation,
            AlterSpec::OrderBy(_) => AlterSpecKind::OrderBy,
            AlterSpec::IndexVisibility { .. } => AlterSpecKind::IndexVisibility,
            AlterSpec::SecondaryLoad => AlterSpecKind::SecondaryLoad,
            AlterSpec::SecondaryUnload => AlterSpecKind::SecondaryUnload,
        }
    }
}

fn write_position(f: &mut fmt::Formatter<'_>, position: &Option<ColumnPosition>) -> fmt::Result {
    match position {
        Some(p) => write!(f, " {}", p),
        None => Ok(()),
    }
}

impl fmt::Display for AlterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlterSpec::Options(options) => {
                let rendered: Vec<String> = options.iter().map(|o| o.to_string()).collect();
                write!(f, "{}", rendered.join(" "))
            }
            AlterSpec::AddColumns { columns, position } => {
                if columns.len() == 1 {
                    write!(f, "ADD COLUMN {}", columns[0])?;
                    write_position(f, position)
                } else {
                    let rendered: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
                    write!(f, "ADD COLUMN ({})", rendered.join(", "))
                }
            }
            AlterSpec::AddConstraint(c) => write!(f, "ADD {}", c),
            AlterSpec::DropColumn(name) => write!(f, "DROP COLUMN {}", quote_ident(name)),
            AlterSpec::DropPrimaryKey => write!(f, "DROP PRIMARY KEY"),
            AlterSpec::DropIndex(name) => write!(f, "DROP INDEX {}", quote_ident(name)),
            AlterSpec::DropForeignKey(name) => write!(f, "DROP FOREIGN KEY {}", quote_ident(name)),
            AlterSpec::DropCheck(name) => write!(f, "DROP CHECK {}", quote_ident(name)),
            AlterSpec::ModifyColumn { column, position } => {
                write!(f, "MODIFY COLUMN {}", column)?;
                write_position(f, position)
            }
            AlterSpec::ChangeColumn {
                old_name,
                column,
                position,
            } => {
                write!(f, "CHANGE COLUMN {} {}", quote_ident(old_name), column)?;
                write_position(f, position)
            }
            AlterSpec::AlterColumn { name, action } => {
                write!(f, "ALTER COLUMN {} ", quote_ident(name))?;
                match action {
                    AlterColumnAction::SetDefault(e) => write!(f, "SET DEFAULT {}", e),
                    AlterColumnAction::DropDefault => write!(f, "DROP DEFAULT"),
                    AlterColumnAction::SetVisible(true) => write!(f, "SET VISIBLE"),
                    AlterColumnAction::SetVisible(false) => write!(f, "SET INVISIBLE"),
                }
            }
            AlterSpec::RenameColumn { old_name, new_name } => write!(
                f,
                "RENAME COLUMN {} TO {}",
                quote_ident(old_name),
                quote_ident(new_name)
            ),
            AlterSpec::RenameTable(name) => write!(f, "RENAME TO {}", quote_ident(name)),
            AlterSpec::RenameIndex { old_name, new_name } => write!(
                f,
                "RENAME INDEX {} TO {}",
                quote_ident(old_name),
                quote_ident(new_name)
            ),
            AlterSpec::ConvertCharset { charset, collate } => {
                write!(f, "CONVERT TO CHARACTER SET {}", charset)?;
                if let Some(collate) = collate {
                    write!(f, " COLLATE {}", collate)?;
                }
                Ok(())
            }
            AlterSpec::Lock(v) => write!(f, "LOCK={}", v),
            AlterSpec::Algorithm(v) => write!(f, "ALGORITHM={}", v),
            AlterSpec::Force => write!(f, "FORCE"),
            AlterSpec::Partition(raw) | AlterSpec::Tablespace(raw) => write!(f, "{}", raw),
            AlterSpec::Keys { enable } => {
                write!(f, "{} KEYS", if *enable { "ENABLE" } else { "DISABLE" })
            }
            AlterSpec::CheckEnforcement { name, enforced } => write!(
                f,
                "ALTER CHECK {} {}ENFORCED",
                quote_ident(name),
                if *enforced { "" } else { "NOT " }
            ),
            AlterSpec::Validation(with) => {
                write!(f, "{} VALIDATION", if *with { "WITH" } else { "WITHOUT" })
            }
            AlterSpec::OrderBy(cols) => {
                let rendered: Vec<String> = cols.iter().map(|c| quote_ident(c)).collect();
                write!(f, "ORDER BY {}", rendered.join(", "))
            }
            AlterSpec::IndexVisibility { name, visible } => write!(
                f,
                "ALTER INDEX {} {}",
                quote_ident(name),
                if *visible { "VISIBLE" } else { "INVISIBLE" }
            ),
            AlterSpec::SecondaryLoad => write!(f, "SECONDARY_LOAD"),
            AlterSpec::SecondaryUnload => write!(f, "SECONDARY_UNLOAD"),
        }
    }
}

/// ALTER TABLE specification kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlterSpecKind {
    TableOptions,
    AddColumns,
    AddConstraint,
    DropColumn,
    DropPrimaryKey,
    DropIndex,
    DropForeignKey,
    DropCheck,
    ModifyColumn,
    ChangeColumn,
    AlterColumn,
    RenameColumn,
    RenameTable,
    RenameIndex,
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

impl AlterSpecKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AlterSpecKind::TableOptions => "table_options",
            AlterSpecKind::AddColumns => "add_columns",
            AlterSpecKind::AddConstraint => "add_constraint",
            AlterSpecKind::DropColumn => "drop_column",
            AlterSpecKind::DropPrimaryKey => "drop_primary_key",
            AlterSpecKind::DropIndex => "drop_index",
            AlterSpecKind::DropForeignKey => "drop_foreign_key",
            AlterSpecKind::DropCheck => "drop_check",
            AlterSpecKind::ModifyColumn => "modify_column",
            AlterSpecKind::ChangeColumn => "change_column",
            AlterSpecKind::AlterColumn => "alter_column",
            AlterSpecKind::RenameColumn => "rename_column",
            AlterSpecKind::RenameTable => "rename_table",
            AlterSpecKind::RenameIndex => "rename_index",
            AlterSpecKind::ConvertCharset => "convert_charset",
            AlterSpecKind::Lock => "lock",
            AlterSpecKind::Algorithm => "algorithm",
            AlterSpecKind::Force => "force",
            AlterSpecKind::Partition => "partition",
            AlterSpecKind::Keys => "keys",
            AlterSpecKind::Tablespace => "tablespace",
            AlterSpecKind::CheckEnforcement => "check_enforcement",
            AlterSpecKind::Validation => "validation",
            AlterSpecKind::OrderBy => "order_by",
            AlterSpecKind::IndexVisibility => "index_visibility",
            AlterSpecKind::SecondaryLoad => "secondary_load",
            AlterSpecKind::SecondaryUnload => "secondary_unload",
        }
    }
}

impl fmt::Display for AlterSpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTable {
    pub names: Vec<String>,
    pub if_exists: bool,
    pub temporary: bool,
}

impl fmt::Display for DropTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DROP ")?;
        if self.temporary {
            write!(f, "TEMPORARY ")?;
        }
        write!(f, "TABLE ")?;
        if self.if_exists {
            write!(f, "IF EXISTS ")?;
        }
        let names: Vec<String> = self.names.iter().map(|n| quote_ident(n)).collect();
        write!(f, "{}", names.join(", "))
    }
}

/// `RENAME TABLE a TO b, c TO d`, applied left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameTable {
    pub pairs: Vec<(String, String)>,
}

impl fmt::Display for RenameTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .pairs
            .iter()
            .map(|(from, to)| format!("{} TO {}", quote_ident(from), quote_ident(to)))
            .collect();
        write!(f, "RENAME TABLE {}", pairs.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIndex {
    pub name: String,
    pub table: String,
    pub kind: ConstraintKind,
    pub columns: Vec<KeyPart>,
}

impl CreateIndex {
    /// The index as a table-level constraint.
    pub fn constraint(&self) -> Constraint {
        Constraint::new(Some(self.name.clone()), self.kind.clone(), self.columns.clone())
    }
}

impl fmt::Display for CreateIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            ConstraintKind::Unique => "UNIQUE ",
            ConstraintKind::Fulltext => "FULLTEXT ",
            ConstraintKind::Spatial => "SPATIAL ",
            _ => "",
        };
        let parts: Vec<String> = self.columns.iter().map(|p| p.to_string()).collect();
        write!(
            f,
            "CREATE {}INDEX {} ON {} ({})",
            prefix,
            quote_ident(&self.name),
            quote_ident(&self.table),
            parts.join(", ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropIndex {
    pub name: String,
    pub table: String,
}

impl fmt::Display for DropIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DROP INDEX {} ON {}",
            quote_ident(&self.name),
            quote_ident(&self.table)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncate {
    pub table: String,
}

/// INSERT or REPLACE.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Insert {
    pub table: String,
    pub replace: bool,
    /// Explicit column list (or `SET` columns); empty when omitted.
    pub columns: Vec<String>,
    /// Columns assigned by `ON DUPLICATE KEY UPDATE`.
    pub on_duplicate: Vec<String>,
    /// `INSERT ... SET col = value` form.
    pub set_form: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Update {
    pub table: String,
    /// Assigned columns, qualifiers stripped.
    pub assignments: Vec<String>,
}

#[cfg(test)]
#[path = "ast_test.rs"]
mod tests;

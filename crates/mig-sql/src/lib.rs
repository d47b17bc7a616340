//! mig-sql - SQL layer for Migrator
//!
//! This crate owns everything that understands MySQL statement text:
//! splitting scripts into statements, parsing them into a closed statement
//! model, replaying DDL into an in-memory [`Schema`], and synthesizing the
//! inverse of schema changes.

pub mod ast;
pub mod dialect;
pub mod error;
pub mod parser;
pub mod reverser;
pub mod schema;

pub use ast::{Statement, StatementKind, StatementNode};
pub use dialect::{quote_ident, quote_string, MySqlDialect, SqlDialect};
pub use error::{SqlError, SqlResult};
pub use parser::SqlParser;
pub use reverser::{
    drop_tables_reversal, reverse_against, reverse_statement, NotReversible, Reversal,
};
pub use schema::{Difference, Schema};

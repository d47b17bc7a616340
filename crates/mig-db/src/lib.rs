//! mig-db - Database abstraction layer for Migrator
//!
//! This crate provides the `Database` traits and two implementations: DuckDB,
//! and an in-process catalog that executes DDL by replaying it.

pub mod duckdb;
pub mod error;
pub mod memory;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use memory::MemoryBackend;
pub use traits::{validate_table_name, Database, DatabaseCore, DatabaseLedger, DatabaseSchema};

use mig_core::{BackendType, DatabaseConfig};
use std::sync::Arc;

/// Open the target described by `config`
pub fn connect(config: &DatabaseConfig) -> DbResult<Arc<dyn Database>> {
    let db: Arc<dyn Database> = match config.db_type {
        BackendType::DuckDb => Arc::new(DuckDbBackend::new(&config.path)?),
        BackendType::Memory => Arc::new(MemoryBackend::new(&config.path)),
    };
    log::debug!("Connected to {} target {}", db.db_type(), db.identity());
    Ok(db)
}

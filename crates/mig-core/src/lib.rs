//! mig-core - Core library for Migrator
//!
//! This crate provides the shared types used across all Migrator components:
//! project configuration, lint rule configuration with allow-lists, script
//! checksums and ledger records.

pub mod checksum;
pub mod config;
pub mod error;
pub mod ledger;
pub mod rules;

pub use checksum::{compute_checksum, script_checksum};
pub use config::{BackendType, Config, DatabaseConfig, RetryConfig, SandboxConfig};
pub use error::{CoreError, CoreResult};
pub use ledger::LedgerRecord;
pub use rules::{AllowList, AllowListMatcher, RuleConfig};

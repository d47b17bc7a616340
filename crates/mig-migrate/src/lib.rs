//! mig-migrate - Migration orchestration for Migrator
//!
//! Loads script sets, resolves them against the ledger, dry-runs them in a
//! sandbox and applies them to production with reversal bookkeeping.

pub mod error;
pub mod lock;
pub mod migrator;
pub mod sandbox;
pub mod script;
pub mod script_set;

pub use error::{ErrorKind, MigrateError, MigrateResult};
pub use migrator::{
    load_expected_schema, AppliedScript, DeclinedReversal, MigrationFailure, MigrationOptions,
    MigrationReport, Migrator, Stage,
};
pub use script::{script_id, Block, BlockKind, Script};
pub use script_set::{ReversalPlan, ScriptSet};

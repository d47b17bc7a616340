//! mig-lint: static lint rules for migration scripts
//!
//! Rules are registered by name in a [`Registry`]; a [`Linter`] binds an
//! ordered list of rule configurations (each with an allow-list and optional
//! metadata) and runs them over parsed scripts, keeping at most one
//! [`Violation`] per statement.

pub mod error;
pub mod linter;
pub mod registry;
pub mod rule;
pub mod rules;
pub mod violation;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{LintError, LintResult};
pub use linter::Linter;
pub use registry::{global, install, Registry, RuleFactory, RuleSpec};
pub use rule::{parse_meta, parse_required_meta, Finding, LintContext, Rule};
pub use violation::Violation;

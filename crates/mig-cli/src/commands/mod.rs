//! CLI command implementations

pub(crate) mod common;
pub(crate) mod lint;
pub(crate) mod migrate;
pub(crate) mod reverse;
pub(crate) mod rules;
pub(crate) mod status;

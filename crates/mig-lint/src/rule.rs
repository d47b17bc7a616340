//! Rule trait and the values rules exchange with the linter.

use crate::error::{LintError, LintResult};
use mig_core::RuleConfig;
use mig_sql::ast::StatementNode;
use mig_sql::Schema;
use serde::de::DeserializeOwned;

/// A configured lint rule.
///
/// Rules are stateless: one instance is built per configuration entry and
/// evaluated freshly for every statement.
pub trait Rule: Send + Sync {
    /// Check one statement, returning the first problem found.
    fn check(&self, node: &StatementNode, ctx: &LintContext<'_>) -> Option<Finding>;
}

/// What a rule sees besides the statement itself.
#[derive(Debug, Clone, Copy)]
pub struct LintContext<'a> {
    pub module: &'a str,
    pub filename: &'a str,
    /// Tables created earlier in the same script.
    pub schema: &'a Schema,
}

/// A single rule match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub message: String,
    /// Text identifying the offending source line (matched case-insensitively).
    pub needle: Option<String>,
}

impl Finding {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            needle: None,
        }
    }

    /// Point the violation at the first line containing `needle`.
    pub fn at(mut self, needle: impl Into<String>) -> Self {
        self.needle = Some(needle.into());
        self
    }
}

/// Deserialize optional rule metadata, falling back to the default.
///
/// `expected` describes the accepted shape and is quoted in the error.
pub fn parse_meta<T: DeserializeOwned + Default>(
    config: &RuleConfig,
    expected: &'static str,
) -> LintResult<T> {
    match &config.meta {
        None => Ok(T::default()),
        Some(serde_yaml::Value::Null) => Ok(T::default()),
        Some(value) => deserialize_meta(config, value, expected),
    }
}

/// Deserialize rule metadata that must be present.
pub fn parse_required_meta<T: DeserializeOwned>(
    config: &RuleConfig,
    expected: &'static str,
) -> LintResult<T> {
    match &config.meta {
        None | Some(serde_yaml::Value::Null) => Err(LintError::InvalidMeta {
            rule: config.display_name().to_string(),
            message: "meta is required".to_string(),
            expected,
        }),
        Some(value) => deserialize_meta(config, value, expected),
    }
}

/// Metadata error for a rule.
pub fn invalid_meta(config: &RuleConfig, message: impl Into<String>, expected: &'static str) -> LintError {
    LintError::InvalidMeta {
        rule: config.display_name().to_string(),
        message: message.into(),
        expected,
    }
}

fn deserialize_meta<T: DeserializeOwned>(
    config: &RuleConfig,
    value: &serde_yaml::Value,
    expected: &'static str,
) -> LintResult<T> {
    serde_yaml::from_value(value.clone())
        .map_err(|e| invalid_meta(config, e.to_string(), expected))
}

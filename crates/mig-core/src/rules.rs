//! Lint rule configuration and allow-lists.

use crate::error::{CoreError, CoreResult};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Configuration for one lint rule, as written under `lint:` in migrator.yml.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Registry name of the rule.
    pub name: String,

    /// Name reported in violations instead of the registry name.
    #[serde(default)]
    pub alias: Option<String>,

    /// Scripts exempted from the rule.
    #[serde(default)]
    pub allow: Option<AllowList>,

    /// Rule-specific settings, validated by the rule factory.
    #[serde(default)]
    pub meta: Option<serde_yaml::Value>,
}

impl RuleConfig {
    /// Configuration with only a rule name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            allow: None,
            meta: None,
        }
    }

    /// Attach rule metadata.
    pub fn with_meta(mut self, meta: serde_yaml::Value) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Attach an allow-list.
    pub fn with_allow(mut self, allow: AllowList) -> Self {
        self.allow = Some(allow);
        self
    }

    /// Attach an alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Alias if configured, else the registry name.
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Compile the allow-list (an absent list exempts nothing).
    pub fn allow_matcher(&self) -> CoreResult<AllowListMatcher> {
        match &self.allow {
            Some(allow) => allow.compile(self.display_name()),
            None => Ok(AllowListMatcher::default()),
        }
    }
}

/// Scripts exempted from a rule. Any single match exempts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AllowList {
    /// Exact module names.
    #[serde(default)]
    pub modules: Vec<String>,

    /// Exact filenames.
    #[serde(default)]
    pub filenames: Vec<String>,

    /// `YYYYMMDD`; filenames starting with an earlier date are exempt.
    #[serde(default)]
    pub before_date: Option<String>,

    /// Regular expressions matched against the filename.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Exempt every script.
    #[serde(default)]
    pub everything: bool,
}

impl AllowList {
    /// Validate and compile into a matcher.
    pub fn compile(&self, rule: &str) -> CoreResult<AllowListMatcher> {
        let before_date = match &self.before_date {
            Some(date) => Some(parse_date_prefix(date).ok_or_else(|| {
                CoreError::InvalidAllowList {
                    rule: rule.to_string(),
                    message: format!("before_date '{}' is not an 8-digit YYYYMMDD date", date),
                }
            })?),
            None => None,
        };

        let patterns = self
            .patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| CoreError::InvalidAllowList {
                    rule: rule.to_string(),
                    message: format!("bad pattern '{}': {}", p, e),
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(AllowListMatcher {
            modules: self.modules.clone(),
            filenames: self.filenames.clone(),
            before_date,
            patterns,
            everything: self.everything,
        })
    }
}

/// Compiled form of an [`AllowList`].
#[derive(Debug, Clone, Default)]
pub struct AllowListMatcher {
    modules: Vec<String>,
    filenames: Vec<String>,
    before_date: Option<u32>,
    patterns: Vec<Regex>,
    everything: bool,
}

impl AllowListMatcher {
    /// True when the script `module/filename` is exempt.
    pub fn matches(&self, module: &str, filename: &str) -> bool {
        if self.everything {
            return true;
        }
        if !module.is_empty() && self.modules.iter().any(|m| m == module) {
            return true;
        }
        if self.filenames.iter().any(|f| f == filename) {
            return true;
        }
        if let (Some(limit), Some(date)) = (self.before_date, parse_date_prefix(filename)) {
            if date < limit {
                return true;
            }
        }
        self.patterns.iter().any(|re| re.is_match(filename))
    }

    /// True when nothing can ever match.
    pub fn is_empty(&self) -> bool {
        !self.everything
            && self.modules.is_empty()
            && self.filenames.is_empty()
            && self.before_date.is_none()
            && self.patterns.is_empty()
    }
}

/// Leading 8-digit date of `s` as a comparable integer.
fn parse_date_prefix(s: &str) -> Option<u32> {
    let prefix = s.get(..8)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u32 = prefix.parse().ok()?;
    let month = value / 100 % 100;
    let day = value % 100;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Some(value)
}

#[cfg(test)]
#[path = "rules_test.rs"]
mod tests;

//! Rule registry: rule name → factory.
//!
//! A process-wide registry holding the built-in rules is created on first
//! use. Embedders that add rules build their own [`Registry`] and
//! [`install`] it before anything lints; tests use isolated registries.

use crate::error::{LintError, LintResult};
use crate::rule::Rule;
use crate::rules;
use mig_core::RuleConfig;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Builds a rule instance from validated configuration.
pub type RuleFactory = fn(&RuleConfig) -> LintResult<Box<dyn Rule>>;

/// A registered rule.
#[derive(Clone, Copy)]
pub struct RuleSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub factory: RuleFactory,
}

impl fmt::Debug for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Name-keyed set of rule factories.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    rules: BTreeMap<&'static str, RuleSpec>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in rule.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for spec in rules::builtins() {
            // Built-in names are distinct
            registry.rules.insert(spec.name, spec);
        }
        registry
    }

    /// Add a rule. Fails when the name is taken.
    pub fn register(
        &mut self,
        name: &'static str,
        description: &'static str,
        factory: RuleFactory,
    ) -> LintResult<()> {
        if self.rules.contains_key(name) {
            return Err(LintError::DuplicateRule(name.to_string()));
        }
        self.rules.insert(
            name,
            RuleSpec {
                name,
                description,
                factory,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RuleSpec> {
        self.rules.get(name)
    }

    /// Instantiate the rule a configuration entry names.
    pub fn build(&self, config: &RuleConfig) -> LintResult<Box<dyn Rule>> {
        let spec = self
            .get(&config.name)
            .ok_or_else(|| LintError::UnknownRule(config.name.clone()))?;
        (spec.factory)(config)
    }

    /// Registered rules in name order.
    pub fn specs(&self) -> impl Iterator<Item = &RuleSpec> {
        self.rules.values()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry, initialised with the built-ins on first use.
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(Registry::with_builtins)
}

/// Replace the process-wide registry. Only possible before first use;
/// otherwise the rejected registry is handed back.
pub fn install(registry: Registry) -> Result<(), Registry> {
    GLOBAL.set(registry)
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;

//! The linter: binds rule configurations and runs them over scripts.

use crate::error::{LintError, LintResult};
use crate::registry::{self, Registry};
use crate::rule::{LintContext, Rule};
use crate::violation::{locate_line, Violation};
use mig_core::{AllowListMatcher, RuleConfig};
use mig_sql::{Schema, SqlParser};
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write;

/// A rule bound to its configuration.
struct BoundRule {
    name: String,
    rule: Box<dyn Rule>,
    allow: AllowListMatcher,
}

/// Runs configured rules over scripts and collects violations per script.
pub struct Linter {
    rules: Vec<BoundRule>,
    parser: SqlParser,
    violations: BTreeMap<String, Vec<Violation>>,
}

impl Linter {
    /// Bind configurations against the process-wide registry.
    pub fn new(configs: &[RuleConfig]) -> LintResult<Self> {
        Self::with_registry(registry::global(), configs)
    }

    /// Bind configurations against `registry`.
    ///
    /// Unknown rules, duplicate reporting names, bad allow-lists and invalid
    /// metadata are all rejected here.
    pub fn with_registry(registry: &Registry, configs: &[RuleConfig]) -> LintResult<Self> {
        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(configs.len());
        for config in configs {
            let name = config.display_name().to_string();
            if !seen.insert(name.clone()) {
                return Err(LintError::DuplicateAlias(name));
            }
            let rule = registry.build(config)?;
            let allow = config.allow_matcher()?;
            rules.push(BoundRule { name, rule, allow });
        }
        log::debug!("Linter bound {} rules", rules.len());
        Ok(Self {
            rules,
            parser: SqlParser::mysql(),
            violations: BTreeMap::new(),
        })
    }

    /// Number of bound rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Lint one script, returning how many violations it produced.
    ///
    /// Each statement reports at most one violation: the first rule, in
    /// configuration order, that matches it.
    pub fn lint(&mut self, module: &str, filename: &str, content: &str) -> LintResult<usize> {
        let script = script_name(module, filename);
        let nodes = self
            .parser
            .parse(content)
            .map_err(|source| LintError::Parse {
                script: script.clone(),
                source,
            })?;

        let active: Vec<&BoundRule> = self
            .rules
            .iter()
            .filter(|r| !r.allow.matches(module, filename))
            .collect();

        let mut schema = Schema::new();
        let mut found = Vec::new();
        for node in &nodes {
            let ctx = LintContext {
                module,
                filename,
                schema: &schema,
            };
            let hit = active
                .iter()
                .find_map(|bound| bound.rule.check(node, &ctx).map(|f| (bound, f)));
            if let Some((bound, finding)) = hit {
                let (line, line_number) =
                    locate_line(&node.text, node.line, finding.needle.as_deref());
                found.push(Violation {
                    script: script.clone(),
                    statement: node.text.clone(),
                    rule: bound.name.clone(),
                    message: finding.message,
                    line,
                    line_number,
                });
            }
            // Later statements see tables created earlier; replay failures are
            // the orchestrator's concern
            if let Err(e) = schema.apply(&node.statement) {
                log::debug!("{}: schema replay stopped tracking a statement: {}", script, e);
            }
        }

        let count = found.len();
        if count > 0 {
            self.violations.entry(script).or_default().extend(found);
        }
        Ok(count)
    }

    /// Violations keyed by script name.
    pub fn errors(&self) -> &BTreeMap<String, Vec<Violation>> {
        &self.violations
    }

    /// All violations in script order.
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations.values().flatten()
    }

    pub fn violation_count(&self) -> usize {
        self.violations.values().map(Vec::len).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human-readable summary grouped by script.
    pub fn report(&self) -> String {
        let mut out = String::new();
        for (script, violations) in &self.violations {
            let _ = writeln!(out, "{} ({} violations)", script, violations.len());
            for v in violations {
                let _ = writeln!(out, "  line {}: [{}] {}", v.line_number, v.rule, v.message);
                let _ = writeln!(out, "      {}", v.line);
            }
        }
        let total = self.violation_count();
        let _ = writeln!(
            out,
            "{} violations in {} scripts",
            total,
            self.violations.len()
        );
        out
    }
}

fn script_name(module: &str, filename: &str) -> String {
    if module.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", module, filename)
    }
}

#[cfg(test)]
#[path = "linter_test.rs"]
mod tests;

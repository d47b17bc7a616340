//! Configuration types and parsing for migrator.yml

use crate::error::{CoreError, CoreResult};
use crate::ledger::DEFAULT_LEDGER_TABLE;
use crate::rules::RuleConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main project configuration from migrator.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Directory holding one sub-directory of `.sql` scripts per module
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,

    /// Modules to migrate (default: every module directory)
    #[serde(default)]
    pub modules: Vec<String>,

    /// Name of the ledger table in the target database
    #[serde(default = "default_ledger_table")]
    pub ledger_table: String,

    /// Target database
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Disposable database used for the dry run
    #[serde(default)]
    pub sandbox: Option<SandboxConfig>,

    /// Skip the lint stage
    #[serde(default)]
    pub skip_lint: bool,

    /// Skip the sandbox dry run
    #[serde(default)]
    pub skip_sandbox: bool,

    /// Compare the schema reached in the sandbox with the expected schema
    #[serde(default)]
    pub verify: bool,

    /// SQL file describing the expected schema after migrating
    #[serde(default)]
    pub expected_schema: Option<String>,

    /// Lint rules, in evaluation order
    #[serde(default)]
    pub lint: Vec<RuleConfig>,
}

/// Database backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// DuckDB (default)
    #[default]
    DuckDb,
    /// In-process catalog that replays DDL
    Memory,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendType::DuckDb => write!(f, "duckdb"),
            BackendType::Memory => write!(f, "memory"),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Backend type (duckdb or memory)
    #[serde(rename = "type", default)]
    pub db_type: BackendType,

    /// Database path (for DuckDB file-based or :memory:)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: BackendType::default(),
            path: default_db_path(),
        }
    }
}

/// Sandbox configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SandboxConfig {
    /// Backend type (duckdb or memory)
    #[serde(rename = "type", default)]
    pub db_type: BackendType,

    /// Sandbox path; dropped and recreated before every dry run
    #[serde(default = "default_sandbox_path")]
    pub path: String,

    /// Provisioning retry policy
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            db_type: BackendType::default(),
            path: default_sandbox_path(),
            retry: RetryConfig::default(),
        }
    }
}

impl SandboxConfig {
    /// The sandbox as a plain database configuration
    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            db_type: self.db_type,
            path: self.path.clone(),
        }
    }
}

/// Bounded exponential backoff used while the sandbox service starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Delay after the first failed attempt
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound for any single delay
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// Delay to wait after the given failed attempt (1-based), doubling each time
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let delay = self.initial_delay_ms.saturating_mul(1u64 << shift);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}

fn default_migrations_dir() -> String {
    "migrations".to_string()
}

fn default_ledger_table() -> String {
    DEFAULT_LEDGER_TABLE.to_string()
}

fn default_db_path() -> String {
    "migrator.duckdb".to_string()
}

fn default_sandbox_path() -> String {
    ":memory:".to_string()
}

fn default_attempts() -> u32 {
    5
}

fn default_initial_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    5_000
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for migrator.yml or migrator.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("migrator.yml");
        let yaml_path = dir.join("migrator.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: dir.join("migrator.yml").display().to_string(),
            })
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        // The ledger table name is interpolated into SQL
        if !is_plain_identifier(&self.ledger_table) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "ledger_table '{}' must contain only letters, digits and underscores",
                    self.ledger_table
                ),
            });
        }

        if let Some(sandbox) = &self.sandbox {
            if sandbox.retry.attempts == 0 {
                return Err(CoreError::ConfigInvalid {
                    message: "sandbox.retry.attempts must be at least 1".to_string(),
                });
            }
            if sandbox.database() == self.database && sandbox.path != ":memory:" {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "sandbox must not point at the target database ({})",
                        sandbox.path
                    ),
                });
            }
        }

        let mut seen = HashSet::new();
        for rule in &self.lint {
            if !seen.insert(rule.display_name()) {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "lint rule '{}' is configured twice; give one of them an alias",
                        rule.display_name()
                    ),
                });
            }
        }

        Ok(())
    }

    /// Absolute path of the migrations directory
    pub fn migrations_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.migrations_dir)
    }

    /// Absolute path of the expected schema file, if configured
    pub fn expected_schema_absolute(&self, root: &Path) -> Option<PathBuf> {
        self.expected_schema.as_ref().map(|p| root.join(p))
    }

    /// Module filter, `None` meaning every module
    pub fn module_filter(&self) -> Option<&[String]> {
        if self.modules.is_empty() {
            None
        } else {
            Some(&self.modules)
        }
    }
}

fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

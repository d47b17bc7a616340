//! Project context shared by the commands

use anyhow::{Context, Result};
use mig_core::{BackendType, Config, DatabaseConfig};
use mig_db::Database;
use mig_migrate::ScriptSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Loaded configuration and the directory it is relative to
pub(crate) struct ProjectContext {
    pub root: PathBuf,
    pub config: Config,
}

impl ProjectContext {
    /// Load the configuration from `--config` or the project directory
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let root = PathBuf::from(&global.project_dir);
        let config = match &global.config {
            Some(path) => {
                Config::load(Path::new(path)).context("Failed to load configuration file")?
            }
            None => Config::load_from_dir(&root).context("Failed to load project configuration")?,
        };
        log::debug!("Loaded project '{}' from {}", config.name, root.display());
        Ok(Self { root, config })
    }

    /// Scripts of the selected modules; `modules` is a comma-separated
    /// override of the configured filter
    pub fn scripts(&self, modules: Option<&str>) -> Result<ScriptSet> {
        let selected = modules.map(split_list);
        let filter = selected.as_deref().or(self.config.module_filter());
        let dir = self.config.migrations_dir_absolute(&self.root);
        ScriptSet::load(&dir, filter)
            .with_context(|| format!("Failed to load migration scripts from {}", dir.display()))
    }

    /// Connection to the target database
    pub fn production(&self) -> Result<Arc<dyn Database>> {
        let config = self.resolve(&self.config.database);
        mig_db::connect(&config).context("Failed to connect to database")
    }

    /// Connection to the sandbox, when one is configured
    pub fn sandbox(&self) -> Result<Option<Arc<dyn Database>>> {
        let Some(sandbox) = &self.config.sandbox else {
            return Ok(None);
        };
        let config = self.resolve(&sandbox.database());
        let db = mig_db::connect(&config).context("Failed to connect to sandbox")?;
        Ok(Some(db))
    }

    /// File-based DuckDB paths are relative to the project directory
    fn resolve(&self, config: &DatabaseConfig) -> DatabaseConfig {
        let mut config = config.clone();
        if config.db_type == BackendType::DuckDb
            && config.path != ":memory:"
            && Path::new(&config.path).is_relative()
        {
            config.path = self.root.join(&config.path).display().to_string();
        }
        config
    }
}

/// Split a comma-separated argument, dropping empty items
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mig_db::DatabaseCore;

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("users, billing,,"), vec!["users", "billing"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_relative_duckdb_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("migrator.yml"),
            "name: shop\ndatabase:\n  type: duckdb\n  path: app.duckdb\nsandbox:\n  type: memory\n  path: scratch\n",
        )
        .unwrap();
        let global = GlobalArgs {
            verbose: false,
            project_dir: dir.path().display().to_string(),
            config: None,
        };

        let ctx = ProjectContext::load(&global).unwrap();
        let production = ctx.resolve(&ctx.config.database);
        assert_eq!(production.path, dir.path().join("app.duckdb").display().to_string());

        let sandbox = ctx.sandbox().unwrap().unwrap();
        assert_eq!(sandbox.identity(), "memory:scratch");
    }
}

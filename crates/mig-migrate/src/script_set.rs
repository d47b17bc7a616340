//! All migration scripts of a project, grouped by module.
//!
//! Layout on disk is `root/<module>/<filename>.sql`. Within a module, scripts
//! apply in filename order; across modules, baseline scripts go first and the
//! rest are interleaved by filename stem with the module name as tie-break,
//! never reordering two scripts of the same module.

use crate::error::{MigrateError, MigrateResult};
use crate::script::Script;
use mig_core::{CoreError, LedgerRecord};
use mig_sql::ast::{AlterSpec, Statement};
use mig_sql::{drop_tables_reversal, reverse_against, Reversal, Schema, SqlError};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Scripts keyed by module, each module sorted by filename
#[derive(Debug, Default)]
pub struct ScriptSet {
    root: PathBuf,
    modules: BTreeMap<String, Vec<Script>>,
    /// Cached answer of [`ScriptSet::has_destructive_pending`]
    destructive: OnceLock<bool>,
}

/// Reverse of one script, computed offline against replayed history
#[derive(Debug, Clone)]
pub struct ReversalPlan {
    pub script: String,
    /// Each statement with its reversal, in script order
    pub steps: Vec<(String, Reversal)>,
}

impl ReversalPlan {
    /// Executable reverse statements, newest first
    pub fn statements(&self) -> Vec<&str> {
        self.steps
            .iter()
            .rev()
            .filter_map(|(_, r)| r.statement())
            .collect()
    }
}

impl ScriptSet {
    /// Load every module under `root`, or only those named in `modules`
    pub fn load(root: &Path, modules: Option<&[String]>) -> MigrateResult<Self> {
        if !root.is_dir() {
            return Err(CoreError::MigrationsDirNotFound {
                path: root.display().to_string(),
            }
            .into());
        }

        let mut set = ScriptSet {
            root: root.to_path_buf(),
            ..Default::default()
        };
        for module_dir in read_dir_sorted(root)? {
            if !module_dir.is_dir() {
                continue;
            }
            let Some(module) = module_dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if modules.is_some_and(|filter| !filter.iter().any(|m| m == module)) {
                continue;
            }
            for path in read_dir_sorted(&module_dir)? {
                if path.is_file() && path.extension().is_some_and(|e| e == "sql") {
                    set.push(Script::load(module, &path)?);
                }
            }
        }

        log::info!(
            "Loaded {} scripts in {} modules from {}",
            set.len(),
            set.modules.len(),
            root.display()
        );
        Ok(set)
    }

    /// Build a set from already-parsed scripts
    pub fn from_scripts(scripts: impl IntoIterator<Item = Script>) -> Self {
        let mut set = ScriptSet::default();
        for script in scripts {
            set.push(script);
        }
        set
    }

    fn push(&mut self, script: Script) {
        let scripts = self.modules.entry(script.module().to_string()).or_default();
        scripts.push(script);
        scripts.sort_by(|a, b| a.filename().cmp(b.filename()));
        self.destructive = OnceLock::new();
    }

    /// Directory the set was loaded from (empty for in-memory sets)
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.modules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Scripts of one module in filename order
    pub fn module(&self, name: &str) -> &[Script] {
        self.modules.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Look up a script by `module/filename`
    pub fn get(&self, id: &str) -> Option<&Script> {
        let (module, filename) = id.split_once('/')?;
        self.module(module).iter().find(|s| s.filename() == filename)
    }

    /// Every script in global apply order.
    ///
    /// Merges the module sequences by picking the smallest head each step, so a
    /// module's own filename order always survives the interleaving.
    pub fn ordered(&self) -> Vec<&Script> {
        let mut heads: Vec<&[Script]> = self.modules.values().map(Vec::as_slice).collect();
        let mut scripts = Vec::with_capacity(self.len());
        loop {
            let next = heads
                .iter()
                .copied()
                .enumerate()
                .filter_map(|(i, rest)| rest.first().map(|s| (i, s)))
                .min_by(|(_, a), (_, b)| {
                    (!a.is_baseline(), a.stem(), a.module())
                        .cmp(&(!b.is_baseline(), b.stem(), b.module()))
                });
            let Some((i, script)) = next else {
                break;
            };
            scripts.push(script);
            heads[i] = &heads[i][1..];
        }
        scripts
    }

    /// Pending scripts in global apply order
    pub fn pending(&self) -> Vec<&Script> {
        self.ordered().into_iter().filter(|s| s.is_pending()).collect()
    }

    pub fn installed_count(&self) -> usize {
        self.modules
            .values()
            .flatten()
            .filter(|s| !s.is_pending())
            .count()
    }

    /// Attach ledger records; scripts without one are pending
    pub fn resolve_pending(&mut self, records: &[LedgerRecord]) {
        let by_key: HashMap<(&str, &str), &LedgerRecord> =
            records.iter().map(|r| (r.key(), r)).collect();
        for script in self.modules.values_mut().flatten() {
            let record = by_key
                .get(&(script.module(), script.filename()))
                .map(|r| (*r).clone());
            script.attach(record);
        }
        self.destructive = OnceLock::new();
    }

    /// Mark one script installed after it was applied
    pub fn mark_installed(&mut self, record: LedgerRecord) {
        if let Some(script) = self
            .modules
            .get_mut(&record.module)
            .and_then(|s| s.iter_mut().find(|s| s.filename() == record.filename))
        {
            script.attach(Some(record));
        }
        self.destructive = OnceLock::new();
    }

    /// Check that installed scripts form a prefix of each module and that
    /// none of them changed since they were applied
    pub fn check_drift(&self) -> MigrateResult<()> {
        for (module, scripts) in &self.modules {
            let mut first_pending: Option<&Script> = None;
            for script in scripts {
                match (script.record(), first_pending) {
                    (None, None) => first_pending = Some(script),
                    (None, Some(_)) => {}
                    (Some(_), Some(pending)) => {
                        return Err(MigrateError::OutOfOrder {
                            module: module.clone(),
                            pending: pending.filename().to_string(),
                            installed: script.filename().to_string(),
                        })
                    }
                    (Some(record), None) => {
                        if record.checksum != script.checksum() {
                            return Err(MigrateError::ChecksumDrift {
                                script: script.id(),
                                recorded: record.checksum.clone(),
                                current: script.checksum().to_string(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Fail when two modules contain a script with the same filename
    pub fn check_duplicate_filenames(&self) -> MigrateResult<()> {
        let mut seen: HashMap<&str, &Script> = HashMap::new();
        for script in self.modules.values().flatten() {
            if let Some(first) = seen.insert(script.filename(), script) {
                return Err(MigrateError::DuplicateFilename {
                    filename: script.filename().to_string(),
                    first: first.id(),
                    second: script.id(),
                });
            }
        }
        Ok(())
    }

    /// Fail when a module alters a table it has not created earlier in its
    /// own sequence
    pub fn check_illegal_alters(&self) -> MigrateResult<()> {
        for scripts in self.modules.values() {
            let mut created: HashSet<String> = HashSet::new();
            for script in scripts {
                for node in script.statements() {
                    match &node.statement {
                        Statement::CreateTable(create) => {
                            created.insert(create.name.to_lowercase());
                        }
                        Statement::RenameTable(rename) => {
                            for (_, to) in &rename.pairs {
                                created.insert(to.to_lowercase());
                            }
                        }
                        Statement::AlterTable(alter) => {
                            if !created.contains(&alter.name.to_lowercase()) {
                                return Err(MigrateError::IllegalAlter {
                                    script: script.id(),
                                    table: alter.name.clone(),
                                    line: node.line,
                                });
                            }
                            for spec in &alter.specs {
                                if let AlterSpec::RenameTable(to) = spec {
                                    created.insert(to.to_lowercase());
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether any pending script drops or truncates something
    pub fn has_destructive_pending(&self) -> bool {
        *self.destructive.get_or_init(|| {
            self.modules
                .values()
                .flatten()
                .any(|s| s.is_pending() && s.has_destructive_operation())
        })
    }

    /// `DROP TABLE IF EXISTS` for every table the baseline scripts create,
    /// newest first
    pub fn baseline_reversal(&self) -> Vec<String> {
        let tables: Vec<&str> = self
            .ordered()
            .into_iter()
            .filter(|s| s.is_baseline())
            .flat_map(|s| s.created_tables())
            .collect();
        drop_tables_reversal(tables)
    }

    /// Compute the reverse of script `id` by replaying every script ordered
    /// before it into a fresh schema
    pub fn reversal_plan(&self, id: &str) -> MigrateResult<ReversalPlan> {
        let target = self
            .get(id)
            .ok_or_else(|| MigrateError::UnknownScript(id.to_string()))?;

        let replay_error = |script: &Script, source: SqlError| MigrateError::Parse {
            script: script.id(),
            source,
        };

        let mut schema = Schema::new();
        for script in self.ordered() {
            if std::ptr::eq(script, target) {
                break;
            }
            schema
                .apply_all(script.statements())
                .map_err(|e| replay_error(script, e))?;
        }

        let mut steps = Vec::with_capacity(target.statements().len());
        for node in target.statements() {
            let reversal =
                reverse_against(&schema, &node.statement).map_err(|e| replay_error(target, e))?;
            schema
                .apply(&node.statement)
                .map_err(|e| replay_error(target, e))?;
            steps.push((node.text.clone(), reversal));
        }
        Ok(ReversalPlan {
            script: target.id(),
            steps,
        })
    }
}

fn read_dir_sorted(dir: &Path) -> MigrateResult<Vec<PathBuf>> {
    let io_error = |e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    };
    let mut paths = std::fs::read_dir(dir)
        .map_err(io_error)?
        .map(|entry| entry.map(|e| e.path()).map_err(io_error))
        .collect::<Result<Vec<_>, _>>()?;
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
#[path = "script_set_test.rs"]
mod tests;

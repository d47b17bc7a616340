//! Lint command implementation

use anyhow::{Context, Result};
use mig_lint::Linter;
use mig_migrate::Script;
use std::path::{Path, PathBuf};

use crate::cli::{GlobalArgs, LintArgs, OutputFormat};
use crate::commands::common::{self, ExitCode};
use crate::context::ProjectContext;

/// Execute the lint command
pub(crate) async fn execute(args: &LintArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let scripts: Vec<Script> = if args.paths.is_empty() {
        ctx.scripts(None)?.ordered().into_iter().cloned().collect()
    } else {
        scripts_at(&args.paths)?
    };

    let mut linter = Linter::new(&ctx.config.lint).context("Invalid lint configuration")?;
    let mut linted = 0;
    for script in &scripts {
        if script.is_baseline() && !args.include_baseline {
            log::debug!("Skipping baseline script {}", script.id());
            continue;
        }
        linter
            .lint(script.module(), script.filename(), script.content())
            .with_context(|| format!("Failed to lint {}", script.id()))?;
        linted += 1;
    }

    match args.output {
        OutputFormat::Json => {
            let violations: Vec<_> = linter.violations().collect();
            common::print_json(&violations)?;
        }
        OutputFormat::Text => {
            if linter.is_clean() {
                println!(
                    "Lint passed: {} scripts, {} rules",
                    linted,
                    linter.rule_count()
                );
            } else {
                print!("{}", linter.report());
            }
        }
    }

    if linter.is_clean() {
        Ok(())
    } else {
        Err(ExitCode(1).into())
    }
}

/// Scripts named on the command line; a directory is one module, a file
/// belongs to the module named by its parent directory
fn scripts_at(paths: &[String]) -> Result<Vec<Script>> {
    let mut scripts = Vec::new();
    for path in paths.iter().map(Path::new) {
        if path.is_dir() {
            let module = dir_name(path);
            let mut files: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("Failed to read {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "sql"))
                .collect();
            files.sort();
            for file in files {
                scripts.push(load(&module, &file)?);
            }
        } else {
            let module = path.parent().map(dir_name).unwrap_or_default();
            scripts.push(load(&module, path)?);
        }
    }
    Ok(scripts)
}

fn load(module: &str, path: &Path) -> Result<Script> {
    Script::load(module, path).with_context(|| format!("Failed to load {}", path.display()))
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

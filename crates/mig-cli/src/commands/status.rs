//! Status command implementation

use anyhow::Result;
use mig_migrate::Migrator;
use serde::Serialize;

use crate::cli::{GlobalArgs, OutputFormat, StatusArgs};
use crate::commands::common::{self, print_table};
use crate::context::ProjectContext;

#[derive(Debug, Serialize)]
struct ScriptStatus {
    script: String,
    status: &'static str,
    baseline: bool,
    checksum: String,
    applied_at: Option<String>,
}

/// Execute the status command
pub(crate) async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let scripts = ctx.scripts(args.modules.as_deref())?;
    let mut migrator = Migrator::new(scripts, ctx.production()?);
    migrator.refresh().await?;

    let scripts = migrator.scripts();
    let entries: Vec<ScriptStatus> = scripts
        .ordered()
        .into_iter()
        .map(|s| ScriptStatus {
            script: s.id(),
            status: if s.is_pending() { "pending" } else { "installed" },
            baseline: s.is_baseline(),
            checksum: s.checksum().to_string(),
            applied_at: s.record().map(|r| r.applied_at.to_rfc3339()),
        })
        .collect();

    if args.output == OutputFormat::Json {
        return common::print_json(&entries);
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            vec![
                e.script.clone(),
                e.status.to_string(),
                e.applied_at.clone().unwrap_or_else(|| "-".to_string()),
                e.checksum.chars().take(12).collect(),
            ]
        })
        .collect();
    print_table(&["SCRIPT", "STATUS", "APPLIED AT", "CHECKSUM"], &rows);

    let pending = scripts.pending().len();
    println!(
        "\n{} installed, {} pending",
        scripts.installed_count(),
        pending
    );
    if let Err(e) = scripts.check_drift() {
        println!("\u{26a0} {}", e);
    }
    if scripts.has_destructive_pending() {
        println!("\u{26a0} pending scripts drop or truncate data");
    }
    Ok(())
}

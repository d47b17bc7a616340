//! Migrate command implementation

use anyhow::{Context, Result};
use mig_migrate::{MigrationFailure, MigrationOptions, MigrationReport, Migrator};
use serde_json::json;

use crate::cli::{GlobalArgs, MigrateArgs, OutputFormat};
use crate::commands::common::{self, terminated, ExitCode};
use crate::context::ProjectContext;

/// Execute the migrate command
pub(crate) async fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let scripts = ctx.scripts(args.modules.as_deref())?;
    let production = ctx.production()?;

    let mut options = MigrationOptions::from_config(&ctx.config, &ctx.root)
        .context("Failed to load the expected schema")?;
    options.skip_lint |= args.skip_lint;
    options.skip_sandbox |= args.skip_sandbox;
    options.dry_run = args.dry_run;

    let mut migrator = Migrator::new(scripts, production)
        .with_rules(ctx.config.lint.clone())
        .with_options(options);
    if let Some(sandbox) = ctx.sandbox()? {
        migrator = migrator.with_sandbox(sandbox);
    }

    if args.output == OutputFormat::Text {
        println!(
            "Migrating {} scripts for project '{}'{}",
            migrator.scripts().len(),
            ctx.config.name,
            if args.dry_run { " (dry run)" } else { "" }
        );
    }

    match migrator.run().await {
        Ok(report) => match args.output {
            OutputFormat::Json => common::print_json(&report),
            OutputFormat::Text => {
                print_report(&report);
                Ok(())
            }
        },
        Err(failure) => {
            match args.output {
                OutputFormat::Json => common::print_json(&json!({
                    "stage": failure.stage,
                    "kind": failure.kind().to_string(),
                    "error": failure.error.to_string(),
                    "applied": failure.applied,
                    "rollback": failure.rollback,
                }))?,
                OutputFormat::Text => print_failure(&failure),
            }
            Err(ExitCode(1).into())
        }
    }
}

fn print_report(report: &MigrationReport) {
    for adopted in &report.adopted {
        println!("  = Baseline {} matches the existing database", adopted);
    }
    if report.applied.is_empty() {
        println!("Nothing to migrate: {} scripts installed", report.installed);
        return;
    }

    let verb = if report.dry_run { "Would apply" } else { "Applied" };
    for applied in &report.applied {
        println!("  \u{2713} {} {}", verb, applied.script);
        for declined in &applied.declined {
            println!("      no reverse: {} ({})", declined.statement, declined.reason);
        }
    }
    println!();
    println!(
        "{} {} scripts: {} installed, {} pending",
        verb,
        report.applied.len(),
        report.installed,
        report.pending
    );

    let plan = report.rollback_plan();
    if !plan.is_empty() {
        println!("\nRollback plan (newest first):");
        for statement in &plan {
            println!("  {}", terminated(statement));
        }
    }
    let declined = report.declined_count();
    if declined > 0 {
        println!("\n{} statements have no reverse; rollback is partial", declined);
    }
}

fn print_failure(failure: &MigrationFailure) {
    eprintln!("\u{2717} {} ({})", failure, failure.kind());
    if !failure.applied.is_empty() {
        eprintln!("\nScripts applied before the failure:");
        for applied in &failure.applied {
            eprintln!("  {}", applied.script);
        }
    }
    if !failure.rollback.is_empty() {
        eprintln!("\nRollback plan (newest first):");
        for statement in &failure.rollback {
            eprintln!("  {}", terminated(statement));
        }
    }
}

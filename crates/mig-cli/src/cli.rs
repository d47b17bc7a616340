//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Migrator - lint, dry-run and apply MySQL schema migrations
#[derive(Parser, Debug)]
#[command(name = "mig")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending migration scripts
    Migrate(MigrateArgs),

    /// Run the configured lint rules over migration scripts
    Lint(LintArgs),

    /// Show installed and pending scripts
    Status(StatusArgs),

    /// Print the statements that undo a script
    Reverse(ReverseArgs),

    /// List the available lint rules
    Rules,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Modules to migrate (comma-separated, default: config or all)
    #[arg(short, long)]
    pub modules: Option<String>,

    /// Skip the lint stage
    #[arg(long)]
    pub skip_lint: bool,

    /// Skip the sandbox dry run
    #[arg(long)]
    pub skip_sandbox: bool,

    /// Stop before touching the target database
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the lint command
#[derive(Args, Debug)]
pub struct LintArgs {
    /// Script files or module directories (default: every script of the project)
    pub paths: Vec<String>,

    /// Lint baseline scripts too
    #[arg(long)]
    pub include_baseline: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Modules to show (comma-separated, default: config or all)
    #[arg(short, long)]
    pub modules: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the reverse command
#[derive(Args, Debug)]
pub struct ReverseArgs {
    /// Script to reverse, as module/filename
    #[arg(required_unless_present = "baseline")]
    pub script: Option<String>,

    /// Print the statements that drop every baseline table instead
    #[arg(long, conflicts_with = "script")]
    pub baseline: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

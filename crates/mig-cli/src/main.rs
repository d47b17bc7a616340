//! Migrator CLI - lint, dry-run and apply MySQL schema migrations

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod context;

use cli::{Cli, Commands};
use commands::{common, lint, migrate, reverse, rules, status};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let result = match &cli.command {
        Commands::Migrate(args) => migrate::execute(args, &cli.global).await,
        Commands::Lint(args) => lint::execute(args, &cli.global).await,
        Commands::Status(args) => status::execute(args, &cli.global).await,
        Commands::Reverse(args) => reverse::execute(args, &cli.global).await,
        Commands::Rules => rules::execute().await,
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<common::ExitCode>() {
            Some(code) => std::process::ExitCode::from(code.0),
            None => {
                eprintln!("Error: {:#}", err);
                std::process::ExitCode::FAILURE
            }
        },
    }
}

/// Route library `log` records to stderr; `RUST_LOG` overrides the level
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

//! # synfield CLI
//!
//! The command-line harness for the synfield sparse activation engine:
//! describe a demo schema, or run one of the named end-to-end scenarios and
//! print the resulting activation/link counts as JSON.

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod error;

use commands::SynfieldCli;
use error::CliResult;

fn main() -> CliResult<()> {
    let cli = SynfieldCli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    if let Err(err) = cli.execute() {
        error!("command failed: {}", err);
        std::process::exit(1);
    }

    Ok(())
}

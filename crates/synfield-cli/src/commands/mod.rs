//! CLI command implementations for synfield.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::CliConfig;
use crate::error::CliResult;

pub mod schema;
pub mod scenario;

/// synfield - a sparse, event-driven neural inference engine
#[derive(Parser, Debug)]
#[command(
    name = "synfield",
    version,
    about = "CLI harness for the synfield sparse activation engine",
    long_about = "Exercises the typed field graph and sparse activation network \
                  from the command line: describe the demo schemas, or run one \
                  of the named end-to-end scenarios and print its result as JSON."
)]
pub struct SynfieldCli {
    /// Enable debug-level logging (equivalent to RUST_LOG=debug).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path (defaults to the platform config directory).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Describe a demo schema's neuron and synapse types.
    Schema(schema::SchemaCommand),

    /// Run a named end-to-end scenario and print the resulting counts.
    Scenario(scenario::ScenarioCommand),
}

impl SynfieldCli {
    pub fn execute(self) -> CliResult<()> {
        let config = CliConfig::load(self.config.as_deref())?;
        match self.command {
            Commands::Schema(cmd) => cmd.execute(&config),
            Commands::Scenario(cmd) => cmd.execute(&config),
        }
    }
}

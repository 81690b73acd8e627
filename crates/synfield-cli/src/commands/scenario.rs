//! `synfield scenario run` - drives one of the named demo scenarios to
//! completion and prints the resulting activation/link counts as JSON.

use std::str::FromStr;

use clap::Args;
use serde::Serialize;
use tracing::info;

use synfield_net::demo::ScenarioName;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

#[derive(Args, Debug)]
pub struct ScenarioCommand {
    /// Scenario to run. Pass `list` to print the available names.
    name: String,
}

#[derive(Debug, Serialize)]
struct ScenarioReport {
    scenario: String,
    activations: usize,
    links: usize,
    steps_processed: usize,
}

impl ScenarioCommand {
    pub fn execute(self, _config: &CliConfig) -> CliResult<()> {
        if self.name == "list" {
            for name in ScenarioName::all() {
                println!("{name}");
            }
            return Ok(());
        }

        let scenario = ScenarioName::from_str(&self.name).map_err(CliError::invalid_args)?;
        info!(scenario = self.name.as_str(), "running scenario");
        let outcome = synfield_net::demo::run(scenario)?;

        let report = ScenarioReport {
            scenario: scenario.as_str().to_string(),
            activations: outcome.activations,
            links: outcome.links,
            steps_processed: outcome.steps_processed,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }
}

//! `synfield schema describe` - prints a demo schema's neuron and synapse
//! types, the same shapes the workspace's integration tests exercise.

use clap::{Args, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

#[derive(Args, Debug)]
pub struct SchemaCommand {
    #[command(subcommand)]
    pub action: SchemaAction,
}

#[derive(Subcommand, Debug)]
pub enum SchemaAction {
    /// Print the neuron/synapse type summary for a named demo schema.
    Describe {
        /// One of: identity, paired.
        name: String,
    },
}

#[derive(Debug, Serialize)]
struct NeuronTypeSummary {
    name: String,
    kind: String,
    num_bs_slots: usize,
    has_firing_condition: bool,
}

#[derive(Debug, Serialize)]
struct SynapseTypeSummary {
    name: String,
    input_neuron_type: String,
    output_neuron_type: String,
    transitions: usize,
    allow_latent_linking: bool,
    propagable: bool,
}

#[derive(Debug, Serialize)]
struct SchemaSummary {
    name: String,
    neuron_types: Vec<NeuronTypeSummary>,
    synapse_types: Vec<SynapseTypeSummary>,
}

impl SchemaCommand {
    pub fn execute(self, _config: &CliConfig) -> CliResult<()> {
        match self.action {
            SchemaAction::Describe { name } => describe(&name),
        }
    }
}

fn describe(name: &str) -> CliResult<()> {
    let model = match name {
        "identity" => synfield_net::demo::build_identity_net().0,
        "paired" => synfield_net::demo::build_paired_net().0,
        other => {
            return Err(CliError::invalid_args(format!(
                "unknown schema {other:?}, expected one of: identity, paired"
            )))
        }
    };

    let schema = &model.net_schema;
    let neuron_types = schema
        .neuron_types()
        .map(|def| NeuronTypeSummary {
            name: def.name.clone(),
            kind: format!("{:?}", def.kind),
            num_bs_slots: def.num_bs_slots,
            has_firing_condition: def.net_field.is_some(),
        })
        .collect::<Vec<_>>();
    let synapse_types = schema
        .synapse_types()
        .map(|def| SynapseTypeSummary {
            name: def.name.clone(),
            input_neuron_type: schema.neuron_type(def.input_neuron_type).name.clone(),
            output_neuron_type: schema.neuron_type(def.output_neuron_type).name.clone(),
            transitions: def.transitions.transitions().len(),
            allow_latent_linking: def.allow_latent_linking,
            propagable: def.propagable,
        })
        .collect::<Vec<_>>();

    let summary = SchemaSummary {
        name: name.to_string(),
        neuron_types,
        synapse_types,
    };
    info!(schema = name, "describing schema");
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

//! The minimal model shapes shared by the workspace's integration tests and
//! its CLI scenario runner, so both exercise exactly the same schemas
//! rather than maintaining parallel copies.

use std::str::FromStr;
use std::sync::Arc;

use synfield_fields::{FieldId, TypeRegistry};
use synfield_functions::Addition;

use crate::builders::{NeuronTypeBuilder, SynapseTypeBuilder};
use crate::context::Context;
use crate::error::Result;
use crate::ids::{NeuronId, SynapseTypeId};
use crate::model::{Config, Model};
use crate::schema::{ActivationKind, NetSchema};

/// N_in --(S, transition 1->1, propagable)--> N_out, with a weight-one
/// linear field link riding the same edge the binding-signal transitions
/// travel. The last two return values are N_in's source field `x` and
/// N_out's `y`, so a caller can seed `x` and observe it propagate into `y`
/// once the synapse links the two activations.
pub fn build_identity_net() -> (Arc<Model>, NeuronId, NeuronId, SynapseTypeId, FieldId, FieldId) {
    let mut registry = TypeRegistry::new();
    let mut schema = NetSchema::new();

    let mut in_builder = NeuronTypeBuilder::new(&mut registry, &mut schema, "N_in", ActivationKind::Disjunctive).unwrap();
    let x = in_builder.input_field("x").unwrap();
    let in_field_type = in_builder.field_type();
    let in_type = in_builder.build();

    let mut out_builder = NeuronTypeBuilder::new(&mut registry, &mut schema, "N_out", ActivationKind::Disjunctive).unwrap();
    let y = out_builder.field("y", 1, Box::new(Addition)).unwrap();
    let out_field_type = out_builder.field_type();
    let out_type = out_builder.build();

    let relation = registry
        .declare_relation(in_field_type, "drives", synfield_fields::RelationKind::One, out_field_type)
        .unwrap();

    let synapse = SynapseTypeBuilder::new(&mut registry, &mut schema, "S", in_type, out_type)
        .transition(1, 1)
        .propagable(true)
        .link_fields(relation, x, y, 0)
        .unwrap()
        .build();

    registry.flatten_type_hierarchy().unwrap();

    let model = Model::new(Arc::new(registry), Arc::new(schema), Config::default());
    let n_in = model.create_neuron(in_type);
    let n_out = model.create_neuron(out_type);
    model.connect_neurons(n_in, n_out, synapse).unwrap();
    (model, n_in, n_out, synapse, x, y)
}

/// A, B --(S_A: 1->5, S_B: 3->5, paired, latent)--> C.
pub fn build_paired_net() -> (Arc<Model>, NeuronId, NeuronId, NeuronId) {
    let mut registry = TypeRegistry::new();
    let mut schema = NetSchema::new();

    let a_type = NeuronTypeBuilder::new(&mut registry, &mut schema, "A", ActivationKind::Disjunctive)
        .unwrap()
        .build();
    let b_type = NeuronTypeBuilder::new(&mut registry, &mut schema, "B", ActivationKind::Disjunctive)
        .unwrap()
        .build();
    let c_type = NeuronTypeBuilder::new(&mut registry, &mut schema, "C", ActivationKind::Conjunctive)
        .unwrap()
        .build();

    registry.flatten_type_hierarchy().unwrap();

    let s_a = SynapseTypeBuilder::new(&mut registry, &mut schema, "S_A", a_type, c_type)
        .transition(1, 5)
        .latent_linking(None)
        .build();
    let s_b = SynapseTypeBuilder::new(&mut registry, &mut schema, "S_B", b_type, c_type)
        .transition(3, 5)
        .latent_linking(None)
        .build();
    schema.pair_synapse_types(s_a, s_b);

    let model = Model::new(Arc::new(registry), Arc::new(schema), Config::default());
    let a = model.create_neuron(a_type);
    let b = model.create_neuron(b_type);
    let c = model.create_neuron(c_type);
    model.connect_neurons(a, c, s_a).unwrap();
    model.connect_neurons(b, c, s_b).unwrap();
    (model, a, b, c)
}

/// The named scenarios the CLI's `scenario run` subcommand knows how to
/// build and drive. Mirrors five of the six scenarios named in the
/// workspace's integration tests; the tolerance-drop scenario has no
/// activation-network shape to run and is exercised only at the field-graph
/// level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioName {
    SingleIdentityPropagation,
    PairedLatentLinking,
    PairedLatentConflicting,
    ConvergentTransitions,
    PropagationWithoutTarget,
}

impl ScenarioName {
    pub fn all() -> &'static [&'static str] {
        &[
            "single-identity-propagation",
            "paired-latent-linking",
            "paired-latent-conflicting",
            "convergent-transitions",
            "propagation-without-target",
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleIdentityPropagation => "single-identity-propagation",
            Self::PairedLatentLinking => "paired-latent-linking",
            Self::PairedLatentConflicting => "paired-latent-conflicting",
            Self::ConvergentTransitions => "convergent-transitions",
            Self::PropagationWithoutTarget => "propagation-without-target",
        }
    }
}

impl FromStr for ScenarioName {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "single-identity-propagation" => Ok(Self::SingleIdentityPropagation),
            "paired-latent-linking" => Ok(Self::PairedLatentLinking),
            "paired-latent-conflicting" => Ok(Self::PairedLatentConflicting),
            "convergent-transitions" => Ok(Self::ConvergentTransitions),
            "propagation-without-target" => Ok(Self::PropagationWithoutTarget),
            other => Err(format!(
                "unknown scenario {other:?}, expected one of {:?}",
                Self::all()
            )),
        }
    }
}

/// What a scenario run produced, cheap enough to serialize straight to JSON
/// from the CLI.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioOutcome {
    pub activations: usize,
    pub links: usize,
    pub steps_processed: usize,
}

pub fn run(name: ScenarioName) -> Result<ScenarioOutcome> {
    let (model_activations, model_links, steps) = match name {
        ScenarioName::SingleIdentityPropagation => {
            let (model, n_in, _n_out, _s, _x, _y) = build_identity_net();
            let mut ctx = Context::new(model);
            ctx.add_token(n_in, 1, 42)?;
            let steps = ctx.process()?;
            (ctx.activations().count(), ctx.links().count(), steps)
        }
        ScenarioName::PropagationWithoutTarget => {
            let (model, n_in, _n_out, _s, _x, _y) = build_identity_net();
            let mut ctx = Context::new(model);
            ctx.add_token(n_in, 1, 1)?;
            let steps = ctx.process()?;
            (ctx.activations().count(), ctx.links().count(), steps)
        }
        ScenarioName::PairedLatentLinking => {
            let (model, a, b, _c) = build_paired_net();
            let mut ctx = Context::new(model);
            ctx.add_token(a, 1, 100)?;
            ctx.add_token(b, 3, 100)?;
            let steps = ctx.process()?;
            (ctx.activations().count(), ctx.links().count(), steps)
        }
        ScenarioName::PairedLatentConflicting => {
            let (model, a, b, _c) = build_paired_net();
            let mut ctx = Context::new(model);
            ctx.add_token(a, 1, 700)?;
            ctx.add_token(b, 3, 701)?;
            let steps = ctx.process()?;
            (ctx.activations().count(), ctx.links().count(), steps)
        }
        ScenarioName::ConvergentTransitions => {
            let (model, a, b, _c) = build_paired_net();
            let mut ctx = Context::new(model);
            ctx.add_token(a, 1, 600)?;
            ctx.add_token(b, 3, 600)?;
            let steps = ctx.process()?;
            (ctx.activations().count(), ctx.links().count(), steps)
        }
    };
    Ok(ScenarioOutcome {
        activations: model_activations,
        links: model_links,
        steps_processed: steps,
    })
}

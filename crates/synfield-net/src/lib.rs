//! A sparse activation network layered on `synfield-fields`'s typed field
//! graph: neurons and synapses form a process-wide, lazily linked graph of
//! activations whose numeric fields propagate exactly as a field graph's
//! always do, wired up on demand by symbolic binding-signal matches rather
//! than declared ahead of time.

pub mod activation;
pub mod binding_signal;
pub mod builders;
pub mod context;
pub mod demo;
pub mod error;
pub mod ids;
pub mod linker;
pub mod model;
pub mod neuron;
pub mod schema;

pub use activation::{Activation, Link, LinkKey};
pub use binding_signal::{BindingSignal, Transition, TransitionSet};
pub use builders::{declare_field_relation, NeuronTypeBuilder, SynapseTypeBuilder};
pub use context::{Context, NetStep};
pub use demo::{ScenarioName, ScenarioOutcome};
pub use error::{NetError, Result};
pub use ids::{ActivationId, LinkId, NeuronId, NeuronTypeId, SynapseId, SynapseRef, SynapseTypeId, TokenId};
pub use model::{Config, Model};
pub use neuron::{Neuron, RefType, Synapse};
pub use schema::{ActivationKind, NetSchema, NeuronTypeDef, SynapseTypeDef};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use synfield_fields::TypeRegistry;
    use synfield_functions::Addition;

    use super::*;

    /// A -> B, one non-latent synapse with a 0->0 transition, propagable.
    /// Firing the seeded A activation should propagate a brand new B
    /// activation carrying the same token at slot 0.
    fn build_simple_model() -> (Arc<Model>, NeuronId, NeuronId, SynapseTypeId) {
        let mut registry = TypeRegistry::new();
        let mut schema = NetSchema::new();

        let mut a_builder = NeuronTypeBuilder::new(&mut registry, &mut schema, "A", ActivationKind::Disjunctive).unwrap();
        a_builder.input_field("seed").unwrap();
        let a_type = a_builder.build();

        let mut b_builder = NeuronTypeBuilder::new(&mut registry, &mut schema, "B", ActivationKind::Disjunctive).unwrap();
        b_builder.field("net", 1, Box::new(Addition)).unwrap();
        let b_type = b_builder.build();

        let synapse_type = SynapseTypeBuilder::new(&mut registry, &mut schema, "A_to_B", a_type, b_type)
            .transition(0, 0)
            .propagable(true)
            .build();

        registry.flatten_type_hierarchy().unwrap();

        let model = Model::new(Arc::new(registry), Arc::new(schema), Config::default());
        let a_neuron = model.create_neuron(a_type);
        let b_neuron = model.create_neuron(b_type);
        model.connect_neurons(a_neuron, b_neuron, synapse_type).unwrap();
        (model, a_neuron, b_neuron, synapse_type)
    }

    #[test]
    fn seeding_a_source_neuron_propagates_to_an_unlinked_target() {
        let (model, a_neuron, b_neuron, _synapse) = build_simple_model();
        let mut ctx = Context::new(model);

        let a_act = ctx.add_token(a_neuron, 0, 7).unwrap();
        ctx.process().unwrap();

        assert_eq!(ctx.activations().count(), 2);
        let b_act = ctx
            .activations()
            .find(|act| act.neuron == b_neuron)
            .expect("B activation created");
        assert_eq!(b_act.get_binding_signal(0), Some(7));
        assert_eq!(ctx.links().count(), 1);
        let link = ctx.links().next().unwrap();
        assert_eq!(link.input, a_act);
        assert_eq!(link.output, b_act.id);
    }

    #[test]
    fn re_seeding_reuses_the_existing_model_and_schema() {
        let (model, a_neuron, _b_neuron, _synapse) = build_simple_model();
        let mut ctx1 = Context::new(Arc::clone(&model));
        ctx1.add_token(a_neuron, 0, 1).unwrap();
        ctx1.process().unwrap();

        let mut ctx2 = Context::new(model);
        ctx2.add_token(a_neuron, 0, 2).unwrap();
        ctx2.process().unwrap();

        // Two independent contexts over the same model each get their own
        // activation id space starting at 0.
        assert!(ctx1.activation(ActivationId(0)).is_some());
        assert!(ctx2.activation(ActivationId(0)).is_some());
    }
}

//! The six literal end-to-end scenarios the engine's design document names
//! directly, each implemented as one integration test.

use std::sync::Arc;

use synfield_fields::{FieldGraph, ObjectId, RelationKind, TypeRegistry};
use synfield_functions::Addition;
use synfield_net::demo::{build_identity_net, build_paired_net};
use synfield_net::{ActivationKind, Config, Context, Model, NeuronTypeBuilder, NetSchema, SynapseTypeBuilder};

#[test]
fn single_identity_propagation() {
    let (model, n_in, n_out, _synapse, _x, _y) = build_identity_net();
    let mut ctx = Context::new(model);

    let in_act = ctx.add_token(n_in, 1, 42).unwrap();
    ctx.process().unwrap();

    assert_eq!(ctx.activations().count(), 2);
    assert_eq!(in_act, synfield_net::ActivationId(0));
    let out_act = ctx
        .activations()
        .find(|a| a.neuron == n_out)
        .expect("N_out activation created");
    assert_eq!(out_act.id, synfield_net::ActivationId(1));
    assert_eq!(ctx.links().count(), 1);
    let link = ctx.links().next().unwrap();
    assert_eq!(link.input, in_act);
    assert_eq!(link.output, out_act.id);
    assert_eq!(out_act.get_binding_signal(1), Some(42));
}

#[test]
fn single_identity_propagation_carries_the_producer_field_value() {
    let (model, n_in, n_out, _synapse, x, y) = build_identity_net();
    let mut ctx = Context::new(model);

    let in_act = ctx.add_token(n_in, 1, 42).unwrap();
    ctx.set_field(in_act, x, 7.0).unwrap();
    ctx.process().unwrap();

    let out_act_id = ctx
        .activations()
        .find(|a| a.neuron == n_out)
        .expect("N_out activation created")
        .id;
    assert_eq!(ctx.field_value(out_act_id, y), Some(7.0));
}

#[test]
fn tolerance_drop() {
    let mut registry = TypeRegistry::new();
    let t = registry.declare_type("T").unwrap();
    let x = registry.declare_input_field(t, "x").unwrap();
    registry.set_tolerance(x, 0.01).unwrap();
    let y = registry.declare_field(t, "y", 1, Box::new(Addition)).unwrap();
    let rel = registry
        .declare_relation(t, "self_link", RelationKind::SelfRelation, t)
        .unwrap();
    registry.link(rel, x, y, 0).unwrap();
    registry.flatten_type_hierarchy().unwrap();

    let mut graph = FieldGraph::new(Arc::new(registry));
    graph.create_object(ObjectId(0), t);
    graph.connect(ObjectId(0), rel, ObjectId(0)).unwrap();

    graph.set_value(ObjectId(0), x, 0.005).unwrap();
    assert_eq!(graph.field_value(ObjectId(0), y), Some(0.0));
}

#[test]
fn paired_latent_linking() {
    let (model, a, b, c) = build_paired_net();
    let mut ctx = Context::new(model);

    ctx.add_token(a, 1, 100).unwrap();
    ctx.add_token(b, 3, 100).unwrap();
    ctx.process().unwrap();

    let c_acts: Vec<_> = ctx.activations().filter(|act| act.neuron == c).collect();
    assert_eq!(c_acts.len(), 1);
    assert_eq!(c_acts[0].get_binding_signal(5), Some(100));
    assert_eq!(ctx.links().count(), 2);
}

#[test]
fn paired_latent_with_conflicting_tokens() {
    let (model, a, b, c) = build_paired_net();
    let mut ctx = Context::new(model);

    ctx.add_token(a, 1, 700).unwrap();
    ctx.add_token(b, 3, 701).unwrap();
    ctx.process().unwrap();

    assert!(ctx.activations().filter(|act| act.neuron == c).next().is_none());
    assert_eq!(ctx.links().count(), 0);
}

#[test]
fn convergent_transitions_same_target_slot() {
    let (model, a, b, c) = build_paired_net();
    let mut ctx = Context::new(model);

    ctx.add_token(a, 1, 600).unwrap();
    ctx.add_token(b, 3, 600).unwrap();
    ctx.process().unwrap();

    let c_acts: Vec<_> = ctx.activations().filter(|act| act.neuron == c).collect();
    assert_eq!(c_acts.len(), 1);
    assert_eq!(c_acts[0].get_binding_signal(5), Some(600));
    assert_eq!(ctx.links().count(), 2);
}

#[test]
fn propagation_without_matching_target() {
    let mut registry = TypeRegistry::new();
    let mut schema = NetSchema::new();

    let a_type = NeuronTypeBuilder::new(&mut registry, &mut schema, "A", ActivationKind::Disjunctive)
        .unwrap()
        .build();
    let b_type = NeuronTypeBuilder::new(&mut registry, &mut schema, "B", ActivationKind::Disjunctive)
        .unwrap()
        .build();
    registry.flatten_type_hierarchy().unwrap();

    let s = SynapseTypeBuilder::new(&mut registry, &mut schema, "S", a_type, b_type)
        .transition(0, 0)
        .propagable(true)
        .build();

    let model = Model::new(Arc::new(registry), Arc::new(schema), Config::default());
    let a = model.create_neuron(a_type);
    let b_neuron = model.create_neuron(b_type);
    model.connect_neurons(a, b_neuron, s).unwrap();

    let mut ctx = Context::new(model);
    ctx.add_token(a, 0, 1).unwrap();
    ctx.process().unwrap();

    assert_eq!(ctx.activations().filter(|act| act.neuron == b_neuron).count(), 1);
    assert_eq!(ctx.links().count(), 1);
}

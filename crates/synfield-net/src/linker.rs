//! The linker: turns a freshly fired activation into new links (and, for
//! propagable synapses with no existing target, new activations).
//!
//! This is the one piece of the engine with no single obvious home in the
//! teacher's own module layout, so it gets its own module, mirroring how
//! the original engine isolates linking from both `Neuron` and `Activation`
//! themselves.

use std::collections::HashSet;

use synfield_fields::ObjectId;

use crate::activation::{Link, LinkKey};
use crate::context::Context;
use crate::error::{NetError, Result};
use crate::ids::{ActivationId, NeuronId, SynapseId, TokenId};
use crate::neuron::Synapse;
use crate::schema::ActivationKind;

/// A target activation matches a desired signal vector iff, for every slot
/// present in both, the token is identical: no conflicting signal on a
/// shared slot.
fn matches_signal(candidate: &[Option<TokenId>], desired: &[Option<TokenId>]) -> bool {
    let len = candidate.len().min(desired.len());
    (0..len).all(|i| match (candidate[i], desired[i]) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    })
}

/// Merges two per-slot binding-signal vectors, returning `None` the moment
/// a shared slot disagrees between them (the pair-linking conflict check).
fn merge_binding_signals(a: &[Option<TokenId>], b: &[Option<TokenId>]) -> Option<Vec<Option<TokenId>>> {
    let len = a.len().max(b.len());
    let mut out = vec![None; len];
    for i in 0..len {
        let av = a.get(i).copied().flatten();
        let bv = b.get(i).copied().flatten();
        out[i] = match (av, bv) {
            (Some(x), Some(y)) if x == y => Some(x),
            (Some(_), Some(_)) => return None,
            (Some(x), None) => Some(x),
            (None, Some(y)) => Some(y),
            (None, None) => None,
        };
    }
    Some(out)
}

/// Every activation on `neuron` whose binding-signal vector has no conflict
/// with `bs_by_slot`. A direct scan over every activation in the context
/// rather than a lookup restricted to already-fired/registered activations
/// in the per-token `BindingSignal` index: paired latent linking (see
/// [`pair_linking`]) must be able to find a counterpart activation that
/// exists but has not yet fired (its own `Fired` step may simply not have
/// been popped yet), and a fired-only index would race against processing
/// order and risk materializing duplicate output activations for the exact
/// scenario the paired-linking design exists to serve.
fn collect_linking_targets(ctx: &Context, bs_by_slot: &[Option<TokenId>], neuron: NeuronId) -> Vec<ActivationId> {
    ctx.activations()
        .filter(|act| act.neuron == neuron && matches_signal(act.binding_signals(), bs_by_slot))
        .map(|act| act.id)
        .collect()
}

fn link_key(kind: ActivationKind, synapse: SynapseId, counterpart: ActivationId, bs: &[Option<TokenId>]) -> LinkKey {
    match kind {
        ActivationKind::Conjunctive => LinkKey::BySynapse(synapse, bs.iter().filter_map(|t| *t).collect()),
        ActivationKind::Disjunctive => LinkKey::ByActivation(counterpart),
        ActivationKind::Inhibitory => LinkKey::ByToken(bs.iter().filter_map(|t| *t).next().unwrap_or(0)),
    }
}

/// Creates a link for `synapse` between `input` and `output`, unless either
/// side's own link-key map already has an entry for it (the "no duplicate
/// links for a (synapse, input, output) triple" invariant). Returns whether
/// a link was actually created. Also wires field-graph propagation between
/// the two activations' backing objects when the synapse type names a
/// `field_relation`.
fn create_link(ctx: &mut Context, synapse: &Synapse, input: ActivationId, output: ActivationId) -> Result<bool> {
    let (out_kind, out_bs) = {
        let o = ctx
            .activation(output)
            .ok_or_else(|| NetError::missing_activation(output))?;
        (o.kind, o.binding_signals().to_vec())
    };
    let (in_kind, in_bs) = {
        let i = ctx
            .activation(input)
            .ok_or_else(|| NetError::missing_activation(input))?;
        (i.kind, i.binding_signals().to_vec())
    };
    let key_in = link_key(out_kind, synapse.id, input, &out_bs);
    let key_out = link_key(in_kind, synapse.id, output, &in_bs);

    let duplicate = ctx.activation(output).unwrap().has_input_link(&key_in)
        || ctx.activation(input).unwrap().has_output_link(&key_out);
    if duplicate {
        return Ok(false);
    }

    let id = ctx.next_link_id();
    let link = Link {
        id,
        synapse_type: synapse.synapse_type,
        synapse: synapse.id,
        input,
        output,
    };
    ctx.links_map_mut().insert(id, link);
    ctx.activation_mut(output).unwrap().add_input_link(key_in, id);
    ctx.activation_mut(input).unwrap().add_output_link(key_out, id);

    let field_relation = ctx
        .model()
        .net_schema
        .synapse_type(synapse.synapse_type)
        .field_relation;
    if let Some(relation) = field_relation {
        ctx.field_graph_mut()
            .connect(ObjectId(input.0), relation, ObjectId(output.0))?;
    }
    Ok(true)
}

/// `s.output.create_activation(parent=None, ctx, out_bs)` followed by the
/// new link and a pass of `link_incoming` to fill in any other inputs the
/// fresh activation's own synapses can already satisfy.
fn propagate(ctx: &mut Context, a: ActivationId, synapse: &Synapse, out_bs: Vec<Option<TokenId>>) -> Result<()> {
    let o = ctx.create_activation(synapse.output_neuron, None, out_bs)?;
    create_link(ctx, synapse, a, o)?;
    link_incoming(ctx, o, Some(a))
}

/// For each input synapse of `o`'s neuron, maps `o`'s binding signals
/// backward across that synapse's transitions and links in every matching
/// candidate other than `excluded`.
fn link_incoming(ctx: &mut Context, o: ActivationId, excluded: Option<ActivationId>) -> Result<()> {
    let neuron = ctx.activation(o).ok_or_else(|| NetError::missing_activation(o))?.neuron;
    let synapses: Vec<Synapse> = {
        let n = ctx.model().neuron(neuron)?;
        let guard = n.read();
        guard.input_synapses().cloned().collect()
    };
    for synapse in &synapses {
        let stype = ctx.model().net_schema.synapse_type(synapse.synapse_type);
        let o_bs = ctx.activation(o).unwrap().binding_signals().to_vec();
        let in_slots = ctx.model().net_schema.neuron_type(stype.input_neuron_type).num_bs_slots;
        let in_bs = stype.transitions.apply_backward(&o_bs, in_slots);
        let candidates = collect_linking_targets(ctx, &in_bs, synapse.input_neuron);
        for i in candidates {
            if Some(i) == excluded {
                continue;
            }
            create_link(ctx, synapse, i, o)?;
        }
    }
    Ok(())
}

/// Latent (paired) linking: `s1`'s output only makes sense once its paired
/// synapse's input also exists, so the output activation is found-or-
/// created and both links attached atomically rather than risking a
/// half-populated input set.
fn pair_linking(ctx: &mut Context, a1: ActivationId, s1: &Synapse) -> Result<()> {
    let s1_type_id = s1.synapse_type;
    let (pair_type, pair_bs_slot) = {
        let def = ctx.model().net_schema.synapse_type(s1_type_id);
        (def.pair_synapse_type, def.pair_binding_signal_slot)
    };
    let Some(pair_type) = pair_type else {
        return Ok(());
    };

    let s2 = {
        let out_n = ctx.model().neuron(s1.output_neuron)?;
        let guard = out_n.read();
        guard
            .input_synapses()
            .find(|s| s.synapse_type == pair_type)
            .cloned()
    };
    let Some(s2) = s2 else {
        return Ok(());
    };
    let n2 = s2.input_neuron;

    let a1_bs = ctx
        .activation(a1)
        .ok_or_else(|| NetError::missing_activation(a1))?
        .binding_signals()
        .to_vec();

    let candidates: Vec<ActivationId> = match pair_bs_slot {
        Some(out_slot) => {
            let s1_type = ctx.model().net_schema.synapse_type(s1_type_id);
            match s1_type.transitions.backward(out_slot).and_then(|in_slot| a1_bs.get(in_slot).copied().flatten())
            {
                Some(token) => ctx
                    .binding_signal(token)
                    .map(|bs| bs.get_activations(n2).to_vec())
                    .unwrap_or_default(),
                None => Vec::new(),
            }
        }
        None => ctx.activations().filter(|a| a.neuron == n2).map(|a| a.id).collect(),
    };

    let output_neuron_type = ctx.model().net_schema.synapse_type(s1_type_id).output_neuron_type;
    let out_slots = ctx.model().net_schema.neuron_type(output_neuron_type).num_bs_slots;

    for a2 in candidates {
        if a2 == a1 {
            continue;
        }
        let a2_bs = ctx
            .activation(a2)
            .ok_or_else(|| NetError::missing_activation(a2))?
            .binding_signals()
            .to_vec();

        let s1_type = ctx.model().net_schema.synapse_type(s1_type_id);
        let from1 = s1_type.transitions.apply_forward(&a1_bs, out_slots);
        let s2_type = ctx.model().net_schema.synapse_type(s2.synapse_type);
        let from2 = s2_type.transitions.apply_forward(&a2_bs, out_slots);

        let Some(merged) = merge_binding_signals(&from1, &from2) else {
            continue;
        };

        let existing = collect_linking_targets(ctx, &merged, s1.output_neuron);
        let o = match existing.first() {
            Some(&id) => id,
            None => ctx.create_activation(s1.output_neuron, None, merged)?,
        };
        create_link(ctx, s1, a1, o)?;
        create_link(ctx, &s2, a2, o)?;
    }
    Ok(())
}

/// Entry point: called on an activation that has just fired.
pub fn link_outgoing(ctx: &mut Context, a: ActivationId) -> Result<()> {
    let neuron = ctx.activation(a).ok_or_else(|| NetError::missing_activation(a))?.neuron;
    // `Neuron::wakeup_propagable` is a structural no-op in this engine (no
    // persistence layer to rehydrate from); every registered neuron is
    // always resident, so there is nothing to call here beyond the comment.
    let synapses: Vec<Synapse> = {
        let n = ctx.model().neuron(neuron)?;
        let guard = n.read();
        guard.output_synapses().cloned().collect()
    };

    for synapse in &synapses {
        let allow_latent_linking = ctx
            .model()
            .net_schema
            .synapse_type(synapse.synapse_type)
            .allow_latent_linking;
        if allow_latent_linking {
            pair_linking(ctx, a, synapse)?;
            continue;
        }

        let (out_bs, propagable) = {
            let stype = ctx.model().net_schema.synapse_type(synapse.synapse_type);
            let out_neuron_type = ctx.model().net_schema.neuron_type(stype.output_neuron_type);
            let act_bs = ctx.activation(a).unwrap().binding_signals().to_vec();
            (
                stype.transitions.apply_forward(&act_bs, out_neuron_type.num_bs_slots),
                synapse.propagable,
            )
        };
        if out_bs.iter().all(Option::is_none) {
            continue;
        }

        let targets = collect_linking_targets(ctx, &out_bs, synapse.output_neuron);
        let had_targets = !targets.is_empty();
        let target_set: HashSet<ActivationId> = targets.into_iter().collect();
        for t in target_set {
            create_link(ctx, synapse, a, t)?;
        }
        if !had_targets && propagable {
            propagate(ctx, a, synapse, out_bs)?;
        }
    }
    Ok(())
}

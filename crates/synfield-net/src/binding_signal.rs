//! Binding signals and the slot transitions that thread them through
//! synapses.

use std::collections::HashMap;

use crate::ids::{ActivationId, NeuronId, TokenId};

/// An immutable `(fromSlot -> toSlot)` mapping declared on a synapse type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: usize,
    pub to: usize,
}

impl Transition {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }
}

/// The set of transitions a synapse type owns, indexed both forward and
/// backward for `link_outgoing`/`link_incoming`.
#[derive(Debug, Clone, Default)]
pub struct TransitionSet {
    transitions: Vec<Transition>,
    forward: HashMap<usize, usize>,
    backward: HashMap<usize, usize>,
}

impl TransitionSet {
    pub fn new(transitions: Vec<Transition>) -> Self {
        let mut forward = HashMap::new();
        let mut backward = HashMap::new();
        for t in &transitions {
            forward.insert(t.from, t.to);
            backward.insert(t.to, t.from);
        }
        Self {
            transitions,
            forward,
            backward,
        }
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Maps a slot on the input side to its counterpart on the output side.
    pub fn forward(&self, slot: usize) -> Option<usize> {
        self.forward.get(&slot).copied()
    }

    /// Maps a slot on the output side back to its counterpart on the
    /// input side.
    pub fn backward(&self, slot: usize) -> Option<usize> {
        self.backward.get(&slot).copied()
    }

    /// Given a full per-slot binding signal vector on the input side,
    /// produces the corresponding vector on the output side, `None` where
    /// no transition names that output slot.
    pub fn apply_forward(&self, input_bs: &[Option<TokenId>], output_slots: usize) -> Vec<Option<TokenId>> {
        let mut out = vec![None; output_slots];
        for t in &self.transitions {
            if let Some(Some(tok)) = input_bs.get(t.from) {
                if t.to < out.len() {
                    out[t.to] = Some(*tok);
                }
            }
        }
        out
    }

    pub fn apply_backward(&self, output_bs: &[Option<TokenId>], input_slots: usize) -> Vec<Option<TokenId>> {
        let mut out = vec![None; input_slots];
        for t in &self.transitions {
            if let Some(Some(tok)) = output_bs.get(t.to) {
                if t.from < out.len() {
                    out[t.from] = Some(*tok);
                }
            }
        }
        out
    }
}

/// A symbolic token threaded through the activation network, scoped to one
/// [`crate::context::Context`]. Acts as an inverted index: "which
/// activations (grouped by neuron) already carry me."
#[derive(Debug, Default)]
pub struct BindingSignal {
    token_id: TokenId,
    by_neuron: HashMap<NeuronId, Vec<ActivationId>>,
}

impl BindingSignal {
    pub fn new(token_id: TokenId) -> Self {
        Self {
            token_id,
            by_neuron: HashMap::new(),
        }
    }

    pub fn token_id(&self) -> TokenId {
        self.token_id
    }

    pub fn add_activation(&mut self, neuron: NeuronId, activation: ActivationId) {
        let v = self.by_neuron.entry(neuron).or_default();
        if !v.contains(&activation) {
            v.push(activation);
        }
    }

    pub fn get_activations(&self, neuron: NeuronId) -> &[ActivationId] {
        self.by_neuron.get(&neuron).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Forward then backward is the identity: `transition_forward` composed with
        /// `transition_backward` is the identity on the domain of slots a
        /// synapse's transitions name, for any injective (no two
        /// transitions sharing a `from` or a `to`) transition set.
        #[test]
        fn forward_then_backward_is_identity_for_injective_transitions(
            pairs in proptest::sample::subsequence((0usize..8).collect::<Vec<_>>(), 0..8)
                .prop_flat_map(|froms| {
                    let n = froms.len();
                    proptest::sample::subsequence((0usize..8).collect::<Vec<_>>(), n)
                        .prop_map(move |tos| froms.clone().into_iter().zip(tos).collect::<Vec<_>>())
                }),
            token in 0u64..1000,
        ) {
            let transitions: Vec<Transition> = pairs.iter().map(|&(f, t)| Transition::new(f, t)).collect();
            let ts = TransitionSet::new(transitions);

            for &(from, to) in &pairs {
                let mut input_bs = vec![None; 8];
                input_bs[from] = Some(token);
                let forward = ts.apply_forward(&input_bs, 8);
                prop_assert_eq!(forward[to], Some(token));
                let backward = ts.apply_backward(&forward, 8);
                prop_assert_eq!(backward[from], Some(token));
            }
        }
    }

    #[test]
    fn forward_backward_roundtrip_on_named_slots() {
        let ts = TransitionSet::new(vec![Transition::new(1, 5), Transition::new(3, 5)]);
        let input_bs = vec![None, Some(42), None, Some(99)];
        let out = ts.apply_forward(&input_bs, 6);
        // Both transitions target slot 5; last-writer wins for a
        // conflict-free test fixture we control here (1 then 3).
        assert!(out[5].is_some());
        let back = ts.apply_backward(&out, 4);
        // slot 1 or 3 (whichever transition filled slot 5) is recoverable.
        assert!(back[1].is_some() || back[3].is_some());
    }

    #[test]
    fn binding_signal_indexes_by_neuron() {
        let mut bs = BindingSignal::new(7);
        bs.add_activation(NeuronId(1), ActivationId(10));
        bs.add_activation(NeuronId(1), ActivationId(11));
        bs.add_activation(NeuronId(2), ActivationId(20));
        assert_eq!(bs.get_activations(NeuronId(1)).len(), 2);
        assert_eq!(bs.get_activations(NeuronId(2)), &[ActivationId(20)]);
        assert!(bs.get_activations(NeuronId(3)).is_empty());
    }
}

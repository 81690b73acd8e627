//! Process-wide neuron and synapse runtime state.

use std::collections::{HashMap, HashSet};

use smallvec::SmallVec;

use crate::ids::{NeuronId, NeuronTypeId, SynapseId, SynapseTypeId};

/// How many references of a given kind currently pin a neuron resident.
/// Eviction bookkeeping only; this engine never actually evicts (no
/// persistence layer), but the counters are kept so the invariant from the
/// original design is checkable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefType {
    Synapse,
    Context,
    Propagable,
}

/// A synapse: an edge in the neuron graph, owned by its output neuron's
/// input-synapse map and mirrored into the input neuron's output-synapse
/// map.
#[derive(Debug, Clone)]
pub struct Synapse {
    pub id: SynapseId,
    pub synapse_type: SynapseTypeId,
    pub input_neuron: NeuronId,
    pub output_neuron: NeuronId,
    pub propagable: bool,
}

/// A process-wide actor in the activation network. Shared across every
/// `Context` that references it; callers wrap this behind
/// `Arc<parking_lot::RwLock<Neuron>>` (see [`crate::model::Model`]) so a
/// single lock guards both synapse maps per the engine's concurrency
/// model.
#[derive(Debug)]
pub struct Neuron {
    pub id: NeuronId,
    pub neuron_type: NeuronTypeId,
    /// Keyed by local synapse id, unique within this (output) neuron.
    input_synapses: HashMap<SynapseId, Synapse>,
    /// Keyed by the downstream neuron id. A given neuron pair usually
    /// carries exactly one synapse, so the common case stays inline.
    output_synapses: HashMap<NeuronId, SmallVec<[Synapse; 1]>>,
    propagable: HashSet<NeuronId>,
    next_synapse_id: u64,
    ref_counts: HashMap<RefType, i64>,
    pub last_used: i64,
    pub modified: bool,
}

impl Neuron {
    pub fn new(id: NeuronId, neuron_type: NeuronTypeId) -> Self {
        Self {
            id,
            neuron_type,
            input_synapses: HashMap::new(),
            output_synapses: HashMap::new(),
            propagable: HashSet::new(),
            next_synapse_id: 0,
            ref_counts: HashMap::new(),
            last_used: 0,
            modified: false,
        }
    }

    /// Creates a synapse from `self` to `output_neuron`, storing it on
    /// `self`'s output-synapse map; the caller is responsible for also
    /// registering it on `output_neuron`'s input-synapse map (it lives on
    /// a different `Neuron` instance and therefore a different lock).
    pub fn next_synapse_id(&mut self) -> SynapseId {
        let id = SynapseId(self.next_synapse_id);
        self.next_synapse_id += 1;
        id
    }

    pub fn add_input_synapse(&mut self, synapse: Synapse) {
        self.input_synapses.insert(synapse.id, synapse);
    }

    pub fn add_output_synapse(&mut self, synapse: Synapse) {
        self.output_synapses
            .entry(synapse.output_neuron)
            .or_default()
            .push(synapse);
    }

    pub fn input_synapses(&self) -> impl Iterator<Item = &Synapse> {
        self.input_synapses.values()
    }

    pub fn output_synapses(&self) -> impl Iterator<Item = &Synapse> {
        self.output_synapses.values().flatten()
    }

    pub fn input_synapse(&self, id: SynapseId) -> Option<&Synapse> {
        self.input_synapses.get(&id)
    }

    pub fn mark_propagable(&mut self, target: NeuronId) {
        self.propagable.insert(target);
    }

    pub fn propagable_targets(&self) -> impl Iterator<Item = &NeuronId> {
        self.propagable.iter()
    }

    pub fn incr_ref(&mut self, ty: RefType) {
        *self.ref_counts.entry(ty).or_insert(0) += 1;
    }

    pub fn decr_ref(&mut self, ty: RefType) {
        if let Some(c) = self.ref_counts.get_mut(&ty) {
            *c -= 1;
        }
    }

    pub fn total_refs(&self) -> i64 {
        self.ref_counts.values().sum()
    }
}

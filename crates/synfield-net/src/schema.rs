//! Schema-level declarations: neuron types and synapse types.
//!
//! A [`NeuronTypeDef`] pairs a field-graph [`synfield_fields::TypeId`] (the
//! shape of an activation's numeric fields) with the activation-network
//! specific bits (its link-key strategy and binding-signal slot count). A
//! [`SynapseTypeDef`] likewise folds in what the distilled spec calls a
//! `LinkType`: the same object handles both the schema-time synapse
//! declaration and the per-instance link's typing, since every link is
//! produced by exactly one synapse type.

use synfield_fields::{FieldId, RelationId, TypeId as FieldTypeId};

use crate::binding_signal::TransitionSet;
use crate::ids::{NeuronTypeId, SynapseTypeId};

/// Which link-key strategy an activation of this type uses, and therefore
/// how `Linker::link_incoming` behaves for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationKind {
    /// Input-link key is the synapse id (+ distinguishing binding signals);
    /// `link_incoming` actively searches for matching inputs.
    Conjunctive,
    /// Input-link key is the upstream activation id; incoming linking is a
    /// no-op (driven entirely by the upstream's outgoing propagation).
    Disjunctive,
    /// Both input and output keys are the wildcard-bound token id.
    Inhibitory,
}

#[derive(Debug)]
pub struct NeuronTypeDef {
    pub id: NeuronTypeId,
    pub name: String,
    pub field_type: FieldTypeId,
    pub kind: ActivationKind,
    pub num_bs_slots: usize,
    /// The field whose value is checked against `threshold` to decide
    /// whether an activation of this type should fire. `None` means this
    /// neuron type never fires on its own (e.g. a pure source neuron).
    pub net_field: Option<FieldId>,
    pub threshold: f64,
}

#[derive(Debug)]
pub struct SynapseTypeDef {
    pub id: SynapseTypeId,
    pub name: String,
    pub input_neuron_type: NeuronTypeId,
    pub output_neuron_type: NeuronTypeId,
    pub transitions: TransitionSet,
    pub allow_latent_linking: bool,
    pub pair_synapse_type: Option<SynapseTypeId>,
    pub pair_binding_signal_slot: Option<usize>,
    pub propagable: bool,
    /// The field-graph relation a link of this synapse type connects its
    /// two activations across, so field propagation follows the same edge
    /// the binding-signal transitions travel. `None` for synapse types
    /// that only carry binding signals and do no field propagation.
    pub field_relation: Option<RelationId>,
}

/// Owns every declared [`NeuronTypeDef`] and [`SynapseTypeDef`]. Lives
/// inside the [`crate::model::Model`] alongside the field graph's
/// `TypeRegistry`, analogous to how `TypeRegistry` owns `Type`s.
#[derive(Debug, Default)]
pub struct NetSchema {
    neuron_types: Vec<NeuronTypeDef>,
    synapse_types: Vec<SynapseTypeDef>,
}

impl NetSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_neuron_type(
        &mut self,
        name: impl Into<String>,
        field_type: FieldTypeId,
        kind: ActivationKind,
        num_bs_slots: usize,
    ) -> NeuronTypeId {
        let id = NeuronTypeId(self.neuron_types.len() as u32);
        self.neuron_types.push(NeuronTypeDef {
            id,
            name: name.into(),
            field_type,
            kind,
            num_bs_slots,
            net_field: None,
            threshold: 0.0,
        });
        id
    }

    pub fn neuron_type(&self, id: NeuronTypeId) -> &NeuronTypeDef {
        &self.neuron_types[id.0 as usize]
    }

    /// Declares which field is checked against a threshold to decide
    /// whether an activation of this type fires.
    pub fn set_firing(&mut self, id: NeuronTypeId, net_field: FieldId, threshold: f64) {
        let def = &mut self.neuron_types[id.0 as usize];
        def.net_field = Some(net_field);
        def.threshold = threshold;
    }

    #[allow(clippy::too_many_arguments)]
    pub fn declare_synapse_type(
        &mut self,
        name: impl Into<String>,
        input_neuron_type: NeuronTypeId,
        output_neuron_type: NeuronTypeId,
        transitions: TransitionSet,
        allow_latent_linking: bool,
        pair_synapse_type: Option<SynapseTypeId>,
        pair_binding_signal_slot: Option<usize>,
        propagable: bool,
        field_relation: Option<RelationId>,
    ) -> SynapseTypeId {
        let id = SynapseTypeId(self.synapse_types.len() as u32);
        self.synapse_types.push(SynapseTypeDef {
            id,
            name: name.into(),
            input_neuron_type,
            output_neuron_type,
            transitions,
            allow_latent_linking,
            pair_synapse_type,
            pair_binding_signal_slot,
            propagable,
            field_relation,
        });
        id
    }

    pub fn synapse_type(&self, id: SynapseTypeId) -> &SynapseTypeDef {
        &self.synapse_types[id.0 as usize]
    }

    /// Declares the reverse pairing link between two previously declared
    /// synapse types, used for latent (paired) linking (see
    /// `crate::linker::pair_linking`).
    pub fn pair_synapse_types(&mut self, a: SynapseTypeId, b: SynapseTypeId) {
        self.synapse_types[a.0 as usize].pair_synapse_type = Some(b);
        self.synapse_types[b.0 as usize].pair_synapse_type = Some(a);
    }

    pub fn synapse_types_from(&self, neuron_type: NeuronTypeId) -> impl Iterator<Item = &SynapseTypeDef> {
        self.synapse_types
            .iter()
            .filter(move |s| s.input_neuron_type == neuron_type)
    }

    pub fn synapse_types_to(&self, neuron_type: NeuronTypeId) -> impl Iterator<Item = &SynapseTypeDef> {
        self.synapse_types
            .iter()
            .filter(move |s| s.output_neuron_type == neuron_type)
    }

    /// Every declared neuron type, in declaration order. Used by `synfield-cli`'s
    /// `schema describe` to print a schema summary without needing id
    /// enumeration logic of its own.
    pub fn neuron_types(&self) -> impl Iterator<Item = &NeuronTypeDef> {
        self.neuron_types.iter()
    }

    pub fn synapse_types(&self) -> impl Iterator<Item = &SynapseTypeDef> {
        self.synapse_types.iter()
    }
}

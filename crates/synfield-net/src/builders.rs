//! Fluent builders over [`synfield_fields::TypeRegistry`] and
//! [`NetSchema`], mirroring the distilled spec's `NeuronTypeBuilder` /
//! `SynapseTypeBuilder` lineage (the one lineage the spec picks over the
//! older, parallel `*Definition` builders).

use synfield_fields::{
    FieldFunction, FieldId, RelationId, RelationKind, Result as FieldsResult, TypeId as FieldTypeId,
    TypeRegistry,
};

use crate::binding_signal::{Transition, TransitionSet};
use crate::ids::{NeuronTypeId, SynapseTypeId};
use crate::schema::{ActivationKind, NetSchema};

/// Declares a neuron type: its backing field-graph `Type` plus the
/// activation-network specifics (link-key strategy, binding-signal slot
/// count).
pub struct NeuronTypeBuilder<'a> {
    registry: &'a mut TypeRegistry,
    schema: &'a mut NetSchema,
    name: String,
    field_type: FieldTypeId,
    kind: ActivationKind,
    num_bs_slots: usize,
    firing: Option<(FieldId, f64)>,
}

impl<'a> NeuronTypeBuilder<'a> {
    /// Declares the backing field type eagerly, so `field`/`input_field`
    /// can be called in any order before `build`.
    pub fn new(
        registry: &'a mut TypeRegistry,
        schema: &'a mut NetSchema,
        name: impl Into<String>,
        kind: ActivationKind,
    ) -> FieldsResult<Self> {
        let name = name.into();
        let field_type = registry.declare_type(name.clone())?;
        Ok(Self {
            registry,
            schema,
            name,
            field_type,
            kind,
            num_bs_slots: 1,
            firing: None,
        })
    }

    pub fn num_bs_slots(mut self, n: usize) -> Self {
        self.num_bs_slots = n;
        self
    }

    /// Declares which field is checked against `threshold` to decide
    /// whether an activation of this type fires.
    pub fn firing(mut self, net_field: FieldId, threshold: f64) -> Self {
        self.firing = Some((net_field, threshold));
        self
    }

    pub fn field_type(&self) -> FieldTypeId {
        self.field_type
    }

    /// Declares the field (e.g. an input/source field, or a net-input
    /// accumulator) directly on the underlying field type.
    pub fn field(
        &mut self,
        name: impl Into<String>,
        num_args: usize,
        function: Box<dyn FieldFunction>,
    ) -> FieldsResult<FieldId> {
        self.registry.declare_field(self.field_type, name, num_args, function)
    }

    pub fn input_field(&mut self, name: impl Into<String>) -> FieldsResult<FieldId> {
        self.registry.declare_input_field(self.field_type, name)
    }

    pub fn build(self) -> NeuronTypeId {
        let id = self
            .schema
            .declare_neuron_type(self.name, self.field_type, self.kind, self.num_bs_slots);
        if let Some((field, threshold)) = self.firing {
            self.schema.set_firing(id, field, threshold);
        }
        id
    }
}

/// Declares a synapse type connecting two neuron types across a
/// relation, with its binding-signal transitions and latent-linking
/// configuration.
pub struct SynapseTypeBuilder<'a> {
    registry: &'a mut TypeRegistry,
    schema: &'a mut NetSchema,
    name: String,
    input_neuron_type: NeuronTypeId,
    output_neuron_type: NeuronTypeId,
    transitions: Vec<Transition>,
    allow_latent_linking: bool,
    pair_binding_signal_slot: Option<usize>,
    propagable: bool,
    field_relation: Option<RelationId>,
}

impl<'a> SynapseTypeBuilder<'a> {
    pub fn new(
        registry: &'a mut TypeRegistry,
        schema: &'a mut NetSchema,
        name: impl Into<String>,
        input_neuron_type: NeuronTypeId,
        output_neuron_type: NeuronTypeId,
    ) -> Self {
        Self {
            registry,
            schema,
            name: name.into(),
            input_neuron_type,
            output_neuron_type,
            transitions: Vec::new(),
            allow_latent_linking: false,
            pair_binding_signal_slot: None,
            propagable: false,
            field_relation: None,
        }
    }

    pub fn transition(mut self, from: usize, to: usize) -> Self {
        self.transitions.push(Transition::new(from, to));
        self
    }

    pub fn latent_linking(mut self, pair_bs_slot: Option<usize>) -> Self {
        self.allow_latent_linking = true;
        self.pair_binding_signal_slot = pair_bs_slot;
        self
    }

    pub fn propagable(mut self, yes: bool) -> Self {
        self.propagable = yes;
        self
    }

    /// Links the two field-level net-input fields across `relation` so
    /// value propagation follows the same edge the binding-signal
    /// transitions travel. Records `relation` as this synapse type's
    /// `field_relation` unless one was already set explicitly.
    pub fn link_fields(
        mut self,
        relation: RelationId,
        output_field: FieldId,
        input_field: FieldId,
        argument: usize,
    ) -> FieldsResult<Self> {
        self.registry.link(relation, output_field, input_field, argument)?;
        if self.field_relation.is_none() {
            self.field_relation = Some(relation);
        }
        Ok(self)
    }

    /// Explicitly sets the field-graph relation a link of this synapse
    /// type connects its activations across, overriding any relation
    /// inferred from [`Self::link_fields`].
    pub fn field_relation(mut self, relation: RelationId) -> Self {
        self.field_relation = Some(relation);
        self
    }

    pub fn build(self) -> SynapseTypeId {
        let transitions = TransitionSet::new(self.transitions);
        self.schema.declare_synapse_type(
            self.name,
            self.input_neuron_type,
            self.output_neuron_type,
            transitions,
            self.allow_latent_linking,
            None,
            self.pair_binding_signal_slot,
            self.propagable,
            self.field_relation,
        )
    }
}

/// Declares a one/many/self relation between two neuron types' backing
/// field types: a thin convenience over [`TypeRegistry::declare_relation`].
pub fn declare_field_relation(
    registry: &mut TypeRegistry,
    owner: FieldTypeId,
    name: impl Into<String>,
    kind: RelationKind,
    target: FieldTypeId,
) -> FieldsResult<synfield_fields::RelationId> {
    registry.declare_relation(owner, name, kind, target)
}

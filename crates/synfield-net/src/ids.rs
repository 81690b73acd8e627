//! Identifiers for the activation network's schema and runtime objects.

use core::fmt;

/// Process-wide, minted by the [`crate::model::Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NeuronId(pub u64);

impl fmt::Display for NeuronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Neuron({})", self.0)
    }
}

/// Local to the owning neuron: two synapses on different neurons may share
/// the same `SynapseId`. Use [`SynapseRef`] to name a synapse globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SynapseId(pub u64);

impl fmt::Display for SynapseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Synapse({})", self.0)
    }
}

/// Globally identifies a synapse by the neuron that owns its id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SynapseRef {
    pub owner: NeuronId,
    pub id: SynapseId,
}

impl fmt::Display for SynapseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.id)
    }
}

/// Schema-level identifier for a declared neuron type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NeuronTypeId(pub u32);

impl fmt::Display for NeuronTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NeuronType({})", self.0)
    }
}

/// Schema-level identifier for a declared synapse type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SynapseTypeId(pub u32);

impl fmt::Display for SynapseTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SynapseType({})", self.0)
    }
}

/// Unique within one [`crate::context::Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActivationId(pub u64);

impl fmt::Display for ActivationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Activation({})", self.0)
    }
}

/// Unique within one [`crate::context::Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId(pub u64);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Link({})", self.0)
    }
}

/// A binding signal's identity: a symbolic token id scoped to one Context.
pub type TokenId = i64;

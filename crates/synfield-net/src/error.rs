//! Error types for the activation network layer.

use thiserror::Error;

use synfield_fields::FieldsError;

use crate::ids::{ActivationId, NeuronId};

#[derive(Debug, Error)]
pub enum NetError {
    #[error(transparent)]
    Fields(#[from] FieldsError),

    /// Retrieval of a neuron id that isn't in the model's registry.
    #[error("no such neuron: {0}")]
    MissingNeuron(NeuronId),

    /// Retrieval of an activation id that isn't in the context.
    #[error("no such activation: {0}")]
    MissingActivation(ActivationId),

    /// Reserved for a wrapped I/O error from a persistence layer; this
    /// engine has no persistence layer, so nothing in-crate constructs
    /// this variant today.
    #[error("neuron serialization failed: {0}")]
    NeuronSerialization(String),

    /// Wraps an underlying lock acquisition failure.
    #[error("lock error: {0}")]
    Lock(String),
}

impl NetError {
    pub fn missing_neuron(id: NeuronId) -> Self {
        Self::MissingNeuron(id)
    }

    pub fn missing_activation(id: ActivationId) -> Self {
        Self::MissingActivation(id)
    }

    pub fn lock(what: impl Into<String>) -> Self {
        Self::Lock(what.into())
    }
}

pub type Result<T> = std::result::Result<T, NetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_neuron_message_includes_id() {
        let e = NetError::missing_neuron(NeuronId(42));
        assert!(e.to_string().contains("42"));
    }

    #[test]
    fn wraps_fields_error() {
        let fe = FieldsError::logic("boom");
        let ne: NetError = fe.into();
        assert!(matches!(ne, NetError::Fields(_)));
    }
}

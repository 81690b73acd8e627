//! The process-wide model: neuron registry, id minting, and configuration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use synfield_fields::TypeRegistry;

use crate::error::{NetError, Result};
use crate::ids::{NeuronId, NeuronTypeId, SynapseId, SynapseTypeId};
use crate::neuron::{Neuron, Synapse};
use crate::schema::NetSchema;

/// Runtime-tunable knobs, mirroring the original engine's enumerated
/// configuration surface.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Moving-average decay applied to counting statistics.
    pub alpha: f64,
    pub learn_rate: f64,
    pub training_enabled: bool,
    pub counting_enabled: bool,
    /// How many documents/contexts a neuron may go unused before it
    /// becomes eligible for eviction.
    pub neuron_provider_retention: i64,
    /// Wall-clock milliseconds a single `Queue::process` call may run.
    pub timeout: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alpha: 0.99,
            learn_rate: 0.001,
            training_enabled: false,
            counting_enabled: false,
            neuron_provider_retention: 10,
            timeout: 10_000,
        }
    }
}

/// Process-wide owner of the neuron graph, shared across every
/// [`crate::context::Context`] via `Arc`. Holds the `TypeRegistry` (field
/// schema) and `NetSchema` (neuron/synapse schema) the engine was built
/// from, plus every `Neuron` instance and its id counter.
pub struct Model {
    pub field_registry: Arc<TypeRegistry>,
    pub net_schema: Arc<NetSchema>,
    neurons: RwLock<HashMap<NeuronId, Arc<RwLock<Neuron>>>>,
    next_neuron_id: AtomicU64,
    /// Guards the neuron map during structural changes (create/evict);
    /// separate from each neuron's own lock per the engine's concurrency
    /// model.
    neuron_map_lock: Mutex<()>,
    pub config: Config,
}

impl Model {
    pub fn new(field_registry: Arc<TypeRegistry>, net_schema: Arc<NetSchema>, config: Config) -> Arc<Self> {
        Arc::new(Self {
            field_registry,
            net_schema,
            neurons: RwLock::new(HashMap::new()),
            next_neuron_id: AtomicU64::new(0),
            neuron_map_lock: Mutex::new(()),
            config,
        })
    }

    /// Mirrors the schema-construction-vs-inference boundary: `create`
    /// selects whether this call may declare new neurons (schema build) or
    /// must only open a context against an already-built model.
    pub fn open(self: &Arc<Self>, _create: bool) -> Arc<Self> {
        Arc::clone(self)
    }

    pub fn create_neuron(&self, neuron_type: NeuronTypeId) -> NeuronId {
        let _guard = self.neuron_map_lock.lock();
        let id = NeuronId(self.next_neuron_id.fetch_add(1, Ordering::SeqCst));
        let neuron = Arc::new(RwLock::new(Neuron::new(id, neuron_type)));
        self.neurons.write().insert(id, neuron);
        debug!(%id, "created neuron");
        id
    }

    pub fn neuron(&self, id: NeuronId) -> Result<Arc<RwLock<Neuron>>> {
        self.neurons
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| NetError::missing_neuron(id))
    }

    pub fn neuron_ids(&self) -> Vec<NeuronId> {
        self.neurons.read().keys().copied().collect()
    }

    /// Instantiates a synapse of `synapse_type` between two already-created
    /// neurons, storing it at the output neuron's input-synapse map (its
    /// authoritative holder) and mirroring it into the input neuron's
    /// output-synapse map. `propagable` defaults to the synapse type's own
    /// flag; pass an explicit override only when a particular instance
    /// should diverge from its type (unused by the demo schemas, kept for
    /// API parity with the original design's per-synapse override).
    pub fn connect_neurons(
        &self,
        input_neuron: NeuronId,
        output_neuron: NeuronId,
        synapse_type: SynapseTypeId,
    ) -> Result<SynapseId> {
        let input_arc = self.neuron(input_neuron)?;
        let output_arc = self.neuron(output_neuron)?;
        let propagable = self.net_schema.synapse_type(synapse_type).propagable;
        let id = output_arc.write().next_synapse_id();
        let synapse = Synapse {
            id,
            synapse_type,
            input_neuron,
            output_neuron,
            propagable,
        };
        output_arc.write().add_input_synapse(synapse.clone());
        input_arc.write().add_output_synapse(synapse);
        debug!(%input_neuron, %output_neuron, %synapse_type, "connected neurons");
        Ok(id)
    }
}

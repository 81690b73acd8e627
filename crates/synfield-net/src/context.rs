//! A per-inference-session [`Context`]: the activation network's runtime
//! state layered on top of a [`FieldGraph`], plus the scheduler that
//! interleaves deferred field updates with `Fired` steps.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use synfield_fields::{FieldGraph, FieldId, ObjectId, ProcessingPhase, SchedulableStep, Scheduler, UpdateEffect};

use crate::activation::Activation;
use crate::binding_signal::BindingSignal;
use crate::error::{NetError, Result};
use crate::ids::{ActivationId, LinkId, NeuronId, TokenId};
use crate::linker;
use crate::model::Model;

use std::sync::Arc;

/// A step in a [`Context`]'s own scheduler. Two kinds share one ordering
/// discipline: a deferred field commit (mirrors `synfield_fields`'s
/// `FieldUpdate`, keyed by the pending step id the field graph minted) and
/// an activation's `Fired` step, sorted by a quantized net-input value.
#[derive(Debug, Clone)]
pub enum NetStep {
    FieldUpdate {
        /// The id `PendingUpdates` minted for this field; *not* the id this
        /// scheduler assigns via `add_step`.
        step_id: u64,
        phase: ProcessingPhase,
        sort_value: i64,
        wants_next_round: bool,
    },
    Fired {
        activation: ActivationId,
        sort_value: i64,
    },
}

impl SchedulableStep for NetStep {
    fn phase(&self) -> ProcessingPhase {
        match self {
            NetStep::FieldUpdate { phase, .. } => *phase,
            NetStep::Fired { .. } => ProcessingPhase::Fired,
        }
    }

    fn sort_value(&self) -> i64 {
        match self {
            NetStep::FieldUpdate { sort_value, .. } => *sort_value,
            NetStep::Fired { sort_value, .. } => *sort_value,
        }
    }

    fn wants_next_round(&self) -> bool {
        matches!(
            self,
            NetStep::FieldUpdate {
                wants_next_round: true,
                ..
            }
        )
    }
}

fn quantize_net(v: f64) -> i64 {
    if v.is_infinite() {
        i64::MIN
    } else {
        (-(v.abs()) * 1_000_000.0) as i64
    }
}

/// One inference session: its own activations, links, binding signals, and
/// a queue shared between field commits and firing. Field declaration
/// order matters here: it is also Rust's drop order, and activations must
/// go before binding signals before the scheduler, mirroring the engine's
/// required teardown order (activations reference binding signals; the
/// scheduler outlives neither).
pub struct Context {
    activations: HashMap<ActivationId, Activation>,
    links: HashMap<LinkId, crate::activation::Link>,
    binding_signals: HashMap<TokenId, BindingSignal>,
    scheduler: Scheduler<NetStep>,
    field_graph: FieldGraph,
    model: Arc<Model>,
    /// Maps a `PendingUpdates` step id to the id this scheduler assigned it,
    /// so a repeated update to the same field finds and re-scores its
    /// already-queued `NetStep::FieldUpdate` instead of creating a second one.
    field_update_steps: HashMap<u64, u64>,
    next_activation_id: u64,
    next_link_id: u64,
    clock: u64,
}

impl Context {
    pub fn new(model: Arc<Model>) -> Self {
        let field_graph = FieldGraph::new(Arc::clone(&model.field_registry));
        Self {
            activations: HashMap::new(),
            links: HashMap::new(),
            binding_signals: HashMap::new(),
            scheduler: Scheduler::new(),
            field_graph,
            model,
            field_update_steps: HashMap::new(),
            next_activation_id: 0,
            next_link_id: 0,
            clock: 0,
        }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub(crate) fn field_graph(&self) -> &FieldGraph {
        &self.field_graph
    }

    pub(crate) fn field_graph_mut(&mut self) -> &mut FieldGraph {
        &mut self.field_graph
    }

    pub fn activation(&self, id: ActivationId) -> Option<&Activation> {
        self.activations.get(&id)
    }

    pub(crate) fn activation_mut(&mut self, id: ActivationId) -> Option<&mut Activation> {
        self.activations.get_mut(&id)
    }

    pub fn activations(&self) -> impl Iterator<Item = &Activation> {
        self.activations.values()
    }

    pub(crate) fn activations_map(&self) -> &HashMap<ActivationId, Activation> {
        &self.activations
    }

    pub(crate) fn activations_map_mut(&mut self) -> &mut HashMap<ActivationId, Activation> {
        &mut self.activations
    }

    pub fn link(&self, id: LinkId) -> Option<&crate::activation::Link> {
        self.links.get(&id)
    }

    pub fn links(&self) -> impl Iterator<Item = &crate::activation::Link> {
        self.links.values()
    }

    pub(crate) fn links_map_mut(&mut self) -> &mut HashMap<LinkId, crate::activation::Link> {
        &mut self.links
    }

    pub fn binding_signal(&self, token: TokenId) -> Option<&BindingSignal> {
        self.binding_signals.get(&token)
    }

    pub(crate) fn binding_signal_mut(&mut self, token: TokenId) -> &mut BindingSignal {
        self.binding_signals.entry(token).or_insert_with(|| BindingSignal::new(token))
    }

    pub(crate) fn next_link_id(&mut self) -> LinkId {
        let id = LinkId(self.next_link_id);
        self.next_link_id += 1;
        id
    }

    fn tick(&mut self) -> u64 {
        let t = self.clock;
        self.clock += 1;
        t
    }

    /// Seeds a fresh activation on `neuron` carrying `token` at `slot`,
    /// materializing (or reusing) the `BindingSignal` singleton for that
    /// token. Mirrors `Context::add_token` binding a wildcard token onto a
    /// freshly created activation with no parent.
    pub fn add_token(&mut self, neuron: NeuronId, slot: usize, token: TokenId) -> Result<ActivationId> {
        let neuron_type = self.model.neuron(neuron)?.read().neuron_type;
        let num_slots = self.model.net_schema.neuron_type(neuron_type).num_bs_slots;
        let mut bs = vec![None; num_slots.max(slot + 1)];
        bs[slot] = Some(token);
        self.binding_signal_mut(token);
        self.create_activation(neuron, None, bs)
    }

    /// Allocates a new activation on `neuron`, seeds its field-graph object
    /// (wiring the backing `TypeRegistry` fields to their `initialize`
    /// values), and schedules it to fire if its firing condition is
    /// already met.
    pub fn create_activation(
        &mut self,
        neuron: NeuronId,
        parent: Option<ActivationId>,
        binding_signals: Vec<Option<TokenId>>,
    ) -> Result<ActivationId> {
        let neuron_arc = self.model.neuron(neuron)?;
        let neuron_type = neuron_arc.read().neuron_type;
        let def = self.model.net_schema.neuron_type(neuron_type);
        let mut bs = binding_signals;
        if bs.len() < def.num_bs_slots {
            bs.resize(def.num_bs_slots, None);
        }
        let kind = def.kind;
        let field_type = def.field_type;

        let id = ActivationId(self.next_activation_id);
        self.next_activation_id += 1;
        let created = self.tick();
        let activation = Activation::new(id, neuron_type, neuron, kind, parent, bs, created);
        self.activations.insert(id, activation);

        self.field_graph.create_object(ObjectId(id.0), field_type);
        self.field_graph.initialize_object_fields(ObjectId(id.0))?;

        self.scan_and_schedule_fired()?;
        Ok(id)
    }

    /// Directly sets `field` on `activation`'s backing object, routing the
    /// resulting effect into this context's scheduler.
    pub fn set_field(&mut self, activation: ActivationId, field: FieldId, value: f64) -> Result<()> {
        let effect = self.field_graph.set_value(ObjectId(activation.0), field, value)?;
        self.apply_effect(effect)?;
        self.scan_and_schedule_fired()
    }

    /// Reads `field`'s last committed value on `activation`'s backing
    /// object, for inspecting an activation after `process()` settles.
    pub fn field_value(&self, activation: ActivationId, field: FieldId) -> Option<f64> {
        self.field_graph.field_value(ObjectId(activation.0), field)
    }

    fn apply_effect(&mut self, effect: UpdateEffect) -> Result<()> {
        if let UpdateEffect::Scheduled {
            step_id,
            phase,
            sort_value,
            wants_next_round,
            newly_created,
        } = effect
        {
            if newly_created {
                let sid = self.scheduler.add_step(NetStep::FieldUpdate {
                    step_id,
                    phase,
                    sort_value,
                    wants_next_round,
                });
                self.field_update_steps.insert(step_id, sid);
            } else if let Some(&sid) = self.field_update_steps.get(&step_id) {
                self.scheduler.update_sort_value(sid, sort_value)?;
            }
        }
        Ok(())
    }

    /// Scans every un-fired activation and schedules (or re-prioritizes) a
    /// `Fired` step for any whose net-input field has crossed its
    /// threshold. An activation with no designated net field (a pure
    /// source, e.g. one seeded directly by [`Self::add_token`]) is treated
    /// as always satisfying its firing condition, since there is nothing
    /// to wait on.
    ///
    /// Called after every activation creation and after every field commit
    /// settles, so that by the time `process()` drains the queue, every
    /// activation whose inputs already justify firing has a `Fired` step
    /// queued. This stands in for wiring a direct callback from the field
    /// graph into the activation layer.
    pub fn scan_and_schedule_fired(&mut self) -> Result<()> {
        let ids: Vec<ActivationId> = self.activations.keys().copied().collect();
        for id in ids {
            let act = match self.activations.get(&id) {
                Some(a) => a,
                None => continue,
            };
            if act.fired.is_some() {
                continue;
            }
            let def = self.model.net_schema.neuron_type(act.neuron_type);
            let (crosses, net_value) = match def.net_field {
                Some(f) => {
                    let v = self.field_graph.field_value(ObjectId(id.0), f).unwrap_or(0.0);
                    (v >= def.threshold, v)
                }
                None => (true, f64::INFINITY),
            };
            if crosses {
                self.schedule_fired(id, net_value)?;
            }
        }
        Ok(())
    }

    fn schedule_fired(&mut self, id: ActivationId, net_value: f64) -> Result<()> {
        let sort_value = quantize_net(net_value);
        let existing = self.activations.get(&id).and_then(|a| a.fired_step_id);
        match existing {
            Some(sid) if self.scheduler.contains(sid) => {
                self.scheduler.update_sort_value(sid, sort_value)?;
            }
            _ => {
                let sid = self.scheduler.add_step(NetStep::Fired {
                    activation: id,
                    sort_value,
                });
                if let Some(a) = self.activations.get_mut(&id) {
                    a.fired_step_id = Some(sid);
                }
            }
        }
        Ok(())
    }

    /// Marks `activation` fired, registers it against each of its non-null
    /// binding signals, and runs the linker's outgoing linking pass.
    fn process_fired(&mut self, activation: ActivationId) -> Result<()> {
        let (neuron, tokens) = {
            let act = self
                .activations
                .get(&activation)
                .ok_or_else(|| NetError::missing_activation(activation))?;
            let tokens: Vec<TokenId> = act.binding_signals().iter().filter_map(|t| *t).collect();
            (act.neuron, tokens)
        };
        let fired_at = self.tick();
        if let Some(act) = self.activations.get_mut(&activation) {
            act.fired = Some(fired_at);
            act.fired_step_id = None;
        }
        for token in tokens {
            self.binding_signal_mut(token).add_activation(neuron, activation);
        }
        linker::link_outgoing(self, activation)?;
        self.scan_and_schedule_fired()
    }

    /// Drains the scheduler, honoring the model's configured timeout.
    pub fn process(&mut self) -> Result<usize> {
        let timeout = Duration::from_millis(self.model.config.timeout.max(0) as u64);
        let start = Instant::now();
        let mut processed = 0usize;
        loop {
            if start.elapsed() > timeout {
                return Err(NetError::from(synfield_fields::FieldsError::timeout(
                    timeout.as_millis() as u64,
                )));
            }
            let Some((_sched_id, step)) = self.scheduler.pop_next() else {
                break;
            };
            match step {
                NetStep::FieldUpdate { step_id, .. } => {
                    self.field_update_steps.remove(&step_id);
                    self.field_graph.run_scheduled_step(step_id)?;
                    self.scan_and_schedule_fired()?;
                }
                NetStep::Fired { activation, .. } => {
                    self.process_fired(activation)?;
                }
            }
            processed += 1;
        }
        Ok(processed)
    }
}

//! Ties the schema ([`TypeRegistry`]), runtime storage ([`Object`]), and
//! tolerance/scheduling bookkeeping ([`PendingUpdates`]) together into the
//! field-propagation engine.

use std::sync::Arc;

use tracing::trace;

use crate::error::{FieldsError, Result};
use crate::field_def::FieldKind;
use crate::ids::{FieldId, ObjectId, RelationId, TypeId};
use crate::interceptor::{PendingUpdates, UpdateEffect};
use crate::object::{FieldSlot, Object};
use crate::registry::TypeRegistry;

/// Owns every runtime [`Object`] for one inference session and drives
/// value propagation across the field graph. Generic over nothing: it
/// borrows a shared, frozen [`TypeRegistry`] and otherwise only deals in
/// [`ObjectId`]s the caller mints (for `synfield-net`, activation ids).
pub struct FieldGraph {
    registry: Arc<TypeRegistry>,
    objects: std::collections::HashMap<ObjectId, Object>,
    pending: PendingUpdates,
}

impl FieldGraph {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            objects: std::collections::HashMap::new(),
            pending: PendingUpdates::new(),
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    /// Allocates storage for a new object of `type_id` and seeds its
    /// input-side fields by calling each required field definition's
    /// `initialize`. Relations must be wired up with [`Self::connect`]
    /// before initialization reads them.
    pub fn create_object(&mut self, id: ObjectId, type_id: TypeId) {
        let slots = self.registry.flattened_input(type_id).number_of_fields().max(
            self.registry.flattened_output(type_id).number_of_fields(),
        );
        let object = Object {
            id,
            type_id,
            slots: vec![FieldSlot::default(); slots],
            relations: std::collections::HashMap::new(),
        };
        self.objects.insert(id, object);
    }

    /// Wires `a` and `b` together across `relation` (and its reverse), then
    /// seeds every consumer field the relation now exposes with its
    /// producer's current value, matching the default `initializeField`
    /// behavior: a relation coming alive with a non-zero value already
    /// sitting on the producer side must push that value across immediately
    /// rather than waiting for the producer's next update.
    pub fn connect(&mut self, a: ObjectId, relation: RelationId, b: ObjectId) -> Result<()> {
        let rev = self.registry.relation(relation).reverse();
        if let Some(obj) = self.objects.get_mut(&a) {
            obj.add_relation(relation, b);
        }
        if let Some(obj) = self.objects.get_mut(&b) {
            obj.add_relation(rev, a);
        }
        self.seed_relation(a, relation, b)?;
        self.seed_relation(b, rev, a)?;
        Ok(())
    }

    /// Pushes `producer`'s current value across every field link declared on
    /// `relation` into `consumer`, for the field links whose origin field is
    /// actually present on `producer`'s flattened field set.
    fn seed_relation(&mut self, producer: ObjectId, relation: RelationId, consumer: ObjectId) -> Result<()> {
        let producer_type = match self.objects.get(&producer) {
            Some(o) => o.type_id,
            None => return Ok(()),
        };
        let present = self.registry.collect_flattened_field_definitions(producer_type);
        let mut seeds = Vec::new();
        for fd_id in &present {
            let fd = self.registry.field(*fd_id);
            for link_id in fd.output_links() {
                let link = self.registry.field_link(*link_id);
                if link.relation() == relation {
                    seeds.push((*fd_id, link.related(), link.argument().unwrap_or(0)));
                }
            }
        }
        for (producer_field, consumer_field, arg_index) in seeds {
            if let Some(value) = self.field_value(producer, producer_field) {
                if value != 0.0 {
                    self.deliver(consumer, consumer_field, arg_index, value)?;
                }
            }
        }
        Ok(())
    }

    fn slot_index(&self, type_id: TypeId, field: FieldId, for_input: bool) -> Option<usize> {
        if for_input {
            self.registry.flattened_input(type_id).slot_of(field)
        } else {
            self.registry.flattened_output(type_id).slot_of(field)
        }
        .or_else(|| {
            if for_input {
                self.registry.flattened_output(type_id).slot_of(field)
            } else {
                self.registry.flattened_input(type_id).slot_of(field)
            }
        })
    }

    pub fn field_value(&self, object: ObjectId, field: FieldId) -> Option<f64> {
        let obj = self.objects.get(&object)?;
        let slot = self.slot_index(obj.type_id, field, true)?;
        obj.slots.get(slot).map(|s| s.value)
    }

    /// Directly sets a field's value (used for externally seeded fields,
    /// e.g. a token source field), computing the delta against the
    /// current committed value and routing it through the same tolerance
    /// and scheduling path as any other update.
    pub fn set_value(&mut self, object: ObjectId, field: FieldId, value: f64) -> Result<UpdateEffect> {
        let current = self.field_value(object, field).unwrap_or(0.0);
        self.receive_update(object, field, value - current, false)
    }

    /// The tolerance-gated entry point for an update arriving at `field` on
    /// `object`. Returns the effect the caller (owner of the actual
    /// scheduler) must act on.
    pub fn receive_update(
        &mut self,
        object: ObjectId,
        field: FieldId,
        delta: f64,
        replace: bool,
    ) -> Result<UpdateEffect> {
        let fd = self.registry.field(field);
        let effect = self.pending.receive_update(
            object,
            field,
            delta,
            fd.tolerance(),
            fd.phase(),
            fd.is_next_round(),
            replace,
        );
        if let UpdateEffect::Inline { delta } = effect {
            self.trigger_update(object, field, delta)?;
        }
        Ok(effect)
    }

    /// Called by the owning scheduler when a step previously reported as
    /// [`UpdateEffect::Scheduled`] actually runs. Returns the `(object,
    /// field)` pair that was directly updated, so the caller can check
    /// any downstream firing condition without re-deriving it.
    pub fn run_scheduled_step(&mut self, step_id: u64) -> Result<Option<(ObjectId, FieldId)>> {
        if let Some((object, field, delta)) = self.pending.take_scheduled(step_id) {
            self.trigger_update(object, field, delta)?;
            Ok(Some((object, field)))
        } else {
            Ok(None)
        }
    }

    /// Applies a committed delta to `field` on `object` and propagates it
    /// along every output link declared on that field's definition.
    pub fn trigger_update(&mut self, object: ObjectId, field: FieldId, delta: f64) -> Result<()> {
        let type_id = self
            .objects
            .get(&object)
            .ok_or_else(|| FieldsError::logic(format!("no such object {object}")))?
            .type_id;
        let slot = self
            .slot_index(type_id, field, true)
            .ok_or_else(|| FieldsError::logic(format!("{field} has no slot on {type_id}")))?;

        {
            let obj = self.objects.get_mut(&object).unwrap();
            if obj.slots[slot].within_update {
                return Err(FieldsError::logic(format!(
                    "reentrant update on {object}.{field}"
                )));
            }
            obj.slots[slot].within_update = true;
            obj.slots[slot].updated_value = obj.slots[slot].value + delta;
        }

        trace!(%object, %field, delta, "trigger_update");
        self.propagate_update(object, field, slot, delta)?;

        let obj = self.objects.get_mut(&object).unwrap();
        obj.slots[slot].value = obj.slots[slot].updated_value;
        obj.slots[slot].within_update = false;
        Ok(())
    }

    fn propagate_update(
        &mut self,
        object: ObjectId,
        field: FieldId,
        _slot: usize,
        delta: f64,
    ) -> Result<()> {
        let fd_outputs: Vec<_> = self.registry.field(field).output_links().to_vec();
        for link_id in &fd_outputs {
            let link = self.registry.field_link(*link_id);
            let consumer_field = link.related();
            let arg_index = link.argument().unwrap_or(0);
            // A field may relate to more than one object through a "many"
            // relation, so every related object on this link's relation
            // receives the delta.
            let per_link_targets = self
                .objects
                .get(&object)
                .map(|o| o.related(link.relation()).to_vec())
                .unwrap_or_default();
            for consumer_object in per_link_targets {
                self.deliver(consumer_object, consumer_field, arg_index, delta)?;
            }
        }
        Ok(())
    }

    fn deliver(&mut self, object: ObjectId, field: FieldId, arg_index: usize, raw_delta: f64) -> Result<()> {
        let type_id = match self.objects.get(&object) {
            Some(o) => o.type_id,
            None => return Ok(()),
        };
        let effective_delta = match &self.registry.field(field).kind {
            FieldKind::Proxy { target } => {
                let t = *target;
                return self.deliver(object, t, arg_index, raw_delta);
            }
            FieldKind::Regular { function } => {
                let slot_idx = self.slot_index(type_id, field, true);
                if let (Some(slot_idx), Some(obj)) = (slot_idx, self.objects.get_mut(&object)) {
                    if obj.slots[slot_idx].arg_cache.len() <= arg_index {
                        obj.slots[slot_idx].arg_cache.resize(arg_index + 1, 0.0);
                    }
                    obj.slots[slot_idx].arg_cache[arg_index] += raw_delta;
                    function.transmit(&obj.slots[slot_idx].arg_cache, arg_index, raw_delta)
                } else {
                    raw_delta
                }
            }
        };
        self.receive_update(object, field, effective_delta, false)?;
        Ok(())
    }

    /// Seeds every required input-side field of a freshly created object by
    /// calling its definition's `initialize`, in flattened-slot order so
    /// that fields which read sibling argument values see already-seeded
    /// producers first where possible.
    pub fn initialize_object_fields(&mut self, object: ObjectId) -> Result<()> {
        let type_id = self
            .objects
            .get(&object)
            .ok_or_else(|| FieldsError::logic(format!("no such object {object}")))?
            .type_id;
        let present = self.registry.collect_flattened_field_definitions(type_id);
        for fd_id in present {
            let fd = self.registry.field(fd_id);
            if !fd.is_required_for(
                &self.registry.collect_flattened_field_definitions(type_id),
                self.registry.fields(),
            ) {
                continue;
            }
            if fd.num_args() != 0 {
                continue;
            }
            if let FieldKind::Regular { function } = &fd.kind {
                let value = function.initialize(&[]);
                if value != 0.0 {
                    self.set_value(object, fd_id, value)?;
                }
            }
        }
        Ok(())
    }
}

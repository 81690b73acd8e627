//! Per-type, per-direction slot tables computed once the schema is frozen.

use std::collections::HashMap;

use crate::ids::FieldId;

/// Maps a [`crate::registry::Type`]'s field definitions to compact slot
/// indices in one direction (input or output), and back.
///
/// Input-side and output-side slots for a field with the same name
/// coincide (this is how [`crate::field_def::FieldKind::Proxy`] fields
/// collapse onto their target), so a `Field` runtime array indexed by
/// input slot and one indexed by output slot alias the same storage for
/// such fields.
#[derive(Debug, Default, Clone)]
pub struct FlattenedType {
    slot_of: HashMap<FieldId, usize>,
    fields_at: Vec<Vec<FieldId>>,
}

impl FlattenedType {
    pub fn slot_of(&self, field: FieldId) -> Option<usize> {
        self.slot_of.get(&field).copied()
    }

    pub fn fields_at(&self, slot: usize) -> &[FieldId] {
        self.fields_at.get(slot).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn number_of_fields(&self) -> usize {
        self.fields_at.len()
    }

    pub(crate) fn assign(&mut self, field: FieldId, slot: usize) {
        if self.fields_at.len() <= slot {
            self.fields_at.resize(slot + 1, Vec::new());
        }
        self.fields_at[slot].push(field);
        self.slot_of.insert(field, slot);
    }
}

//! Per-object field storage.

use smallvec::SmallVec;

use crate::ids::{FieldId, ObjectId, RelationId, TypeId};

/// One field's runtime storage on a particular [`Object`].
#[derive(Debug, Clone, Default)]
pub struct FieldSlot {
    pub(crate) field: Option<FieldId>,
    pub(crate) value: f64,
    pub(crate) updated_value: f64,
    pub(crate) within_update: bool,
    /// Cached argument values for multi-arg functions (e.g. multiplication),
    /// indexed by argument position. Leaf functions rarely take more than
    /// two arguments, so the common case stays inline.
    pub(crate) arg_cache: SmallVec<[f64; 2]>,
}

impl FieldSlot {
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_within_update(&self) -> bool {
        self.within_update
    }
}

/// A runtime instance of a [`crate::registry::Type`]: a back-pointer to its
/// type, a fixed-size field-slot array (sized to the type's flattened slot
/// count), and the relation edges that let field propagation follow
/// `output` links to related objects.
#[derive(Debug)]
pub struct Object {
    pub(crate) id: ObjectId,
    pub(crate) type_id: TypeId,
    pub(crate) slots: Vec<FieldSlot>,
    /// `One`/`SelfRelation` relations carry exactly one related object;
    /// only `Many` relations ever hold more, so the common case stays
    /// inline.
    pub(crate) relations: std::collections::HashMap<RelationId, SmallVec<[ObjectId; 1]>>,
}

impl Object {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn slot(&self, index: usize) -> Option<&FieldSlot> {
        self.slots.get(index)
    }

    pub fn related(&self, relation: RelationId) -> &[ObjectId] {
        self.relations.get(&relation).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn add_relation(&mut self, relation: RelationId, target: ObjectId) {
        self.relations.entry(relation).or_default().push(target);
    }

    /// Produces a stable display key, e.g. for logging.
    pub fn key(&self) -> String {
        format!("{}#{}", self.type_id, self.id)
    }
}

//! The typed field graph: a declarative DAG of numeric fields on typed
//! objects, propagated through tolerance-gated, phased updates.
//!
//! This crate is deliberately agnostic to what the objects *are*: the
//! activation network in `synfield-net` is one consumer, built by
//! composing a [`graph::FieldGraph`] with its own activation/link
//! bookkeeping.

pub mod error;
pub mod field_def;
pub mod flattened;
pub mod graph;
pub mod ids;
pub mod interceptor;
pub mod object;
pub mod phase;
pub mod queue;
pub mod registry;

pub use error::{FieldsError, Result};
pub use field_def::{FieldDefinition, FieldFunction, FieldKind, FieldLinkDefinition, IdentityFunction};
pub use flattened::FlattenedType;
pub use graph::FieldGraph;
pub use ids::{FieldId, FieldLinkId, ObjectId, RelationId, Round, Timestamp, TypeId};
pub use interceptor::{PendingUpdates, UpdateEffect};
pub use object::{FieldSlot, Object};
pub use phase::{Direction, ProcessingPhase};
pub use queue::{QueueKey, SchedulableStep, Scheduler};
pub use registry::{Relation, RelationKind, TypeRegistry};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Addition;
    impl FieldFunction for Addition {
        fn transmit(&self, _args: &[f64], _arg_index: usize, delta: f64) -> f64 {
            delta
        }
        fn initialize(&self, args: &[f64]) -> f64 {
            args.iter().sum()
        }
    }

    fn build_identity_schema() -> (TypeRegistry, TypeId, TypeId, FieldId, FieldId, RelationId) {
        let mut reg = TypeRegistry::new();
        let t_in = reg.declare_type("In").unwrap();
        let t_out = reg.declare_type("Out").unwrap();
        let rel = reg
            .declare_relation(t_in, "link", RelationKind::One, t_out)
            .unwrap();
        let f_in = reg.declare_input_field(t_in, "x").unwrap();
        let f_out = reg
            .declare_field(t_out, "y", 1, Box::new(Addition))
            .unwrap();
        reg.link(rel, f_in, f_out, 0).unwrap();
        reg.flatten_type_hierarchy().unwrap();
        (reg, t_in, t_out, f_in, f_out, rel)
    }

    #[test]
    fn propagates_a_single_update_across_a_link() {
        let (reg, t_in, t_out, f_in, f_out, rel) = build_identity_schema();
        let mut graph = FieldGraph::new(Arc::new(reg));
        graph.create_object(ObjectId(0), t_in);
        graph.create_object(ObjectId(1), t_out);
        graph.connect(ObjectId(0), rel, ObjectId(1)).unwrap();

        graph.set_value(ObjectId(0), f_in, 3.0).unwrap();
        assert_eq!(graph.field_value(ObjectId(1), f_out), Some(3.0));
    }

    #[test]
    fn tolerance_drops_small_updates() {
        let mut reg = TypeRegistry::new();
        let t = reg.declare_type("T").unwrap();
        let f = reg.declare_input_field(t, "x").unwrap();
        reg.set_tolerance(f, 0.01).unwrap();
        reg.flatten_type_hierarchy().unwrap();
        let mut graph = FieldGraph::new(Arc::new(reg));
        graph.create_object(ObjectId(0), t);
        graph.set_value(ObjectId(0), f, 0.005).unwrap();
        assert_eq!(graph.field_value(ObjectId(0), f), Some(0.0));
    }

    #[test]
    fn schema_frozen_after_flatten() {
        let mut reg = TypeRegistry::new();
        reg.flatten_type_hierarchy().unwrap();
        let err = reg.declare_type("Late").unwrap_err();
        assert!(matches!(err, FieldsError::SchemaFrozen { .. }));
    }
}

//! The schema arena: types, relations, and field (link) definitions, plus
//! the flattening pass that freezes the schema for runtime use.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::error::{FieldsError, Result};
use crate::field_def::{FieldDefinition, FieldFunction, FieldKind, FieldLinkDefinition, IdentityFunction};
use crate::flattened::FlattenedType;
use crate::ids::{FieldId, FieldLinkId, RelationId, TypeId};
use crate::phase::{Direction, ProcessingPhase};

/// What a [`Relation`] follows to: a single related object, an enumerable
/// set of related objects, or the same object (identity).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    One,
    Many,
    SelfRelation,
}

/// A labeled directed edge between two types. Every relation has a paired
/// reverse relation on the target type, established at construction time.
#[derive(Debug, Clone)]
pub struct Relation {
    pub(crate) id: RelationId,
    pub(crate) name: String,
    pub(crate) kind: RelationKind,
    pub(crate) owner: TypeId,
    pub(crate) target: TypeId,
    pub(crate) reverse: RelationId,
}

impl Relation {
    pub fn id(&self) -> RelationId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    pub fn target(&self) -> TypeId {
        self.target
    }

    pub fn reverse(&self) -> RelationId {
        self.reverse
    }
}

struct TypeRecord {
    name: String,
    parents: Vec<TypeId>,
    children: Vec<TypeId>,
    own_fields: Vec<FieldId>,
    relations: Vec<RelationId>,
    depth: Option<u32>,
    input_flat: Option<FlattenedType>,
    output_flat: Option<FlattenedType>,
}

/// Owns every [`TypeId`], [`FieldId`], [`RelationId`] and [`FieldLinkId`]
/// in a schema. Types and field definitions never reference each other
/// directly; every cross-reference goes through one of these ids plus a
/// lookup here, which is what breaks the cyclic ownership graph the schema
/// naturally wants to form.
pub struct TypeRegistry {
    types: Vec<TypeRecord>,
    fields: Vec<FieldDefinition>,
    links: Vec<FieldLinkDefinition>,
    relations: Vec<Relation>,
    frozen: bool,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            types: Vec::new(),
            fields: Vec::new(),
            links: Vec::new(),
            relations: Vec::new(),
            frozen: false,
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn check_mutable(&self, what: impl Into<String>) -> Result<()> {
        if self.frozen {
            Err(FieldsError::schema_frozen(what))
        } else {
            Ok(())
        }
    }

    /// Declares a new type with no parents. Use [`Self::add_parent`] to
    /// attach it into the inheritance DAG.
    pub fn declare_type(&mut self, name: impl Into<String>) -> Result<TypeId> {
        let name = name.into();
        self.check_mutable(format!("Type({name})"))?;
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeRecord {
            name,
            parents: Vec::new(),
            children: Vec::new(),
            own_fields: Vec::new(),
            relations: Vec::new(),
            depth: None,
            input_flat: None,
            output_flat: None,
        });
        trace!(type_id = ?id, "declared type");
        Ok(id)
    }

    pub fn add_parent(&mut self, child: TypeId, parent: TypeId) -> Result<()> {
        self.check_mutable(format!("{child} parent {parent}"))?;
        self.types[child.index()].parents.push(parent);
        self.types[parent.index()].children.push(child);
        Ok(())
    }

    pub fn type_name(&self, id: TypeId) -> &str {
        &self.types[id.index()].name
    }

    pub fn parents(&self, id: TypeId) -> &[TypeId] {
        &self.types[id.index()].parents
    }

    pub fn children(&self, id: TypeId) -> &[TypeId] {
        &self.types[id.index()].children
    }

    pub fn is_instance_of(&self, id: TypeId, other: TypeId) -> bool {
        if id == other {
            return true;
        }
        self.types[id.index()]
            .parents
            .iter()
            .any(|p| self.is_instance_of(*p, other))
    }

    /// 1 + max(parent.depth), memoized. Used only to order the flattening
    /// pass: parents must be flattened before children.
    pub fn depth(&mut self, id: TypeId) -> u32 {
        if let Some(d) = self.types[id.index()].depth {
            return d;
        }
        let parents: Vec<TypeId> = self.types[id.index()].parents.clone();
        let d = 1 + parents.iter().map(|p| self.depth(*p)).max().unwrap_or(0);
        self.types[id.index()].depth = Some(d);
        d
    }

    pub fn declare_relation(
        &mut self,
        owner: TypeId,
        name: impl Into<String>,
        kind: RelationKind,
        target: TypeId,
    ) -> Result<RelationId> {
        let name = name.into();
        self.check_mutable(format!("Relation({name})"))?;
        let fwd_id = RelationId(self.relations.len() as u32);
        if kind == RelationKind::SelfRelation {
            self.relations.push(Relation {
                id: fwd_id,
                name,
                kind,
                owner,
                target,
                reverse: fwd_id,
            });
            self.types[owner.index()].relations.push(fwd_id);
            return Ok(fwd_id);
        }
        let rev_id = RelationId(fwd_id.0 + 1);
        self.relations.push(Relation {
            id: fwd_id,
            name: name.clone(),
            kind,
            owner,
            target,
            reverse: rev_id,
        });
        self.relations.push(Relation {
            id: rev_id,
            name: format!("{name}^-1"),
            kind,
            owner: target,
            target: owner,
            reverse: fwd_id,
        });
        self.types[owner.index()].relations.push(fwd_id);
        self.types[target.index()].relations.push(rev_id);
        Ok(fwd_id)
    }

    pub fn relation(&self, id: RelationId) -> &Relation {
        &self.relations[id.0 as usize]
    }

    pub fn relations_of(&self, owner: TypeId) -> &[RelationId] {
        &self.types[owner.index()].relations
    }

    /// Declares a regular (non-proxy) field with the given arity, driven by
    /// `function`. Use [`Self::declare_proxy_field`] for proxy fields.
    pub fn declare_field(
        &mut self,
        owner: TypeId,
        name: impl Into<String>,
        num_args: usize,
        function: Box<dyn FieldFunction>,
    ) -> Result<FieldId> {
        let name = name.into();
        self.check_mutable(format!("FieldDefinition({name})"))?;
        let id = FieldId(self.fields.len() as u32);
        self.fields.push(FieldDefinition {
            id,
            name,
            owner,
            num_args,
            tolerance: 0.0,
            phase: None,
            is_next_round: false,
            input_links: vec![None; num_args],
            output_links: Vec::new(),
            parent_field: None,
            child_fields: Vec::new(),
            kind: FieldKind::Regular { function },
        });
        self.types[owner.index()].own_fields.push(id);
        Ok(id)
    }

    /// Convenience for a 0- or 1-arg field with default pass-through
    /// semantics (e.g. input/source fields).
    pub fn declare_input_field(&mut self, owner: TypeId, name: impl Into<String>) -> Result<FieldId> {
        self.declare_field(owner, name, 0, Box::new(IdentityFunction))
    }

    pub fn declare_proxy_field(
        &mut self,
        owner: TypeId,
        name: impl Into<String>,
        target: FieldId,
    ) -> Result<FieldId> {
        let name = name.into();
        self.check_mutable(format!("ProxyField({name})"))?;
        let id = FieldId(self.fields.len() as u32);
        self.fields.push(FieldDefinition {
            id,
            name,
            owner,
            num_args: 0,
            tolerance: 0.0,
            phase: None,
            is_next_round: false,
            input_links: Vec::new(),
            output_links: Vec::new(),
            parent_field: None,
            child_fields: Vec::new(),
            kind: FieldKind::Proxy { target },
        });
        self.types[owner.index()].own_fields.push(id);
        Ok(id)
    }

    pub fn set_tolerance(&mut self, field: FieldId, tolerance: f64) -> Result<()> {
        self.check_mutable(format!("{field}.tolerance"))?;
        self.fields[field.index()].tolerance = tolerance;
        Ok(())
    }

    pub fn set_phase(&mut self, field: FieldId, phase: ProcessingPhase) -> Result<()> {
        self.check_mutable(format!("{field}.phase"))?;
        self.fields[field.index()].phase = Some(phase);
        Ok(())
    }

    pub fn set_next_round(&mut self, field: FieldId, is_next_round: bool) -> Result<()> {
        self.check_mutable(format!("{field}.is_next_round"))?;
        self.fields[field.index()].is_next_round = is_next_round;
        Ok(())
    }

    pub fn set_parent_field(&mut self, field: FieldId, parent: FieldId) -> Result<()> {
        self.check_mutable(format!("{field}.parent_field"))?;
        self.fields[field.index()].parent_field = Some(parent);
        self.fields[parent.index()].child_fields.push(field);
        Ok(())
    }

    pub fn field(&self, id: FieldId) -> &FieldDefinition {
        &self.fields[id.index()]
    }

    /// Every declared field definition, indexed by [`FieldId`]. Used to
    /// walk a field's full descendant closure (see
    /// [`FieldDefinition::is_required_for`]).
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn own_fields(&self, owner: TypeId) -> &[FieldId] {
        &self.types[owner.index()].own_fields
    }

    /// Set-union of a type's own fields and all ancestors' fields,
    /// recursively. Two parents contributing a same-named field both enter
    /// the set; a [`FieldKind::Proxy`] in the subclass, if present, is what
    /// later collapses them onto one output slot.
    pub fn collect_flattened_field_definitions(&self, owner: TypeId) -> Vec<FieldId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.collect_into(owner, &mut seen, &mut out);
        out
    }

    fn collect_into(&self, owner: TypeId, seen: &mut HashSet<FieldId>, out: &mut Vec<FieldId>) {
        for &f in &self.types[owner.index()].own_fields {
            if seen.insert(f) {
                out.push(f);
            }
        }
        for &p in &self.types[owner.index()].parents {
            self.collect_into(p, seen, out);
        }
    }

    /// Builds the input-link pair for `(origin -> related)` across
    /// `relation`, along with its output-direction twin. `argument` is the
    /// positional slot on the consuming (input) side.
    pub fn link(
        &mut self,
        relation: RelationId,
        output_field: FieldId,
        input_field: FieldId,
        argument: usize,
    ) -> Result<(FieldLinkId, FieldLinkId)> {
        self.check_mutable(format!("link {output_field}->{input_field}"))?;
        if self.fields[input_field.index()].input_links.len() <= argument {
            self.fields[input_field.index()]
                .input_links
                .resize(argument + 1, None);
        }
        if self.fields[input_field.index()].input_links[argument].is_some() {
            return Err(FieldsError::duplicate_link(format!(
                "{input_field} argument {argument} already linked"
            )));
        }
        let out_id = FieldLinkId(self.links.len() as u32);
        let in_id = FieldLinkId(out_id.0 + 1);
        self.links.push(FieldLinkDefinition {
            id: out_id,
            origin: output_field,
            related: input_field,
            relation,
            direction: Direction::Output,
            argument: Some(argument),
            opposite: in_id,
        });
        self.links.push(FieldLinkDefinition {
            id: in_id,
            origin: input_field,
            related: output_field,
            relation: self.relations[relation.0 as usize].reverse,
            direction: Direction::Input,
            argument: Some(argument),
            opposite: out_id,
        });
        self.fields[output_field.index()].output_links.push(out_id);
        self.fields[input_field.index()].input_links[argument] = Some(in_id);
        Ok((out_id, in_id))
    }

    pub fn field_link(&self, id: FieldLinkId) -> &FieldLinkDefinition {
        &self.links[id.index()]
    }

    pub fn flattened_input(&self, id: TypeId) -> &FlattenedType {
        self.types[id.index()]
            .input_flat
            .as_ref()
            .expect("flatten_type_hierarchy must run before reading flattened types")
    }

    pub fn flattened_output(&self, id: TypeId) -> &FlattenedType {
        self.types[id.index()]
            .output_flat
            .as_ref()
            .expect("flatten_type_hierarchy must run before reading flattened types")
    }

    /// Computes every type's depth, then builds input- and output-side
    /// [`FlattenedType`]s in depth order (parents before children) and
    /// freezes the schema against further declarations.
    pub fn flatten_type_hierarchy(&mut self) -> Result<()> {
        if self.frozen {
            return Ok(());
        }
        let ids: Vec<TypeId> = (0..self.types.len() as u32).map(TypeId).collect();
        for &id in &ids {
            self.depth(id);
        }
        let mut ordered = ids.clone();
        ordered.sort_by_key(|id| self.types[id.index()].depth.unwrap_or(0));

        for &id in &ordered {
            let present = self.collect_flattened_field_definitions(id);
            let mut input = FlattenedType::default();
            let mut next_input_slot = 0usize;
            let mut name_to_input_slot: std::collections::HashMap<String, usize> =
                std::collections::HashMap::new();

            for &fd in &present {
                if !self.fields[fd.index()].is_required_for(&present, &self.fields) {
                    continue;
                }
                if self.fields[fd.index()].input_links.iter().any(|l| l.is_some()) {
                    let slot = next_input_slot;
                    next_input_slot += 1;
                    input.assign(fd, slot);
                    name_to_input_slot.insert(self.fields[fd.index()].name.clone(), slot);
                }
            }

            let mut output = FlattenedType::default();
            let mut next_output_slot = next_input_slot;
            for &fd in &present {
                if !self.fields[fd.index()].is_required_for(&present, &self.fields) {
                    continue;
                }
                let has_output_link = !self.fields[fd.index()].output_links.is_empty();
                let is_proxy = self.fields[fd.index()].is_proxy();
                if !has_output_link && !is_proxy {
                    continue;
                }
                let name = self.fields[fd.index()].name.clone();
                if let Some(&slot) = name_to_input_slot.get(&name) {
                    output.assign(fd, slot);
                } else {
                    let slot = next_output_slot;
                    next_output_slot += 1;
                    output.assign(fd, slot);
                }
            }

            debug!(type_id = ?id, input_slots = input.number_of_fields(), output_slots = output.number_of_fields(), "flattened type");
            self.types[id.index()].input_flat = Some(input);
            self.types[id.index()].output_flat = Some(output);
        }

        self.frozen = true;
        Ok(())
    }
}

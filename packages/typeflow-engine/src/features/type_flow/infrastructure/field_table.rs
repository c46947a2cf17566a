//! Global field-state table
//!
//! One aggregate node per field identity. Stores feed the aggregate through
//! use-edges; loads are registered as uses of it, so every load observes the
//! union of every store in the program. Created per analysis run and dropped
//! with it.

use super::flow_node::FlowRef;
use super::method_graph::MethodGraphTable;
use crate::features::type_flow::domain::{FieldId, TypeId};
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct FieldStateTable {
    fields: DashMap<FieldId, FlowRef>,
}

impl FieldStateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate node of `field`, created on first use
    pub fn aggregate(
        &self,
        field: FieldId,
        declared_type: Option<TypeId>,
        graphs: &MethodGraphTable,
    ) -> FlowRef {
        *self
            .fields
            .entry(field)
            .or_insert_with(|| FlowRef::new(graphs.insert_field_graph(field, declared_type), 0))
    }

    pub fn get(&self, field: FieldId) -> Option<FlowRef> {
        self.fields.get(&field).map(|r| *r)
    }

    /// All aggregates, ordered by field
    pub fn entries(&self) -> Vec<(FieldId, FlowRef)> {
        let mut entries: Vec<_> = self.fields.iter().map(|e| (*e.key(), *e.value())).collect();
        entries.sort_unstable();
        entries
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

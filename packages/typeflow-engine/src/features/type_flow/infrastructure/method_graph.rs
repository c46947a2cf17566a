//! Method flow graphs and the global graph table
//!
//! One original graph per registered template, plus lazily created clones
//! keyed by `(method, context)`. Field aggregates are single-node graphs so
//! every node in the analysis has a `FlowRef` address.
//!
//! Graphs are append-only and shared as `Arc`; lookups clone the `Arc` out of
//! the map before touching any node.

use super::flow_node::{FlowNode, FlowRef};
use crate::errors::{Result, TypeFlowError};
use crate::features::type_flow::domain::{
    AnalysisContext, FieldId, FlowKind, InvokeKind, MethodId, MethodTemplate, TemplateNodeId, TypeId,
    TypeState,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Arena index of a graph
pub type GraphId = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphKind {
    /// Immutable template instance
    Original,
    /// Per-context instance
    Clone(AnalysisContext),
    /// Per-field aggregate owned by the analysis
    Field(FieldId),
}

#[derive(Debug)]
pub struct MethodFlowGraph {
    id: GraphId,
    method: Option<MethodId>,
    kind: GraphKind,
    nodes: Vec<FlowNode>,
    template: Option<Arc<MethodTemplate>>,
}

impl MethodFlowGraph {
    /// Original graph for `template`
    ///
    /// Every virtual call also uses its actual receiver, whether or not the
    /// template lists that edge.
    pub fn original(id: GraphId, template: Arc<MethodTemplate>) -> Self {
        let mut uses: Vec<Vec<FlowRef>> = template
            .nodes
            .iter()
            .map(|n| n.uses.iter().map(|&u| FlowRef::new(id, u)).collect())
            .collect();
        for (node, invoke) in template.invokes() {
            let (InvokeKind::Virtual, Some(receiver)) = (invoke.kind, invoke.receiver) else {
                continue;
            };
            let edge = FlowRef::new(id, node);
            if let Some(list) = uses.get_mut(receiver as usize) {
                if !list.contains(&edge) {
                    list.push(edge);
                }
            }
        }
        let nodes = template
            .nodes
            .iter()
            .zip(uses)
            .map(|(n, uses)| FlowNode::original(n.kind.clone(), n.declared_type, uses))
            .collect();
        Self {
            id,
            method: Some(template.method),
            kind: GraphKind::Original,
            nodes,
            template: Some(template),
        }
    }

    /// Clone of this original for `context`, with edges rebased onto `id`
    ///
    /// # Panics
    /// If `self` is not an original.
    pub fn instantiate(&self, id: GraphId, context: AnalysisContext) -> Self {
        assert!(
            self.kind == GraphKind::Original,
            "consistency violation: cloning non-original graph {}",
            self.id
        );
        let nodes = self
            .nodes
            .iter()
            .map(|n| {
                let uses = n
                    .uses()
                    .into_iter()
                    .map(|u| FlowRef::new(id, u.node))
                    .collect();
                FlowNode::clone_node(n.kind().clone(), n.declared_type(), uses)
            })
            .collect();
        Self {
            id,
            method: self.method,
            kind: GraphKind::Clone(context),
            nodes,
            template: self.template.clone(),
        }
    }

    /// Aggregate node for a field
    pub fn field_aggregate(id: GraphId, field: FieldId, declared_type: Option<TypeId>) -> Self {
        Self {
            id,
            method: None,
            kind: GraphKind::Field(field),
            nodes: vec![FlowNode::clone_node(
                FlowKind::FieldAggregate(field),
                declared_type,
                Vec::new(),
            )],
            template: None,
        }
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn method(&self) -> Option<MethodId> {
        self.method
    }

    pub fn kind(&self) -> &GraphKind {
        &self.kind
    }

    pub fn context(&self) -> Option<&AnalysisContext> {
        match &self.kind {
            GraphKind::Clone(ctx) => Some(ctx),
            _ => None,
        }
    }

    pub fn is_clone(&self) -> bool {
        matches!(self.kind, GraphKind::Clone(_))
    }

    pub fn template(&self) -> Option<&Arc<MethodTemplate>> {
        self.template.as_ref()
    }

    pub fn node(&self, id: TemplateNodeId) -> Option<&FlowNode> {
        self.nodes.get(id as usize)
    }

    pub fn nodes(&self) -> &[FlowNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn flow_ref(&self, node: TemplateNodeId) -> FlowRef {
        FlowRef::new(self.id, node)
    }

    pub fn formal_receiver(&self) -> Option<FlowRef> {
        let r = self.template.as_ref()?.receiver?;
        Some(self.flow_ref(r))
    }

    pub fn formal_parameter(&self, index: usize) -> Option<FlowRef> {
        let p = self.template.as_ref()?.parameter(index)?;
        Some(self.flow_ref(p))
    }

    pub fn formal_result(&self) -> Option<FlowRef> {
        let r = self.template.as_ref()?.result?;
        Some(self.flow_ref(r))
    }

    /// Current state of every node, in node order
    pub fn snapshot(&self) -> Vec<TypeState> {
        self.nodes.iter().map(|n| (*n.state()).clone()).collect()
    }
}

/// Global table of graphs: originals, clones and field aggregates
#[derive(Debug, Default)]
pub struct MethodGraphTable {
    graphs: DashMap<GraphId, Arc<MethodFlowGraph>>,
    originals: DashMap<MethodId, GraphId>,
    clones: DashMap<(MethodId, AnalysisContext), GraphId>,
    next_id: AtomicU32,
}

impl MethodGraphTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> GraphId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Register the original graph for a template
    pub fn register_original(&self, template: MethodTemplate) -> Result<GraphId> {
        match self.originals.entry(template.method) {
            Entry::Occupied(_) => Err(TypeFlowError::DuplicateTemplate(template.method)),
            Entry::Vacant(slot) => {
                let id = self.allocate_id();
                let graph = MethodFlowGraph::original(id, Arc::new(template));
                self.graphs.insert(id, Arc::new(graph));
                slot.insert(id);
                Ok(id)
            }
        }
    }

    pub fn original_of(&self, method: MethodId) -> Option<Arc<MethodFlowGraph>> {
        let id = *self.originals.get(&method)?;
        self.get(id)
    }

    pub fn get(&self, id: GraphId) -> Option<Arc<MethodFlowGraph>> {
        self.graphs.get(&id).map(|g| Arc::clone(&g))
    }

    /// Clone of `method` for `context`, created on first request
    ///
    /// Returns the graph and whether this call created it; racing callers
    /// observe exactly one creation. `None` if the method has no template.
    pub fn get_or_create_clone(
        &self,
        method: MethodId,
        context: &AnalysisContext,
    ) -> Option<(Arc<MethodFlowGraph>, bool)> {
        if let Some(id) = self.clones.get(&(method, context.clone())).map(|e| *e) {
            return self.get(id).map(|g| (g, false));
        }

        let original = self.original_of(method)?;
        match self.clones.entry((method, context.clone())) {
            Entry::Occupied(e) => {
                let id = *e.get();
                drop(e);
                self.get(id).map(|g| (g, false))
            }
            Entry::Vacant(slot) => {
                let id = self.allocate_id();
                let graph = Arc::new(original.instantiate(id, context.clone()));
                self.graphs.insert(id, Arc::clone(&graph));
                slot.insert(id);
                Some((graph, true))
            }
        }
    }

    /// New single-node graph for a field aggregate
    pub fn insert_field_graph(&self, field: FieldId, declared_type: Option<TypeId>) -> GraphId {
        let id = self.allocate_id();
        self.graphs
            .insert(id, Arc::new(MethodFlowGraph::field_aggregate(id, field, declared_type)));
        id
    }

    /// Node lookup by address
    pub fn with_node<R>(&self, r: FlowRef, f: impl FnOnce(&MethodFlowGraph, &FlowNode) -> R) -> Option<R> {
        let graph = self.get(r.graph)?;
        let node = graph.node(r.node)?;
        Some(f(&graph, node))
    }

    pub fn clone_count(&self) -> usize {
        self.clones.len()
    }

    pub fn template_count(&self) -> usize {
        self.originals.len()
    }

    /// All clones, ordered by (method, context)
    pub fn clones(&self) -> Vec<Arc<MethodFlowGraph>> {
        let mut keys: Vec<_> = self
            .clones
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        keys.sort();
        keys.into_iter().filter_map(|(_, id)| self.get(id)).collect()
    }
}

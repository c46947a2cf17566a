//! Flow nodes
//!
//! A node carries a monotone `TypeState` and the use-edges it propagates to.
//! Nodes live inside a `MethodFlowGraph` arena and are addressed by
//! `FlowRef` (graph id + node index), never by pointer.
//!
//! # Synchronization
//! - state: `Mutex<Arc<TypeState>>`; `add_state` is the single
//!   compare-and-commit step (union under the node lock)
//! - uses: `RwLock<Vec<FlowRef>>`; call-graph growth appends edges
//! - queued: worklist membership flag (CAS, as in the parallel Andersen solver)

use super::invoke_resolver::InvokeResolution;
use super::method_graph::GraphId;
use crate::features::type_flow::domain::{FlowKind, TemplateNodeId, TypeId, TypeState};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Stable address of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowRef {
    pub graph: GraphId,
    pub node: TemplateNodeId,
}

impl FlowRef {
    pub fn new(graph: GraphId, node: TemplateNodeId) -> Self {
        Self { graph, node }
    }
}

#[derive(Debug)]
pub struct FlowNode {
    kind: FlowKind,
    declared_type: Option<TypeId>,
    is_clone: bool,
    state: Mutex<Arc<TypeState>>,
    uses: RwLock<Vec<FlowRef>>,
    queued: AtomicBool,
    violation_reported: AtomicBool,
    invoke: Option<Mutex<InvokeResolution>>,
}

impl FlowNode {
    /// Template node: structure only, never receives state
    pub fn original(kind: FlowKind, declared_type: Option<TypeId>, uses: Vec<FlowRef>) -> Self {
        Self::with_flag(kind, declared_type, uses, false)
    }

    /// Analysis-participating node
    pub fn clone_node(kind: FlowKind, declared_type: Option<TypeId>, uses: Vec<FlowRef>) -> Self {
        Self::with_flag(kind, declared_type, uses, true)
    }

    fn with_flag(
        kind: FlowKind,
        declared_type: Option<TypeId>,
        uses: Vec<FlowRef>,
        is_clone: bool,
    ) -> Self {
        let invoke = match (&kind, is_clone) {
            (FlowKind::Invoke(_), true) => Some(Mutex::new(InvokeResolution::new())),
            _ => None,
        };
        Self {
            kind,
            declared_type,
            is_clone,
            state: Mutex::new(Arc::new(TypeState::empty())),
            uses: RwLock::new(uses),
            queued: AtomicBool::new(false),
            violation_reported: AtomicBool::new(false),
            invoke,
        }
    }

    pub fn kind(&self) -> &FlowKind {
        &self.kind
    }

    pub fn declared_type(&self) -> Option<TypeId> {
        self.declared_type
    }

    pub fn is_clone(&self) -> bool {
        self.is_clone
    }

    /// Current state (cheap snapshot)
    pub fn state(&self) -> Arc<TypeState> {
        Arc::clone(&self.state.lock())
    }

    /// Join `delta` into the current state
    ///
    /// Returns true if the state grew; the caller schedules the node.
    ///
    /// # Panics
    /// On an original node.
    pub fn add_state(&self, delta: &TypeState) -> bool {
        assert!(
            self.is_clone,
            "consistency violation: add_state on an original flow node ({:?})",
            self.kind
        );
        let mut current = self.state.lock();
        if delta.is_subset_of(&current) {
            return false;
        }
        *current = Arc::new(current.union(delta));
        true
    }

    /// Add a use-edge; returns false if it already existed
    pub fn add_use(&self, target: FlowRef) -> bool {
        let mut uses = self.uses.write();
        if uses.contains(&target) {
            return false;
        }
        uses.push(target);
        true
    }

    pub fn uses(&self) -> Vec<FlowRef> {
        self.uses.read().clone()
    }

    /// Mark as queued; false if it already was
    pub fn try_enqueue(&self) -> bool {
        self.queued
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Clear the queued flag before processing
    pub fn dequeue(&self) {
        self.queued.store(false, Ordering::Release);
    }

    pub fn is_queued(&self) -> bool {
        self.queued.load(Ordering::Acquire)
    }

    /// True the first time a violation is attributed to this node
    pub fn mark_violation_reported(&self) -> bool {
        !self.violation_reported.swap(true, Ordering::AcqRel)
    }

    /// Resolution state of an invoke clone
    pub fn invoke(&self) -> Option<&Mutex<InvokeResolution>> {
        self.invoke.as_ref()
    }
}

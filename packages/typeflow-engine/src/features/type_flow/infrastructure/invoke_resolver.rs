//! Per-call-site resolution bookkeeping
//!
//! Each invoke clone owns one `InvokeResolution` behind a mutex. The engine
//! holds that mutex for a whole resolution step, so "resolve every new
//! receiver exactly once" holds under concurrent delivery.
//!
//! Lock order: the resolution mutex may be held while touching graph tables
//! and node locks, never the other way around.

use super::method_graph::GraphId;
use crate::features::type_flow::domain::{AllocSiteId, AnalysisContext, MethodId, TypeId};
use rustc_hash::{FxHashMap, FxHashSet};

/// Receiver object key: `(concrete type, allocation site)`
pub type ReceiverKey = (TypeId, Option<AllocSiteId>);

/// Callee reached from a call site
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolvedCallee {
    pub method: MethodId,
    /// `None` when the method has no flow template
    pub context: Option<AnalysisContext>,
    pub graph: Option<GraphId>,
}

#[derive(Debug, Default)]
pub struct InvokeResolution {
    /// Set once for static/special calls
    static_target: Option<MethodId>,
    /// Virtual-method table lookups, one per concrete type
    dispatch: FxHashMap<TypeId, Option<MethodId>>,
    /// Receiver objects already handled
    seen_receivers: FxHashSet<ReceiverKey>,
    /// Callee clones whose parameters/result are wired to this site
    linked_graphs: FxHashSet<GraphId>,
    callees: Vec<ResolvedCallee>,
}

impl InvokeResolution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the single target of a static/special call
    ///
    /// # Panics
    /// On a second call: double resolution would double-link the callee.
    pub fn resolve_static(&mut self, target: MethodId) {
        if let Some(previous) = self.static_target {
            panic!(
                "consistency violation: static call site already resolved to method {} (re-resolving to {})",
                previous, target
            );
        }
        self.static_target = Some(target);
    }

    pub fn static_target(&self) -> Option<MethodId> {
        self.static_target
    }

    /// Cached virtual dispatch for `ty`
    pub fn dispatch_target(
        &mut self,
        ty: TypeId,
        lookup: impl FnOnce(TypeId) -> Option<MethodId>,
    ) -> Option<MethodId> {
        *self.dispatch.entry(ty).or_insert_with(|| lookup(ty))
    }

    /// Returns true the first time `receiver` is seen
    pub fn mark_receiver(&mut self, receiver: ReceiverKey) -> bool {
        self.seen_receivers.insert(receiver)
    }

    /// Returns true the first time `graph` is linked
    pub fn mark_linked(&mut self, graph: GraphId) -> bool {
        self.linked_graphs.insert(graph)
    }

    /// Returns true if `callee` was not recorded yet
    pub fn record_callee(&mut self, callee: ResolvedCallee) -> bool {
        if self.callees.contains(&callee) {
            return false;
        }
        self.callees.push(callee);
        true
    }

    pub fn callees(&self) -> &[ResolvedCallee] {
        &self.callees
    }

    /// Distinct callee methods, in discovery order
    pub fn callee_methods(&self) -> Vec<MethodId> {
        let mut seen = FxHashSet::default();
        self.callees
            .iter()
            .map(|c| c.method)
            .filter(|m| seen.insert(*m))
            .collect()
    }
}

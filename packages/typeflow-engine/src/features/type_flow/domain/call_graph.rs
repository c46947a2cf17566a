//! Call graph discovered by type propagation
//!
//! Edges are collected from the resolved callee sets of every invoke clone.
//! Downstream consumers (reachability, devirtualization) usually want the
//! context-insensitive projection, which the query methods provide.

use super::context::AnalysisContext;
use super::flow_template::InvokeKind;
use super::type_universe::{CallSiteId, MethodId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One resolved call
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallEdge {
    pub caller: MethodId,
    pub caller_context: AnalysisContext,
    pub site: CallSiteId,
    pub kind: InvokeKind,
    pub callee: MethodId,
    /// `None` when the callee has no flow template and was never linked
    pub callee_context: Option<AnalysisContext>,
}

/// Call site whose every resolution, in every context, reached one method
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonomorphicSite {
    pub caller: MethodId,
    pub site: CallSiteId,
    pub callee: MethodId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraph {
    edges: Vec<CallEdge>,
}

impl CallGraph {
    /// Sorted, deduplicated edge list
    pub fn new(mut edges: Vec<CallEdge>) -> Self {
        edges.sort();
        edges.dedup();
        Self { edges }
    }

    pub fn edges(&self) -> &[CallEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Methods called from `caller`, across all contexts
    pub fn callees_of(&self, caller: MethodId) -> BTreeSet<MethodId> {
        self.edges
            .iter()
            .filter(|e| e.caller == caller)
            .map(|e| e.callee)
            .collect()
    }

    /// Methods calling `callee`, across all contexts
    pub fn callers_of(&self, callee: MethodId) -> BTreeSet<MethodId> {
        self.edges
            .iter()
            .filter(|e| e.callee == callee)
            .map(|e| e.caller)
            .collect()
    }

    /// Targets of one call site, across all contexts
    pub fn targets_at(&self, caller: MethodId, site: CallSiteId) -> BTreeSet<MethodId> {
        self.edges
            .iter()
            .filter(|e| e.caller == caller && e.site == site)
            .map(|e| e.callee)
            .collect()
    }

    /// Virtual call sites that can be devirtualized
    pub fn monomorphic_sites(&self) -> Vec<MonomorphicSite> {
        let mut targets: BTreeMap<(MethodId, CallSiteId), BTreeSet<MethodId>> = BTreeMap::new();
        for e in self.edges.iter().filter(|e| e.kind.is_virtual()) {
            targets.entry((e.caller, e.site)).or_default().insert(e.callee);
        }
        targets
            .into_iter()
            .filter(|(_, callees)| callees.len() == 1)
            .filter_map(|((caller, site), callees)| {
                callees.into_iter().next().map(|callee| MonomorphicSite {
                    caller,
                    site,
                    callee,
                })
            })
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn edge(caller: MethodId, site: CallSiteId, kind: InvokeKind, callee: MethodId) -> CallEdge {
        CallEdge {
            caller,
            caller_context: AnalysisContext::empty(),
            site,
            kind,
            callee,
            callee_context: Some(AnalysisContext::empty()),
        }
    }

    #[test]
    fn test_dedup_and_queries() {
        let graph = CallGraph::new(vec![
            edge(0, 1, InvokeKind::Virtual, 2),
            edge(0, 1, InvokeKind::Virtual, 3),
            edge(0, 1, InvokeKind::Virtual, 2),
            edge(4, 9, InvokeKind::Static, 2),
        ]);
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.callees_of(0), BTreeSet::from([2, 3]));
        assert_eq!(graph.callers_of(2), BTreeSet::from([0, 4]));
        assert_eq!(graph.targets_at(0, 1), BTreeSet::from([2, 3]));
    }

    #[test]
    fn test_monomorphic_sites_skip_static_and_polymorphic() {
        let graph = CallGraph::new(vec![
            edge(0, 1, InvokeKind::Virtual, 2),
            edge(0, 1, InvokeKind::Virtual, 3),
            edge(0, 2, InvokeKind::Virtual, 5),
            edge(0, 3, InvokeKind::Static, 6),
        ]);
        assert_eq!(
            graph.monomorphic_sites(),
            vec![MonomorphicSite {
                caller: 0,
                site: 2,
                callee: 5
            }]
        );
    }

    #[test]
    fn test_json_roundtrip() {
        let graph = CallGraph::new(vec![edge(0, 1, InvokeKind::Special, 2)]);
        let json = graph.to_json().unwrap();
        assert!(json.contains("\"Special\""));
        assert_eq!(CallGraph::from_json(&json).unwrap(), graph);
    }
}

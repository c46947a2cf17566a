//! Analysis results
//!
//! Immutable snapshot taken after the fixpoint loop stops: per-clone node
//! states, per-call-site callee sets, field aggregates, violations and run
//! statistics. Everything downstream (reachability, devirtualization) reads
//! from here; the live graphs are dropped with the engine.

use crate::features::type_flow::domain::{
    AnalysisContext, CallEdge, CallGraph, CallSiteId, FieldId, InvokeKind, MethodId,
    SoundnessViolation, TemplateNodeId, TypeState, TypeUniverse,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How the fixpoint loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// Worklist drained: true fixpoint
    Complete,
    /// Cancellation token fired
    Cancelled,
    /// `max_iterations` processed nodes reached
    IterationBudgetExceeded,
    /// `time_budget_ms` elapsed
    TimeBudgetExceeded,
}

impl Completion {
    pub fn is_complete(&self) -> bool {
        matches!(self, Completion::Complete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Completion::Complete => "complete",
            Completion::Cancelled => "cancelled",
            Completion::IterationBudgetExceeded => "iteration_budget_exceeded",
            Completion::TimeBudgetExceeded => "time_budget_exceeded",
        }
    }
}

/// Run statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Nodes taken off the worklist
    pub processed_nodes: usize,
    pub batches: usize,
    /// Batches processed on the rayon pool
    pub parallel_batches: usize,
    /// `add_state` calls that grew a state
    pub state_changes: usize,
    pub clones: usize,
    /// Distinct (call site clone, callee clone) links
    pub links: usize,
    /// Callees without a flow template
    pub unlinked_callees: usize,
    pub duration_ms: u64,
}

/// Callee recorded at one invoke clone
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CalleeSnapshot {
    pub method: MethodId,
    /// `None` if the callee was never linked
    pub context: Option<AnalysisContext>,
}

/// Resolved callees of one invoke clone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeSnapshot {
    pub node: TemplateNodeId,
    pub site: CallSiteId,
    pub kind: InvokeKind,
    pub callees: Vec<CalleeSnapshot>,
}

/// Final state of one method clone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneSnapshot {
    pub method: MethodId,
    pub context: AnalysisContext,
    /// Indexed by template node id
    pub states: Vec<TypeState>,
    pub invokes: Vec<InvokeSnapshot>,
}

impl CloneSnapshot {
    pub fn state(&self, node: TemplateNodeId) -> Option<&TypeState> {
        self.states.get(node as usize)
    }

    pub fn invoke(&self, node: TemplateNodeId) -> Option<&InvokeSnapshot> {
        self.invokes.iter().find(|i| i.node == node)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    clones: Vec<CloneSnapshot>,
    field_states: BTreeMap<FieldId, TypeState>,
    violations: Vec<SoundnessViolation>,
    completion: Completion,
    stats: AnalysisStats,
}

impl AnalysisResult {
    /// `clones` must be sorted by (method, context)
    pub(crate) fn new(
        clones: Vec<CloneSnapshot>,
        field_states: BTreeMap<FieldId, TypeState>,
        violations: Vec<SoundnessViolation>,
        completion: Completion,
        stats: AnalysisStats,
    ) -> Self {
        Self {
            clones,
            field_states,
            violations,
            completion,
            stats,
        }
    }

    pub fn clones(&self) -> &[CloneSnapshot] {
        &self.clones
    }

    /// Clones of `method`, one per context
    pub fn clones_of(&self, method: MethodId) -> impl Iterator<Item = &CloneSnapshot> {
        self.clones.iter().filter(move |c| c.method == method)
    }

    pub fn clone_snapshot(&self, method: MethodId, context: &AnalysisContext) -> Option<&CloneSnapshot> {
        self.clones
            .iter()
            .find(|c| c.method == method && &c.context == context)
    }

    pub fn contexts_of(&self, method: MethodId) -> Vec<&AnalysisContext> {
        self.clones_of(method).map(|c| &c.context).collect()
    }

    /// State of `node` in the clone of `method` for `context`
    pub fn state(&self, method: MethodId, context: &AnalysisContext, node: TemplateNodeId) -> Option<&TypeState> {
        self.clone_snapshot(method, context)?.state(node)
    }

    /// Context-insensitive projection: union over every clone of `method`
    pub fn merged_state(&self, method: MethodId, node: TemplateNodeId) -> TypeState {
        self.clones_of(method)
            .filter_map(|c| c.state(node))
            .fold(TypeState::empty(), |acc, s| acc.union(s))
    }

    /// Distinct callee methods of an invoke node, over every clone
    pub fn callees_at(&self, method: MethodId, node: TemplateNodeId) -> BTreeSet<MethodId> {
        self.clones_of(method)
            .filter_map(|c| c.invoke(node))
            .flat_map(|i| i.callees.iter().map(|c| c.method))
            .collect()
    }

    /// Aggregate of every store to `field` (empty if never stored)
    pub fn field_state(&self, field: FieldId) -> TypeState {
        self.field_states.get(&field).cloned().unwrap_or_default()
    }

    pub fn field_states(&self) -> &BTreeMap<FieldId, TypeState> {
        &self.field_states
    }

    /// Methods with a clone or a recorded incoming call
    pub fn reachable_methods(&self) -> BTreeSet<MethodId> {
        self.clones
            .iter()
            .map(|c| c.method)
            .chain(
                self.clones
                    .iter()
                    .flat_map(|c| c.invokes.iter())
                    .flat_map(|i| i.callees.iter().map(|c| c.method)),
            )
            .collect()
    }

    pub fn is_reachable(&self, method: MethodId) -> bool {
        self.reachable_methods().contains(&method)
    }

    /// Registered methods never reached: dead-code candidates
    pub fn unreachable_methods(&self, universe: &TypeUniverse) -> Vec<MethodId> {
        let reachable = self.reachable_methods();
        universe
            .methods()
            .map(|m| m.id)
            .filter(|id| !reachable.contains(id))
            .collect()
    }

    pub fn call_graph(&self) -> CallGraph {
        let edges = self
            .clones
            .iter()
            .flat_map(|c| {
                c.invokes.iter().flat_map(move |i| {
                    i.callees.iter().map(move |callee| CallEdge {
                        caller: c.method,
                        caller_context: c.context.clone(),
                        site: i.site,
                        kind: i.kind,
                        callee: callee.method,
                        callee_context: callee.context.clone(),
                    })
                })
            })
            .collect();
        CallGraph::new(edges)
    }

    pub fn violations(&self) -> &[SoundnessViolation] {
        &self.violations
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }

    pub fn stats(&self) -> &AnalysisStats {
        &self.stats
    }

    pub fn is_complete(&self) -> bool {
        self.completion.is_complete()
    }

    /// Complete run with no soundness violations
    pub fn is_sound(&self) -> bool {
        self.is_complete() && self.violations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::type_flow::domain::{ContextElement, MethodFlags, ViolationKind};
    use pretty_assertions::assert_eq;

    fn ctx(site: u32) -> AnalysisContext {
        AnalysisContext::from_elements([ContextElement::CallSite(site)])
    }

    fn sample() -> AnalysisResult {
        let main = CloneSnapshot {
            method: 0,
            context: AnalysisContext::empty(),
            states: vec![TypeState::for_allocation(1, 1), TypeState::empty()],
            invokes: vec![InvokeSnapshot {
                node: 1,
                site: 7,
                kind: InvokeKind::Virtual,
                callees: vec![
                    CalleeSnapshot {
                        method: 1,
                        context: Some(ctx(7)),
                    },
                    CalleeSnapshot {
                        method: 3,
                        context: None,
                    },
                ],
            }],
        };
        let callee_a = CloneSnapshot {
            method: 1,
            context: ctx(7),
            states: vec![TypeState::for_allocation(1, 1)],
            invokes: Vec::new(),
        };
        let callee_b = CloneSnapshot {
            method: 1,
            context: ctx(8),
            states: vec![TypeState::for_allocation(2, 5)],
            invokes: Vec::new(),
        };
        AnalysisResult::new(
            vec![main, callee_a, callee_b],
            BTreeMap::from([(0, TypeState::null())]),
            Vec::new(),
            Completion::Complete,
            AnalysisStats::default(),
        )
    }

    #[test]
    fn test_merged_state_unions_contexts() {
        let result = sample();
        let merged = result.merged_state(1, 0);
        assert_eq!(merged.object_count(), 2);
        assert_eq!(result.contexts_of(1).len(), 2);
        assert!(result.merged_state(9, 0).is_empty());
    }

    #[test]
    fn test_reachability_includes_unlinked_callees() {
        let result = sample();
        assert_eq!(result.reachable_methods(), BTreeSet::from([0, 1, 3]));

        let mut universe = TypeUniverse::new();
        for name in ["main", "a", "dead", "native"] {
            universe.add_method(None, name, MethodFlags::static_method()).unwrap();
        }
        assert_eq!(result.unreachable_methods(&universe), vec![2]);
    }

    #[test]
    fn test_call_graph_projection() {
        let graph = sample().call_graph();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.callees_of(0), BTreeSet::from([1, 3]));
        assert!(graph.edges().iter().any(|e| e.callee == 3 && e.callee_context.is_none()));
    }

    #[test]
    fn test_soundness_requires_completion_and_no_violations() {
        let result = sample();
        assert!(result.is_sound());

        let partial = AnalysisResult::new(
            Vec::new(),
            BTreeMap::new(),
            Vec::new(),
            Completion::Cancelled,
            AnalysisStats::default(),
        );
        assert!(!partial.is_sound());

        let violated = AnalysisResult::new(
            Vec::new(),
            BTreeMap::new(),
            vec![SoundnessViolation {
                method: 0,
                context: AnalysisContext::empty(),
                node: 0,
                kind: ViolationKind::FilterOnUnknown,
                detail: String::new(),
            }],
            Completion::Complete,
            AnalysisStats::default(),
        );
        assert!(!violated.is_sound());
    }

    #[test]
    fn test_field_state_defaults_to_empty() {
        let result = sample();
        assert!(result.field_state(0).can_be_null());
        assert!(result.field_state(4).is_empty());
    }
}

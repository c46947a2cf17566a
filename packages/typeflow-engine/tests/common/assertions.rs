//! Custom assertions for analysis results

use std::collections::BTreeSet;
use typeflow_engine::features::type_flow::domain::{TypeId, TypeState};
use typeflow_engine::features::type_flow::AnalysisResult;

/// Types present in a state, as a set
pub fn types_of(state: &TypeState) -> BTreeSet<TypeId> {
    state.types().collect()
}

/// Assert the exact set of types in a state
pub fn assert_types(state: &TypeState, expected: &[TypeId]) {
    let expected: BTreeSet<TypeId> = expected.iter().copied().collect();
    assert_eq!(
        types_of(state),
        expected,
        "unexpected types in state {}",
        state
    );
}

/// Every clone state of `partial` is contained in the matching clone of `full`
pub fn assert_result_contained(partial: &AnalysisResult, full: &AnalysisResult) {
    for clone in partial.clones() {
        let other = full
            .clone_snapshot(clone.method, &clone.context)
            .unwrap_or_else(|| {
                panic!(
                    "clone of method {} in {} missing from the complete run",
                    clone.method, clone.context
                )
            });
        for (node, state) in clone.states.iter().enumerate() {
            assert!(
                state.is_subset_of(&other.states[node]),
                "node {} of method {}: {} not contained in {}",
                node,
                clone.method,
                state,
                other.states[node]
            );
        }
    }
}

/// Same clones, same node states, same call graph
pub fn assert_same_fixpoint(a: &AnalysisResult, b: &AnalysisResult) {
    assert_eq!(a.clones().len(), b.clones().len(), "clone count differs");
    for clone in a.clones() {
        let other = b
            .clone_snapshot(clone.method, &clone.context)
            .unwrap_or_else(|| panic!("clone of method {} missing", clone.method));
        assert_eq!(clone.states, other.states, "states of method {} differ", clone.method);
    }
    assert_eq!(a.call_graph(), b.call_graph());
    assert_eq!(a.field_states(), b.field_states());
}

//! Infrastructure for type-flow analysis
//!
//! Concurrent runtime structures the engine mutates during a run:
//! - FlowNode / FlowRef: per-node state, uses and queue flag
//! - MethodGraphTable: originals, per-context clones, field aggregates
//! - FieldStateTable: field identity → aggregate node
//! - Worklist: batched FIFO with membership flags
//! - InvokeResolution: per-call-site callee bookkeeping
//! - Context policies: built-in `ContextPolicy` implementations

pub mod context_policy;
pub mod field_table;
pub mod flow_node;
pub mod invoke_resolver;
pub mod method_graph;
pub mod worklist;

pub use context_policy::{
    CallStringPolicy, ContextStrategy, InsensitivePolicy, ObjectSensitivePolicy,
    TypeSensitivePolicy,
};
pub use field_table::FieldStateTable;
pub use flow_node::{FlowNode, FlowRef};
pub use invoke_resolver::{InvokeResolution, ReceiverKey, ResolvedCallee};
pub use method_graph::{GraphId, GraphKind, MethodFlowGraph, MethodGraphTable};
pub use worklist::Worklist;

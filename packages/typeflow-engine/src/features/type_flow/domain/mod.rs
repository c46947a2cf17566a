//! Domain models for type-flow analysis
//!
//! Pure values shared by the engine and its callers:
//! - TypeUniverse: nominal type hierarchy and virtual dispatch tables
//! - TypeState: monotone lattice of possible runtime types/objects
//! - AnalysisContext: clone-selection key
//! - MethodTemplate: original per-method flow graph
//! - SoundnessViolation, CallGraph: analysis outputs

pub mod call_graph;
pub mod context;
pub mod flow_template;
pub mod type_state;
pub mod type_universe;
pub mod violation;

pub use call_graph::{CallEdge, CallGraph, MonomorphicSite};
pub use context::{AnalysisContext, ContextElement};
pub use flow_template::{
    FilterSpec, FlowKind, InvokeHandle, InvokeKind, InvokeTemplate, MethodTemplate,
    MethodTemplateBuilder, ParameterRef, TemplateNode, TemplateNodeId,
};
pub use type_state::{ObjectSet, TypeState, TypeStateError};
pub use type_universe::{
    AllocSiteId, CallSiteId, FieldDescriptor, FieldId, MethodDescriptor, MethodFlags, MethodId,
    TypeDef, TypeDescriptor, TypeId, TypeUniverse,
};
pub use violation::{SoundnessViolation, ViolationKind};

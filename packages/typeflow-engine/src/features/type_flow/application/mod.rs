//! Application layer for type-flow analysis
//!
//! - TypeFlowAnalysis: the BigBang fixpoint driver
//! - AnalysisResult: immutable snapshot consumed downstream

pub mod engine;
pub mod result;

pub use engine::{CancellationToken, EntryPoint, TypeFlowAnalysis};
pub use result::{
    AnalysisResult, AnalysisStats, CalleeSnapshot, CloneSnapshot, Completion, InvokeSnapshot,
};

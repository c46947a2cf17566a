//! Soundness violations
//!
//! Operations performed on `Unknown` states. They are reported, not raised:
//! the engine continues with a conservative local result and the run is
//! flagged unsound.

use super::context::AnalysisContext;
use super::flow_template::TemplateNodeId;
use super::type_universe::MethodId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Type test applied to an `Unknown` value
    FilterOnUnknown,
    /// Field store of an `Unknown` value (the store filter cannot narrow it)
    StoreOfUnknown,
    /// Virtual call whose receiver is `Unknown`; nothing can be resolved
    UnknownReceiver,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::FilterOnUnknown => "filter_on_unknown",
            ViolationKind::StoreOfUnknown => "store_of_unknown",
            ViolationKind::UnknownReceiver => "unknown_receiver",
        }
    }
}

/// One reported violation, identifying the offending clone node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundnessViolation {
    pub method: MethodId,
    pub context: AnalysisContext,
    pub node: TemplateNodeId,
    pub kind: ViolationKind,
    pub detail: String,
}

impl fmt::Display for SoundnessViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at method {} node {} in context {}: {}",
            self.kind.as_str(),
            self.method,
            self.node,
            self.context,
            self.detail
        )
    }
}

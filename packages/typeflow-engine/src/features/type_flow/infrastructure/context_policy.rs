//! Built-in context policies
//!
//! Precision vs. scalability knobs for clone creation:
//! - **Insensitive**: one clone per method
//! - **CallString**: k most recent call sites (k-CFA)
//! - **ObjectSensitive**: k most recent receiver allocation sites
//! - **TypeSensitive**: k most recent receiver types
//!
//! Receiver-based policies keep the caller's context for static calls.
//! Call-site elements use the `CallSiteId` of the invoke template, so site
//! ids should be unique across the program.
//!
//! # References
//! - Shivers "Control-Flow Analysis of Higher-Order Languages" (1991)
//! - Milanova et al. "Parameterized Object Sensitivity for Points-to Analysis" (TOSEM 2005)
//! - Smaragdakis et al. "Pick Your Contexts Well" (POPL 2011)

use crate::features::type_flow::domain::{AnalysisContext, ContextElement, MethodId};
use crate::features::type_flow::ports::{CallSite, ContextPolicy, ReceiverObject};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Context sensitivity strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextStrategy {
    /// Context-insensitive (baseline)
    #[default]
    Insensitive,

    /// k-limiting call-string sensitivity (k-CFA)
    CallString,

    /// Receiver allocation sites; type-level receivers contribute their type
    ObjectSensitive,

    /// Receiver types
    TypeSensitive,
}

impl ContextStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextStrategy::Insensitive => "insensitive",
            ContextStrategy::CallString => "call_string",
            ContextStrategy::ObjectSensitive => "object_sensitive",
            ContextStrategy::TypeSensitive => "type_sensitive",
        }
    }

    /// Policy instance with the given k
    pub fn build(self, depth: usize) -> Arc<dyn ContextPolicy> {
        match self {
            ContextStrategy::Insensitive => Arc::new(InsensitivePolicy),
            ContextStrategy::CallString => Arc::new(CallStringPolicy::new(depth)),
            ContextStrategy::ObjectSensitive => Arc::new(ObjectSensitivePolicy::new(depth)),
            ContextStrategy::TypeSensitive => Arc::new(TypeSensitivePolicy::new(depth)),
        }
    }
}

/// Every method gets the empty context
#[derive(Debug, Default, Clone, Copy)]
pub struct InsensitivePolicy;

impl ContextPolicy for InsensitivePolicy {
    fn callee_context(
        &self,
        _site: &CallSite,
        _caller: &AnalysisContext,
        _callee: MethodId,
        _receiver: Option<ReceiverObject>,
    ) -> AnalysisContext {
        AnalysisContext::empty()
    }

    fn name(&self) -> &str {
        ContextStrategy::Insensitive.as_str()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CallStringPolicy {
    depth: usize,
}

impl CallStringPolicy {
    pub fn new(depth: usize) -> Self {
        Self { depth }
    }
}

impl ContextPolicy for CallStringPolicy {
    fn callee_context(
        &self,
        site: &CallSite,
        caller: &AnalysisContext,
        _callee: MethodId,
        _receiver: Option<ReceiverObject>,
    ) -> AnalysisContext {
        caller.push_limited(ContextElement::CallSite(site.site), self.depth)
    }

    fn name(&self) -> &str {
        ContextStrategy::CallString.as_str()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ObjectSensitivePolicy {
    depth: usize,
}

impl ObjectSensitivePolicy {
    pub fn new(depth: usize) -> Self {
        Self { depth }
    }
}

impl ContextPolicy for ObjectSensitivePolicy {
    fn callee_context(
        &self,
        _site: &CallSite,
        caller: &AnalysisContext,
        _callee: MethodId,
        receiver: Option<ReceiverObject>,
    ) -> AnalysisContext {
        match receiver {
            Some(ReceiverObject {
                object: Some(alloc),
                ..
            }) => caller.push_limited(ContextElement::AllocSite(alloc), self.depth),
            Some(ReceiverObject { ty, object: None }) => {
                caller.push_limited(ContextElement::Type(ty), self.depth)
            }
            None => caller.clone(),
        }
    }

    fn name(&self) -> &str {
        ContextStrategy::ObjectSensitive.as_str()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TypeSensitivePolicy {
    depth: usize,
}

impl TypeSensitivePolicy {
    pub fn new(depth: usize) -> Self {
        Self { depth }
    }
}

impl ContextPolicy for TypeSensitivePolicy {
    fn callee_context(
        &self,
        _site: &CallSite,
        caller: &AnalysisContext,
        _callee: MethodId,
        receiver: Option<ReceiverObject>,
    ) -> AnalysisContext {
        match receiver {
            Some(r) => caller.push_limited(ContextElement::Type(r.ty), self.depth),
            None => caller.clone(),
        }
    }

    fn name(&self) -> &str {
        ContextStrategy::TypeSensitive.as_str()
    }
}

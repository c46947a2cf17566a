//! Analysis Context
//!
//! Immutable key distinguishing calling contexts. At most one clone of a
//! method's flow graph exists per distinct context.

use super::type_universe::{AllocSiteId, CallSiteId, TypeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry of a context string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContextElement {
    /// Call site (k-CFA)
    CallSite(CallSiteId),
    /// Receiver allocation site (object sensitivity)
    AllocSite(AllocSiteId),
    /// Receiver type (type sensitivity)
    Type(TypeId),
}

impl fmt::Display for ContextElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextElement::CallSite(id) => write!(f, "site:{}", id),
            ContextElement::AllocSite(id) => write!(f, "alloc:{}", id),
            ContextElement::Type(id) => write!(f, "type:{}", id),
        }
    }
}

/// Calling context: the most recent elements, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnalysisContext {
    elements: Vec<ContextElement>,
}

impl AnalysisContext {
    /// The context-insensitive / root context
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_elements(elements: impl IntoIterator<Item = ContextElement>) -> Self {
        Self {
            elements: elements.into_iter().collect(),
        }
    }

    /// Append `element`, keeping only the last `k` entries
    pub fn push_limited(&self, element: ContextElement, k: usize) -> Self {
        if k == 0 {
            return Self::empty();
        }
        let mut elements = self.elements.clone();
        elements.push(element);
        if elements.len() > k {
            elements.drain(..elements.len() - k);
        }
        Self { elements }
    }

    pub fn depth(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[ContextElement] {
        &self.elements
    }
}

impl fmt::Display for AnalysisContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, e) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", e)?;
        }
        write!(f, "]")
    }
}

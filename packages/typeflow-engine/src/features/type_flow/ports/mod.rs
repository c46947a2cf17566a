//! Ports (Interfaces) for type-flow analysis
//!
//! Seams where callers plug behavior into the engine:
//! - **ContextPolicy**: how many clones exist per method
//! - **ViolationReporter**: where soundness violations go
//!
//! Both are `Send + Sync`; the engine calls them from worker threads.

use crate::features::type_flow::domain::{
    AllocSiteId, AnalysisContext, CallSiteId, InvokeKind, MethodId, SoundnessViolation, TypeId,
};
use parking_lot::Mutex;

// ============================================================================
// Context selection
// ============================================================================

/// Call site being linked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSite {
    pub caller: MethodId,
    pub site: CallSiteId,
    pub kind: InvokeKind,
}

/// Concrete receiver a callee is being linked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiverObject {
    pub ty: TypeId,
    /// `None` for type-level receivers
    pub object: Option<AllocSiteId>,
}

/// Maps a call to the context of the callee clone
///
/// # Example
/// ```ignore
/// struct PerSite;
///
/// impl ContextPolicy for PerSite {
///     fn callee_context(&self, site: &CallSite, _: &AnalysisContext, _: MethodId,
///                       _: Option<ReceiverObject>) -> AnalysisContext {
///         AnalysisContext::from_elements([ContextElement::CallSite(site.site)])
///     }
/// }
/// ```
pub trait ContextPolicy: Send + Sync {
    /// Context of entry-point clones
    fn root_context(&self) -> AnalysisContext {
        AnalysisContext::empty()
    }

    /// Context of the callee clone linked from `site`
    fn callee_context(
        &self,
        site: &CallSite,
        caller: &AnalysisContext,
        callee: MethodId,
        receiver: Option<ReceiverObject>,
    ) -> AnalysisContext;

    /// Name for logs
    fn name(&self) -> &str {
        "custom"
    }
}

// ============================================================================
// Violation reporting
// ============================================================================

/// Receives soundness violations as they are detected
pub trait ViolationReporter: Send + Sync {
    fn report(&self, violation: &SoundnessViolation);
}

impl<F> ViolationReporter for F
where
    F: Fn(&SoundnessViolation) + Send + Sync,
{
    fn report(&self, violation: &SoundnessViolation) {
        self(violation)
    }
}

/// Default reporter: one `warn!` per violation
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ViolationReporter for TracingReporter {
    fn report(&self, violation: &SoundnessViolation) {
        tracing::warn!(
            method = violation.method,
            node = violation.node,
            context = %violation.context,
            kind = violation.kind.as_str(),
            "Soundness violation: {}",
            violation.detail
        );
    }
}

/// Keeps every reported violation in memory
#[derive(Debug, Default)]
pub struct CollectingReporter {
    violations: Mutex<Vec<SoundnessViolation>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn violations(&self) -> Vec<SoundnessViolation> {
        self.violations.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.violations.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.lock().is_empty()
    }
}

impl ViolationReporter for CollectingReporter {
    fn report(&self, violation: &SoundnessViolation) {
        self.violations.lock().push(violation.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::type_flow::domain::ViolationKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn violation() -> SoundnessViolation {
        SoundnessViolation {
            method: 1,
            context: AnalysisContext::empty(),
            node: 2,
            kind: ViolationKind::StoreOfUnknown,
            detail: "store to field 4".to_string(),
        }
    }

    #[test]
    fn test_closure_reporter() {
        let count = AtomicUsize::new(0);
        let reporter = |_: &SoundnessViolation| {
            count.fetch_add(1, Ordering::Relaxed);
        };
        reporter.report(&violation());
        reporter.report(&violation());
        assert_eq!(count.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_collecting_reporter() {
        let reporter = CollectingReporter::new();
        assert!(reporter.is_empty());
        reporter.report(&violation());
        assert_eq!(reporter.len(), 1);
        assert_eq!(reporter.violations()[0], violation());
    }

    #[test]
    fn test_default_context_policy_root_is_empty() {
        struct Fixed;
        impl ContextPolicy for Fixed {
            fn callee_context(
                &self,
                _: &CallSite,
                caller: &AnalysisContext,
                _: MethodId,
                _: Option<ReceiverObject>,
            ) -> AnalysisContext {
                caller.clone()
            }
        }
        assert!(Fixed.root_context().is_empty());
        assert_eq!(Fixed.name(), "custom");
    }
}

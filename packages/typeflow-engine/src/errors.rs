//! Error types for typeflow-engine
//!
//! Provides unified error handling across the crate. Internal consistency
//! violations (mutating an original node, re-resolving a static call site)
//! are bugs and panic instead of surfacing here.

use crate::config::ConfigError;
use crate::features::type_flow::application::result::Completion;
use crate::features::type_flow::domain::type_universe::{FieldId, MethodId, TypeId};
use thiserror::Error;

/// Main error type for typeflow-engine operations
#[derive(Debug, Error)]
pub enum TypeFlowError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Type id not registered in the universe
    #[error("Unknown type id {0}")]
    UnknownType(TypeId),

    /// Method id not registered in the universe
    #[error("Unknown method id {0}")]
    UnknownMethod(MethodId),

    /// Field id not registered in the universe
    #[error("Unknown field id {0}")]
    UnknownField(FieldId),

    /// Entry point or callee lookup for a method without a flow template
    #[error("No flow template registered for method {0}")]
    MissingTemplate(MethodId),

    /// Second template for the same method
    #[error("Flow template for method {0} is already registered")]
    DuplicateTemplate(MethodId),

    /// Structurally broken template
    #[error("Invalid flow template for method {method}: {reason}")]
    InvalidTemplate { method: MethodId, reason: String },

    /// Entry point argument count does not match the template
    #[error("Entry point {method} expects {expected} arguments, got {found}")]
    ArityMismatch {
        method: MethodId,
        expected: usize,
        found: usize,
    },

    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// Strict mode: the run cannot be trusted
    #[error("Analysis is unsound: {violations} soundness violation(s), completion {completion:?}")]
    Unsound {
        violations: usize,
        completion: Completion,
    },
}

impl TypeFlowError {
    /// Create an invalid-template error
    pub fn invalid_template(method: MethodId, reason: impl Into<String>) -> Self {
        TypeFlowError::InvalidTemplate {
            method,
            reason: reason.into(),
        }
    }
}

/// Result type alias for typeflow operations
pub type Result<T> = std::result::Result<T, TypeFlowError>;

/*
 * Typeflow Engine - Whole-Program Type-Flow Analysis
 *
 * Feature-First Hexagonal Architecture:
 * - config/      : TypeFlowConfig, presets, YAML loading
 * - features/    : Vertical slices (type_flow: domain → infrastructure → application)
 * - errors       : Crate-wide error type
 *
 * Performance:
 * - Per-node locking, no global lock on the propagation path
 * - Rayon batches for large worklist waves
 */

// Crate-level lint configuration
#![allow(clippy::too_many_arguments)] // Resolution steps carry caller and callee state
#![allow(clippy::type_complexity)] // Concurrent tables keyed by tuples
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::len_without_is_empty)] // Counters on concurrent tables

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

/// Feature modules
pub mod features;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{ConfigError, Preset, TypeFlowConfig};
pub use errors::{Result, TypeFlowError};
pub use features::type_flow::{
    AnalysisContext, AnalysisResult, CallGraph, CancellationToken, Completion, ContextPolicy,
    ContextStrategy, EntryPoint, MethodTemplate, SoundnessViolation, TypeFlowAnalysis, TypeState,
    TypeUniverse, ViolationReporter,
};

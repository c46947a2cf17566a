//! Common test utilities for typeflow-engine
//!
//! This module provides shared program fixtures, assertions, and builders
//! for integration and property tests.

#![allow(dead_code)]

mod assertions;
mod builders;
mod fixtures;

// Re-export all utilities
pub use assertions::*;
pub use builders::*;
pub use fixtures::*;

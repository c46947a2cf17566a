//! Configuration System
//!
//! Three levels of control:
//! - Level 1: Preset - Simple one-liner
//! - Level 2: Builder overrides - Partial adjustment
//! - Level 3: YAML - Complete control
//!
//! # Examples
//!
//! ```rust,ignore
//! use typeflow_engine::config::{Preset, TypeFlowConfig};
//! use typeflow_engine::features::type_flow::ContextStrategy;
//!
//! // Level 1: Simple preset
//! let config = TypeFlowConfig::from_preset(Preset::Fast);
//!
//! // Level 2: Override specific fields
//! let config = TypeFlowConfig::from_preset(Preset::Balanced)
//!     .context(ContextStrategy::ObjectSensitive, 2)
//!     .max_iterations(Some(1_000_000));
//!
//! // Level 3: Complete control via YAML
//! let config = TypeFlowConfig::from_yaml_file("typeflow.yaml")?;
//! ```

pub mod analysis_config;
pub mod error;
pub mod io;
pub mod preset;

// Re-exports
pub use analysis_config::{TypeFlowConfig, MAX_BATCH_SIZE, MAX_CONTEXT_DEPTH, MAX_THREADS};
pub use error::{ConfigError, ConfigResult};
pub use io::{ConfigFileV1, ConfigOverrides};
pub use preset::Preset;

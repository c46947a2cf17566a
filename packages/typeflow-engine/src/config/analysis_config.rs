//! Type-flow analysis configuration

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use crate::features::type_flow::infrastructure::context_policy::ContextStrategy;
use serde::{Deserialize, Serialize};

/// Deepest context the built-in policies accept
pub const MAX_CONTEXT_DEPTH: usize = 8;

/// Upper bound on explicitly requested worker threads
pub const MAX_THREADS: usize = 256;

/// Upper bound on nodes drained per worklist batch
pub const MAX_BATCH_SIZE: usize = 1_000_000;

/// Type-flow analysis configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeFlowConfig {
    /// How callee clones are keyed
    pub context_strategy: ContextStrategy,

    /// k for call-string / object / type sensitivity
    pub context_depth: usize,

    /// Narrow parameters, results and field loads to their declared type
    pub clamp_declared_types: bool,

    /// Feed a parameter-returning callee's result from the call site's own actual
    pub divert_parameter_returns: bool,

    /// Fail the run on any soundness violation or incomplete fixpoint
    pub strict: bool,

    /// Process large batches on the rayon pool
    pub parallel: bool,

    /// Worker threads (0 = rayon default)
    pub num_threads: usize,

    /// Nodes drained from the worklist per batch
    pub batch_size: usize,

    /// Batches smaller than this run on the calling thread
    pub parallel_threshold: usize,

    /// Max processed nodes (None = unlimited)
    pub max_iterations: Option<usize>,

    /// Wall-clock budget in milliseconds (None = unlimited)
    pub time_budget_ms: Option<u64>,
}

impl TypeFlowConfig {
    /// Reject out-of-range values and contradictory combinations
    pub fn validate(&self) -> ConfigResult<()> {
        if self.context_depth > MAX_CONTEXT_DEPTH {
            return Err(ConfigError::out_of_range(
                "context_depth",
                self.context_depth,
                0,
                MAX_CONTEXT_DEPTH,
                "deeper contexts explode the clone count",
            ));
        }
        if self.context_strategy != ContextStrategy::Insensitive && self.context_depth == 0 {
            return Err(ConfigError::conflict(
                format!(
                    "context strategy '{}' with context_depth 0",
                    self.context_strategy.as_str()
                ),
                "use the insensitive strategy or a depth of at least 1",
            ));
        }

        if self.num_threads > MAX_THREADS {
            return Err(ConfigError::out_of_range(
                "num_threads",
                self.num_threads,
                0,
                MAX_THREADS,
                "0 lets rayon pick the thread count",
            ));
        }
        if !self.parallel && self.num_threads > 1 {
            return Err(ConfigError::conflict(
                format!("num_threads = {} with parallel disabled", self.num_threads),
                "enable parallel or set num_threads to 0",
            ));
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::out_of_range(
                "batch_size",
                self.batch_size,
                1,
                MAX_BATCH_SIZE,
                "budgets and cancellation are checked once per batch",
            ));
        }

        if self.max_iterations == Some(0) {
            return Err(ConfigError::ZeroBudget("max_iterations"));
        }
        if self.time_budget_ms == Some(0) {
            return Err(ConfigError::ZeroBudget("time_budget_ms"));
        }
        Ok(())
    }

    /// Builder: Set context strategy and depth
    pub fn context(mut self, strategy: ContextStrategy, depth: usize) -> Self {
        self.context_strategy = strategy;
        self.context_depth = depth;
        self
    }

    /// Builder: Set clamp_declared_types
    pub fn clamp_declared_types(mut self, v: bool) -> Self {
        self.clamp_declared_types = v;
        self
    }

    /// Builder: Set divert_parameter_returns
    pub fn divert_parameter_returns(mut self, v: bool) -> Self {
        self.divert_parameter_returns = v;
        self
    }

    /// Builder: Set strict
    pub fn strict(mut self, v: bool) -> Self {
        self.strict = v;
        self
    }

    /// Builder: Set parallel
    pub fn parallel(mut self, v: bool) -> Self {
        self.parallel = v;
        self
    }

    /// Builder: Set num_threads
    pub fn num_threads(mut self, v: usize) -> Self {
        self.num_threads = v;
        self
    }

    /// Builder: Set batch_size
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Builder: Set parallel_threshold
    pub fn parallel_threshold(mut self, v: usize) -> Self {
        self.parallel_threshold = v;
        self
    }

    /// Builder: Set max_iterations
    pub fn max_iterations(mut self, v: Option<usize>) -> Self {
        self.max_iterations = v;
        self
    }

    /// Builder: Set time_budget_ms
    pub fn time_budget_ms(mut self, v: Option<u64>) -> Self {
        self.time_budget_ms = v;
        self
    }

    /// Get preset configuration
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Fast => Self {
                context_strategy: ContextStrategy::Insensitive,
                context_depth: 0,
                clamp_declared_types: false,
                divert_parameter_returns: false,
                strict: false,
                parallel: true,
                num_threads: 0,
                batch_size: 4096,
                parallel_threshold: 512,
                max_iterations: None,
                time_budget_ms: None,
            },
            Preset::Balanced => Self {
                context_strategy: ContextStrategy::CallString,
                context_depth: 1,
                clamp_declared_types: true,
                divert_parameter_returns: true,
                strict: false,
                parallel: true,
                num_threads: 0,
                batch_size: 1024,
                parallel_threshold: 256,
                max_iterations: None,
                time_budget_ms: None,
            },
            Preset::Thorough => Self {
                context_strategy: ContextStrategy::ObjectSensitive,
                context_depth: 2,
                clamp_declared_types: true,
                divert_parameter_returns: true,
                strict: true,
                parallel: true,
                num_threads: 0,
                batch_size: 1024,
                parallel_threshold: 256,
                max_iterations: None,
                time_budget_ms: None,
            },
            Preset::Custom => Self {
                context_strategy: ContextStrategy::Insensitive,
                context_depth: 0,
                clamp_declared_types: false,
                divert_parameter_returns: false,
                strict: false,
                parallel: false,
                num_threads: 0,
                batch_size: 1024,
                parallel_threshold: usize::MAX,
                max_iterations: None,
                time_budget_ms: None,
            },
        }
    }
}

impl Default for TypeFlowConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

//! Test program builders
//!
//! A `Program` bundles a frozen type universe, the method templates and the
//! entry points, and can be analyzed any number of times.

use std::sync::Arc;
use typeflow_engine::config::TypeFlowConfig;
use typeflow_engine::features::type_flow::{
    AnalysisResult, EntryPoint, MethodTemplate, TypeFlowAnalysis, TypeUniverse, ViolationReporter,
};
use typeflow_engine::Result;

#[derive(Debug, Clone)]
pub struct Program {
    pub universe: Arc<TypeUniverse>,
    pub templates: Vec<MethodTemplate>,
    pub entry_points: Vec<EntryPoint>,
}

impl Program {
    pub fn new(universe: TypeUniverse) -> Self {
        Self {
            universe: Arc::new(universe),
            templates: Vec::new(),
            entry_points: Vec::new(),
        }
    }

    pub fn with_template(mut self, template: MethodTemplate) -> Self {
        self.templates.push(template);
        self
    }

    pub fn with_entry(mut self, entry: EntryPoint) -> Self {
        self.entry_points.push(entry);
        self
    }

    /// Analysis with every template and entry point registered
    pub fn analysis(&self, config: TypeFlowConfig) -> Result<TypeFlowAnalysis> {
        let mut analysis = TypeFlowAnalysis::new(Arc::clone(&self.universe), config)?;
        analysis.register_templates(self.templates.iter().cloned())?;
        for entry in &self.entry_points {
            analysis.add_entry_point(entry.clone())?;
        }
        Ok(analysis)
    }

    pub fn run(&self, config: TypeFlowConfig) -> Result<AnalysisResult> {
        self.analysis(config)?.run()
    }

    pub fn run_with_reporter(
        &self,
        config: TypeFlowConfig,
        reporter: Arc<dyn ViolationReporter>,
    ) -> Result<AnalysisResult> {
        self.analysis(config)?.with_reporter(reporter).run()
    }
}

/// Single-threaded configuration
pub fn sequential_config() -> TypeFlowConfig {
    TypeFlowConfig::default().parallel(false).num_threads(0)
}

/// Parallel configuration that sends every batch to the pool
pub fn eager_parallel_config(threads: usize) -> TypeFlowConfig {
    TypeFlowConfig::default()
        .parallel(true)
        .num_threads(threads)
        .batch_size(8)
        .parallel_threshold(1)
}

//! BigBang: whole-program type-flow fixpoint
//!
//! Seeds entry-point clones, then drains the shared worklist until no node
//! changes. Processing a node either propagates its state along its
//! use-edges (through the target's transfer function) or, for invoke nodes,
//! resolves callees and links their clones. The call graph grows as a side
//! effect of propagation.
//!
//! # Concurrency
//! - Per-node state locks; no global lock on the propagation path
//! - Batches at or above `parallel_threshold` run on a rayon pool
//! - Invoke resolution holds the call site's resolution mutex for the
//!   whole step (exactly-once linking per receiver object)
//!
//! # Example
//! ```text
//! let mut analysis = TypeFlowAnalysis::new(universe, TypeFlowConfig::default())?;
//! analysis.register_template(main_template)?;
//! analysis.add_entry_point(EntryPoint::new(main))?;
//! let result = analysis.run()?;
//! let graph = result.call_graph();
//! ```

use super::result::{
    AnalysisResult, AnalysisStats, CalleeSnapshot, CloneSnapshot, Completion, InvokeSnapshot,
};
use crate::config::TypeFlowConfig;
use crate::errors::{Result, TypeFlowError};
use crate::features::type_flow::domain::{
    AnalysisContext, FieldId, FilterSpec, FlowKind, InvokeKind, InvokeTemplate, MethodId,
    MethodTemplate, ParameterRef, SoundnessViolation, TemplateNodeId, TypeId, TypeState,
    TypeUniverse, ViolationKind,
};
use crate::features::type_flow::infrastructure::{
    FieldStateTable, FlowNode, FlowRef, InvokeResolution, MethodFlowGraph, MethodGraphTable,
    ResolvedCallee, Worklist,
};
use crate::features::type_flow::ports::{
    CallSite, ContextPolicy, ReceiverObject, TracingReporter, ViolationReporter,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// Cooperative cancellation, checked between worklist batches
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Root method with fixed incoming states
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub method: MethodId,
    pub receiver: Option<TypeState>,
    /// One state per formal parameter position
    pub arguments: Vec<TypeState>,
}

impl EntryPoint {
    pub fn new(method: MethodId) -> Self {
        Self {
            method,
            receiver: None,
            arguments: Vec::new(),
        }
    }

    pub fn with_receiver(mut self, state: TypeState) -> Self {
        self.receiver = Some(state);
        self
    }

    pub fn with_argument(mut self, state: TypeState) -> Self {
        self.arguments.push(state);
        self
    }

    /// `count` arguments of unknown type (e.g. `main(String[] args)`)
    pub fn with_unknown_arguments(mut self, count: usize) -> Self {
        self.arguments.extend((0..count).map(|_| TypeState::unknown()));
        self
    }
}

#[derive(Debug, Default)]
struct StatsCounters {
    processed: AtomicUsize,
    batches: AtomicUsize,
    parallel_batches: AtomicUsize,
    state_changes: AtomicUsize,
    clones: AtomicUsize,
    links: AtomicUsize,
    unlinked: AtomicUsize,
}

impl StatsCounters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self, duration: Duration) -> AnalysisStats {
        AnalysisStats {
            processed_nodes: self.processed.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
            parallel_batches: self.parallel_batches.load(Ordering::Relaxed),
            state_changes: self.state_changes.load(Ordering::Relaxed),
            clones: self.clones.load(Ordering::Relaxed),
            links: self.links.load(Ordering::Relaxed),
            unlinked_callees: self.unlinked.load(Ordering::Relaxed),
            duration_ms: duration.as_millis() as u64,
        }
    }
}

/// How a callee's formal receiver is fed
#[derive(Debug, Clone, Copy)]
enum ReceiverLink {
    /// Static/special: plain edge from the actual receiver, if any
    Plain(Option<FlowRef>),
    /// Virtual: exactly the resolved object
    Object(ReceiverObject),
}

/// Type-flow analysis run
pub struct TypeFlowAnalysis {
    universe: Arc<TypeUniverse>,
    config: TypeFlowConfig,
    policy: Arc<dyn ContextPolicy>,
    reporter: Arc<dyn ViolationReporter>,
    cancellation: CancellationToken,
    graphs: MethodGraphTable,
    fields: FieldStateTable,
    worklist: Worklist,
    entry_points: Vec<EntryPoint>,
    hierarchy_cache: DashMap<(TypeId, bool), Arc<TypeState>>,
    violations: Mutex<Vec<SoundnessViolation>>,
    stats: StatsCounters,
}

impl TypeFlowAnalysis {
    /// New analysis; the context policy comes from the config
    pub fn new(universe: Arc<TypeUniverse>, config: TypeFlowConfig) -> Result<Self> {
        config.validate()?;
        let policy = config.context_strategy.build(config.context_depth);
        Ok(Self {
            universe,
            config,
            policy,
            reporter: Arc::new(TracingReporter),
            cancellation: CancellationToken::new(),
            graphs: MethodGraphTable::new(),
            fields: FieldStateTable::new(),
            worklist: Worklist::new(),
            entry_points: Vec::new(),
            hierarchy_cache: DashMap::new(),
            violations: Mutex::new(Vec::new()),
            stats: StatsCounters::default(),
        })
    }

    /// Replace the configured context policy
    pub fn with_context_policy(mut self, policy: Arc<dyn ContextPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Soundness violations go to `reporter` (default: `warn!` logs)
    pub fn with_reporter(mut self, reporter: Arc<dyn ViolationReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn config(&self) -> &TypeFlowConfig {
        &self.config
    }

    pub fn universe(&self) -> &TypeUniverse {
        &self.universe
    }

    /// Register the original flow graph of one method
    pub fn register_template(&mut self, template: MethodTemplate) -> Result<()> {
        template.validate(&self.universe)?;
        self.graphs.register_original(template)?;
        Ok(())
    }

    pub fn register_templates(
        &mut self,
        templates: impl IntoIterator<Item = MethodTemplate>,
    ) -> Result<()> {
        for template in templates {
            self.register_template(template)?;
        }
        Ok(())
    }

    pub fn add_entry_point(&mut self, entry: EntryPoint) -> Result<()> {
        let method = entry.method;
        self.universe
            .method(method)
            .ok_or(TypeFlowError::UnknownMethod(method))?;
        let original = self
            .graphs
            .original_of(method)
            .ok_or(TypeFlowError::MissingTemplate(method))?;
        let template = original
            .template()
            .ok_or(TypeFlowError::MissingTemplate(method))?;

        if entry.arguments.len() != template.parameters.len() {
            return Err(TypeFlowError::ArityMismatch {
                method,
                expected: template.parameters.len(),
                found: entry.arguments.len(),
            });
        }
        if entry.receiver.is_some() && template.receiver.is_none() {
            return Err(TypeFlowError::invalid_template(
                method,
                "entry point supplies a receiver but the method has no formal receiver",
            ));
        }

        self.entry_points.push(entry);
        Ok(())
    }

    /// Run to a fixpoint (or until a budget/cancellation stops the loop)
    pub fn run(self) -> Result<AnalysisResult> {
        let start = Instant::now();
        info!(
            templates = self.graphs.template_count(),
            entry_points = self.entry_points.len(),
            policy = self.policy.name(),
            parallel = self.config.parallel,
            "Type-flow analysis started"
        );

        self.seed_entry_points();

        let completion = if self.config.parallel && cfg!(feature = "parallel") {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.num_threads)
                .thread_name(|i| format!("typeflow-worker-{}", i))
                .build()
                .map_err(|e| TypeFlowError::ThreadPool(e.to_string()))?;
            pool.install(|| self.fixpoint(start))
        } else {
            self.fixpoint(start)
        };

        let result = self.collect(completion, start.elapsed());
        let stats = result.stats();
        info!(
            completion = completion.as_str(),
            processed = stats.processed_nodes,
            clones = stats.clones,
            links = stats.links,
            violations = result.violations().len(),
            duration_ms = stats.duration_ms,
            "Type-flow analysis finished"
        );

        if self.config.strict && !result.is_sound() {
            return Err(TypeFlowError::Unsound {
                violations: result.violations().len(),
                completion,
            });
        }
        Ok(result)
    }

    // ------------------------------------------------------------------------
    // Driver
    // ------------------------------------------------------------------------

    fn seed_entry_points(&self) {
        let root = self.policy.root_context();
        for entry in &self.entry_points {
            let Some((graph, created)) = self.graphs.get_or_create_clone(entry.method, &root) else {
                continue;
            };
            if created {
                self.initialize_clone(&graph);
            }
            if let (Some(state), Some(formal)) = (&entry.receiver, graph.formal_receiver()) {
                self.deliver(formal, state);
            }
            for (index, state) in entry.arguments.iter().enumerate() {
                if let Some(formal) = graph.formal_parameter(index) {
                    self.deliver(formal, state);
                }
            }
        }
    }

    fn fixpoint(&self, start: Instant) -> Completion {
        let budget = self.config.time_budget_ms.map(Duration::from_millis);
        let mut processed = 0usize;

        loop {
            if self.worklist.is_empty() {
                return Completion::Complete;
            }
            if self.cancellation.is_cancelled() {
                warn!(processed, pending = self.worklist.len(), "Type-flow analysis cancelled");
                return Completion::Cancelled;
            }
            if let Some(max) = self.config.max_iterations {
                if processed >= max {
                    warn!(max, pending = self.worklist.len(), "Iteration budget exhausted");
                    return Completion::IterationBudgetExceeded;
                }
            }
            if let Some(budget) = budget {
                if start.elapsed() >= budget {
                    warn!(
                        budget_ms = budget.as_millis() as u64,
                        pending = self.worklist.len(),
                        "Time budget exhausted"
                    );
                    return Completion::TimeBudgetExceeded;
                }
            }

            let limit = match self.config.max_iterations {
                Some(max) => self.config.batch_size.min(max - processed),
                None => self.config.batch_size,
            };
            let batch = self.worklist.drain_batch(limit);
            processed += batch.len();
            StatsCounters::bump(&self.stats.batches);

            if self.config.parallel
                && cfg!(feature = "parallel")
                && batch.len() >= self.config.parallel_threshold
            {
                StatsCounters::bump(&self.stats.parallel_batches);
                batch.par_iter().for_each(|&r| self.process(r));
            } else {
                for r in batch {
                    self.process(r);
                }
            }
        }
    }

    fn process(&self, r: FlowRef) {
        let Some(graph) = self.graphs.get(r.graph) else {
            return;
        };
        let Some(node) = graph.node(r.node) else {
            return;
        };
        node.dequeue();
        StatsCounters::bump(&self.stats.processed);

        match node.kind() {
            FlowKind::Invoke(invoke) => self.process_invoke(&graph, r.node, node, invoke),
            _ => {
                let state = node.state();
                for target in node.uses() {
                    self.deliver(target, &state);
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Propagation
    // ------------------------------------------------------------------------

    /// Push `state` into `target` through its transfer function
    fn deliver(&self, target: FlowRef, state: &TypeState) {
        let Some(graph) = self.graphs.get(target.graph) else {
            return;
        };
        let Some(node) = graph.node(target.node) else {
            return;
        };
        let incoming = self.transfer(&graph, target.node, node, state);
        if node.add_state(&incoming) {
            StatsCounters::bump(&self.stats.state_changes);
            self.worklist.push(target, node);
        }
    }

    /// Add a use-edge and deliver the current state of `from` along it
    fn connect(&self, from: FlowRef, to: FlowRef) {
        let state = self
            .graphs
            .with_node(from, |_, node| node.add_use(to).then(|| node.state()))
            .flatten();
        if let Some(state) = state {
            self.deliver(to, &state);
        }
    }

    fn transfer<'a>(
        &self,
        graph: &MethodFlowGraph,
        id: TemplateNodeId,
        node: &FlowNode,
        state: &'a TypeState,
    ) -> Cow<'a, TypeState> {
        match node.kind() {
            FlowKind::Filter(spec) => Cow::Owned(self.apply_filter(graph, id, node, spec, state)),
            FlowKind::FieldStore(field) => {
                let declared = self.universe.field(*field).map(|f| f.declared_type);
                match declared {
                    Some(ty) => {
                        let filter = self.hierarchy(ty, true);
                        match state.intersect(&filter) {
                            Ok(stored) => Cow::Owned(stored),
                            Err(_) => {
                                self.report(
                                    graph,
                                    id,
                                    node,
                                    ViolationKind::StoreOfUnknown,
                                    format!("store of unknown value into field {}", field),
                                );
                                Cow::Owned(TypeState::empty())
                            }
                        }
                    }
                    None => Cow::Borrowed(state),
                }
            }
            FlowKind::Parameter(_) | FlowKind::Result | FlowKind::FieldLoad(_)
                if self.config.clamp_declared_types && !state.is_unknown() =>
            {
                match node.declared_type() {
                    Some(ty) => state
                        .intersect(&self.hierarchy(ty, true))
                        .map(Cow::Owned)
                        .unwrap_or(Cow::Borrowed(state)),
                    None => Cow::Borrowed(state),
                }
            }
            _ => Cow::Borrowed(state),
        }
    }

    /// Type test: intersect or subtract against the exact type or its hierarchy
    fn apply_filter(
        &self,
        graph: &MethodFlowGraph,
        id: TemplateNodeId,
        node: &FlowNode,
        spec: &FilterSpec,
        state: &TypeState,
    ) -> TypeState {
        let include_null = if spec.assignable {
            spec.include_null
        } else {
            !spec.include_null
        };
        let filter = if spec.exact {
            Arc::new(TypeState::for_exact_type(spec.filter_type, include_null))
        } else {
            self.hierarchy(spec.filter_type, include_null)
        };
        let filtered = if spec.assignable {
            state.intersect(&filter)
        } else {
            state.subtract(&filter)
        };
        filtered.unwrap_or_else(|_| {
            self.report(
                graph,
                id,
                node,
                ViolationKind::FilterOnUnknown,
                format!(
                    "type test against {} applied to an unknown state",
                    self.universe.type_name(spec.filter_type)
                ),
            );
            TypeState::empty()
        })
    }

    /// Type-level state of `ty` and its subtypes (cached)
    fn hierarchy(&self, ty: TypeId, include_null: bool) -> Arc<TypeState> {
        if let Some(cached) = self.hierarchy_cache.get(&(ty, include_null)) {
            return Arc::clone(&cached);
        }
        let state = Arc::new(TypeState::for_type_hierarchy(&self.universe, ty, include_null));
        self.hierarchy_cache
            .entry((ty, include_null))
            .or_insert(state)
            .clone()
    }

    fn report(
        &self,
        graph: &MethodFlowGraph,
        id: TemplateNodeId,
        node: &FlowNode,
        kind: ViolationKind,
        detail: String,
    ) {
        if !node.mark_violation_reported() {
            return;
        }
        let (Some(method), Some(context)) = (graph.method(), graph.context()) else {
            error!(graph = graph.id(), node = id, kind = kind.as_str(), "Violation outside a method clone");
            return;
        };
        let violation = SoundnessViolation {
            method,
            context: context.clone(),
            node: id,
            kind,
            detail,
        };
        self.reporter.report(&violation);
        self.violations.lock().push(violation);
    }

    // ------------------------------------------------------------------------
    // Clones
    // ------------------------------------------------------------------------

    /// Seed a fresh clone: sources, static calls and field connections
    fn initialize_clone(&self, graph: &MethodFlowGraph) {
        StatsCounters::bump(&self.stats.clones);
        debug!(
            method = graph.method().unwrap_or_default(),
            context = %graph.context().cloned().unwrap_or_default(),
            nodes = graph.len(),
            "Created flow graph clone"
        );

        for (index, node) in graph.nodes().iter().enumerate() {
            let r = graph.flow_ref(index as TemplateNodeId);
            match node.kind() {
                FlowKind::Source(state) => {
                    if node.add_state(state) {
                        StatsCounters::bump(&self.stats.state_changes);
                        self.worklist.push(r, node);
                    }
                }
                FlowKind::Invoke(invoke) if !invoke.kind.is_virtual() => {
                    self.worklist.push(r, node);
                }
                FlowKind::FieldStore(field) => {
                    let aggregate = self.field_aggregate(*field);
                    self.connect(r, aggregate);
                }
                FlowKind::FieldLoad(field) => {
                    let aggregate = self.field_aggregate(*field);
                    self.connect(aggregate, r);
                }
                _ => {}
            }
        }
    }

    fn field_aggregate(&self, field: FieldId) -> FlowRef {
        let declared = self.universe.field(field).map(|f| f.declared_type);
        self.fields.aggregate(field, declared, &self.graphs)
    }

    // ------------------------------------------------------------------------
    // Invoke resolution
    // ------------------------------------------------------------------------

    fn process_invoke(
        &self,
        graph: &MethodFlowGraph,
        id: TemplateNodeId,
        node: &FlowNode,
        invoke: &InvokeTemplate,
    ) {
        let (Some(caller), Some(caller_context)) = (graph.method(), graph.context()) else {
            return;
        };
        let Some(lock) = node.invoke() else {
            return;
        };
        let mut resolution = lock.lock();
        let site = CallSite {
            caller,
            site: invoke.site,
            kind: invoke.kind,
        };

        match invoke.kind {
            InvokeKind::Static | InvokeKind::Special => {
                if resolution.static_target().is_some() {
                    return;
                }
                resolution.resolve_static(invoke.target);
                let context =
                    self.policy
                        .callee_context(&site, caller_context, invoke.target, None);
                let receiver = invoke.receiver.map(|r| graph.flow_ref(r));
                self.link(
                    &mut resolution,
                    graph,
                    invoke,
                    invoke.target,
                    context,
                    ReceiverLink::Plain(receiver),
                );
            }
            InvokeKind::Virtual => {
                let receivers = node.state();
                if receivers.is_unknown() {
                    self.report(
                        graph,
                        id,
                        node,
                        ViolationKind::UnknownReceiver,
                        format!(
                            "virtual call to {} with an unknown receiver",
                            self.universe.method_name(invoke.target)
                        ),
                    );
                    return;
                }
                let Some(selector) = self.universe.method(invoke.target).map(|m| m.name.as_str())
                else {
                    return;
                };

                for (ty, object) in receivers.objects() {
                    if !resolution.mark_receiver((ty, object)) {
                        continue;
                    }
                    let callee =
                        resolution.dispatch_target(ty, |t| self.universe.resolve_virtual(t, selector));
                    let Some(callee) = callee else {
                        debug!(
                            site = invoke.site,
                            receiver_type = %self.universe.type_name(ty),
                            selector,
                            "No implementation for receiver type"
                        );
                        continue;
                    };
                    let receiver = ReceiverObject { ty, object };
                    let context =
                        self.policy
                            .callee_context(&site, caller_context, callee, Some(receiver));
                    self.link(
                        &mut resolution,
                        graph,
                        invoke,
                        callee,
                        context,
                        ReceiverLink::Object(receiver),
                    );
                }

                if self.universe.is_statically_bindable(invoke.target) {
                    let methods = resolution.callee_methods();
                    if methods.len() > 1 {
                        error!(
                            caller,
                            site = invoke.site,
                            target = invoke.target,
                            callees = ?methods,
                            "Statically bindable call site resolved to several methods"
                        );
                        debug_assert!(
                            false,
                            "consistency violation: bindable call site {} resolved to {:?}",
                            invoke.site, methods
                        );
                    }
                }
            }
        }
    }

    /// Wire one callee clone to the call site
    fn link(
        &self,
        resolution: &mut InvokeResolution,
        graph: &MethodFlowGraph,
        invoke: &InvokeTemplate,
        callee: MethodId,
        context: AnalysisContext,
        receiver: ReceiverLink,
    ) {
        let Some((callee_graph, created)) = self.graphs.get_or_create_clone(callee, &context) else {
            let unlinked = ResolvedCallee {
                method: callee,
                context: None,
                graph: None,
            };
            if resolution.record_callee(unlinked) {
                StatsCounters::bump(&self.stats.unlinked);
                debug!(
                    callee = %self.universe.method_name(callee),
                    site = invoke.site,
                    "Callee has no flow template; call left unlinked"
                );
            }
            return;
        };
        if created {
            self.initialize_clone(&callee_graph);
        }
        let Some(template) = callee_graph.template() else {
            return;
        };
        resolution.record_callee(ResolvedCallee {
            method: callee,
            context: Some(context),
            graph: Some(callee_graph.id()),
        });

        let actual_result = invoke.result.map(|r| graph.flow_ref(r));
        let returns = !template.never_returns;
        let diverted = if self.config.divert_parameter_returns {
            template.returned_parameter
        } else {
            None
        };

        if resolution.mark_linked(callee_graph.id()) {
            StatsCounters::bump(&self.stats.links);
            trace!(
                caller = graph.method().unwrap_or_default(),
                site = invoke.site,
                callee = callee,
                callee_graph = callee_graph.id(),
                "Linking callee"
            );

            for (index, actual) in invoke.arguments.iter().enumerate() {
                if let (Some(actual), Some(formal)) = (actual, callee_graph.formal_parameter(index)) {
                    self.connect(graph.flow_ref(*actual), formal);
                }
            }

            if let ReceiverLink::Plain(Some(actual)) = receiver {
                if let Some(formal) = callee_graph.formal_receiver() {
                    self.connect(actual, formal);
                }
            }

            if let (Some(actual_result), true) = (actual_result, returns) {
                match diverted {
                    Some(ParameterRef::Argument(index)) => {
                        if let Some(Some(actual)) = invoke.arguments.get(index) {
                            self.connect(graph.flow_ref(*actual), actual_result);
                        }
                    }
                    Some(ParameterRef::Receiver) => {
                        if let ReceiverLink::Plain(Some(actual)) = receiver {
                            self.connect(actual, actual_result);
                        }
                    }
                    None => {
                        if let Some(formal_result) = callee_graph.formal_result() {
                            self.connect(formal_result, actual_result);
                        }
                    }
                }
            }
        }

        if let ReceiverLink::Object(object) = receiver {
            self.update_receiver(&callee_graph, object);
            if let (Some(actual_result), true, Some(ParameterRef::Receiver)) =
                (actual_result, returns, diverted)
            {
                self.deliver(
                    actual_result,
                    &TypeState::for_object(object.ty, object.object),
                );
            }
        }
    }

    /// Narrow the formal receiver to exactly the resolved object
    fn update_receiver(&self, callee_graph: &MethodFlowGraph, object: ReceiverObject) {
        if let Some(formal) = callee_graph.formal_receiver() {
            self.deliver(formal, &TypeState::for_object(object.ty, object.object));
        }
    }

    // ------------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------------

    fn collect(&self, completion: Completion, duration: Duration) -> AnalysisResult {
        let clones = self
            .graphs
            .clones()
            .iter()
            .filter_map(|graph| {
                let method = graph.method()?;
                let context = graph.context()?.clone();
                let invokes = graph
                    .nodes()
                    .iter()
                    .enumerate()
                    .filter_map(|(index, node)| {
                        let FlowKind::Invoke(invoke) = node.kind() else {
                            return None;
                        };
                        let resolution = node.invoke()?.lock();
                        Some(InvokeSnapshot {
                            node: index as TemplateNodeId,
                            site: invoke.site,
                            kind: invoke.kind,
                            callees: resolution
                                .callees()
                                .iter()
                                .map(|c| CalleeSnapshot {
                                    method: c.method,
                                    context: c.context.clone(),
                                })
                                .collect(),
                        })
                    })
                    .collect();
                Some(CloneSnapshot {
                    method,
                    context,
                    states: graph.snapshot(),
                    invokes,
                })
            })
            .collect();

        let field_states: BTreeMap<_, _> = self
            .fields
            .entries()
            .into_iter()
            .filter_map(|(field, r)| {
                self.graphs
                    .with_node(r, |_, node| (field, (*node.state()).clone()))
            })
            .collect();

        AnalysisResult::new(
            clones,
            field_states,
            self.violations.lock().clone(),
            completion,
            self.stats.snapshot(duration),
        )
    }
}

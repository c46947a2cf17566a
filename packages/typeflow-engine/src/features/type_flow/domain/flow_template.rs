//! Method flow-graph templates
//!
//! The "original" per-method flow graph produced by the front end: node kinds,
//! declared types and intra-method use-edges. Templates are immutable once
//! registered; the engine instantiates a clone per analysis context.

use super::type_state::TypeState;
use super::type_universe::{AllocSiteId, CallSiteId, FieldId, MethodId, TypeId, TypeUniverse};
use crate::errors::{Result, TypeFlowError};
use serde::{Deserialize, Serialize};

/// Node index within one method template (and within each of its clones)
pub type TemplateNodeId = u32;

/// Dispatch kind of a call site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InvokeKind {
    /// No receiver, single target
    Static,
    /// Receiver, single target (constructors, super calls, private methods)
    Special,
    /// Receiver-dependent target
    Virtual,
}

impl InvokeKind {
    pub fn is_virtual(&self) -> bool {
        matches!(self, InvokeKind::Virtual)
    }
}

/// Parameters of a type test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSpec {
    pub filter_type: TypeId,
    /// Compare against the type alone instead of its whole hierarchy
    pub exact: bool,
    /// Keep matching values (true) or drop them (false)
    pub assignable: bool,
    pub include_null: bool,
}

impl FilterSpec {
    /// True branch of `x instanceof T`
    pub fn instance_of(ty: TypeId) -> Self {
        Self {
            filter_type: ty,
            exact: false,
            assignable: true,
            include_null: false,
        }
    }

    /// False branch of `x instanceof T`
    pub fn not_instance_of(ty: TypeId) -> Self {
        Self {
            filter_type: ty,
            exact: false,
            assignable: false,
            include_null: true,
        }
    }

    /// `(T) x`: null passes a cast
    pub fn checkcast(ty: TypeId) -> Self {
        Self {
            filter_type: ty,
            exact: false,
            assignable: true,
            include_null: true,
        }
    }

    /// `x.getClass() == T.class`
    pub fn exact_type(ty: TypeId) -> Self {
        Self {
            filter_type: ty,
            exact: true,
            assignable: true,
            include_null: false,
        }
    }
}

/// Call site description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeTemplate {
    pub kind: InvokeKind,
    pub site: CallSiteId,
    /// Statically known target (the selector for virtual calls)
    pub target: MethodId,
    /// Actual receiver
    pub receiver: Option<TemplateNodeId>,
    /// Actual arguments, positionally matched to formal parameters
    pub arguments: Vec<Option<TemplateNodeId>>,
    /// Actual return
    pub result: Option<TemplateNodeId>,
}

/// What a node computes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowKind {
    /// Formal receiver
    Receiver,
    /// Formal parameter at this position
    Parameter(usize),
    /// Formal result
    Result,
    /// Plain copy / merge point
    Local,
    /// Allocation or constant
    Source(TypeState),
    /// Type test narrowing
    Filter(FilterSpec),
    FieldLoad(FieldId),
    FieldStore(FieldId),
    /// Call site; its own state is the receiver state
    Invoke(InvokeTemplate),
    /// Engine-owned per-field aggregate, never part of a template
    FieldAggregate(FieldId),
}

/// Template node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateNode {
    pub kind: FlowKind,
    pub declared_type: Option<TypeId>,
    pub uses: Vec<TemplateNodeId>,
}

/// Formal whose value a method returns unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterRef {
    Receiver,
    Argument(usize),
}

/// Original flow graph of one method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodTemplate {
    pub method: MethodId,
    pub receiver: Option<TemplateNodeId>,
    pub parameters: Vec<Option<TemplateNodeId>>,
    pub result: Option<TemplateNodeId>,
    pub nodes: Vec<TemplateNode>,
    /// Always throws; callers get no result link
    pub never_returns: bool,
    pub returned_parameter: Option<ParameterRef>,
}

impl MethodTemplate {
    pub fn builder(method: MethodId) -> MethodTemplateBuilder {
        MethodTemplateBuilder::new(method)
    }

    pub fn node(&self, id: TemplateNodeId) -> Option<&TemplateNode> {
        self.nodes.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Formal parameter node for argument position `index`
    pub fn parameter(&self, index: usize) -> Option<TemplateNodeId> {
        self.parameters.get(index).copied().flatten()
    }

    /// Call sites in node order
    pub fn invokes(&self) -> impl Iterator<Item = (TemplateNodeId, &InvokeTemplate)> {
        self.nodes.iter().enumerate().filter_map(|(i, n)| match &n.kind {
            FlowKind::Invoke(inv) => Some((i as TemplateNodeId, inv)),
            _ => None,
        })
    }

    /// Structural validation against the universe
    pub fn validate(&self, universe: &TypeUniverse) -> Result<()> {
        let method = self.method;
        let descriptor = universe
            .method(method)
            .ok_or(TypeFlowError::UnknownMethod(method))?;
        let invalid = |reason: String| TypeFlowError::invalid_template(method, reason);
        let check_id = |id: TemplateNodeId, what: &str| {
            if (id as usize) < self.nodes.len() {
                Ok(())
            } else {
                Err(invalid(format!("{} refers to missing node {}", what, id)))
            }
        };
        let check_type = |ty: TypeId| {
            universe
                .type_(ty)
                .map(|_| ())
                .ok_or(TypeFlowError::UnknownType(ty))
        };

        if descriptor.is_static() && self.receiver.is_some() {
            return Err(invalid("static method has a formal receiver".to_string()));
        }

        if let Some(r) = self.receiver {
            check_id(r, "receiver")?;
            if self.nodes[r as usize].kind != FlowKind::Receiver {
                return Err(invalid(format!("receiver node {} is not a Receiver", r)));
            }
        }

        for (index, param) in self.parameters.iter().enumerate() {
            if let Some(p) = *param {
                check_id(p, "parameter")?;
                if self.nodes[p as usize].kind != FlowKind::Parameter(index) {
                    return Err(invalid(format!(
                        "parameter {} maps to node {} of another kind",
                        index, p
                    )));
                }
            }
        }

        if let Some(r) = self.result {
            check_id(r, "result")?;
            if self.nodes[r as usize].kind != FlowKind::Result {
                return Err(invalid(format!("result node {} is not a Result", r)));
            }
        }

        match self.returned_parameter {
            Some(ParameterRef::Receiver) if self.receiver.is_none() => {
                return Err(invalid("returns receiver but has none".to_string()));
            }
            Some(ParameterRef::Argument(i)) if self.parameter(i).is_none() => {
                return Err(invalid(format!("returns missing parameter {}", i)));
            }
            _ => {}
        }

        for (id, node) in self.nodes.iter().enumerate() {
            for &u in &node.uses {
                check_id(u, "use-edge")?;
            }
            if let Some(ty) = node.declared_type {
                check_type(ty)?;
            }

            match &node.kind {
                FlowKind::Filter(spec) => check_type(spec.filter_type)?,
                FlowKind::FieldLoad(field) | FlowKind::FieldStore(field) => {
                    universe
                        .field(*field)
                        .ok_or(TypeFlowError::UnknownField(*field))?;
                }
                FlowKind::FieldAggregate(_) => {
                    return Err(invalid(format!("node {} is an engine-owned aggregate", id)));
                }
                FlowKind::Invoke(inv) => {
                    let target = universe
                        .method(inv.target)
                        .ok_or(TypeFlowError::UnknownMethod(inv.target))?;
                    for arg in inv.arguments.iter().flatten() {
                        check_id(*arg, "argument")?;
                    }
                    if let Some(r) = inv.result {
                        check_id(r, "actual return")?;
                    }
                    match (inv.kind, inv.receiver) {
                        (InvokeKind::Static, Some(_)) => {
                            return Err(invalid(format!("static call at node {} has a receiver", id)));
                        }
                        (InvokeKind::Virtual | InvokeKind::Special, None) => {
                            return Err(invalid(format!("call at node {} needs a receiver", id)));
                        }
                        (_, Some(r)) => check_id(r, "actual receiver")?,
                        (InvokeKind::Static, None) => {}
                    }
                    if inv.kind.is_virtual() && target.is_static() {
                        return Err(invalid(format!(
                            "virtual call at node {} targets a static method",
                            id
                        )));
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// Nodes created for a call site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvokeHandle {
    pub node: TemplateNodeId,
    /// Actual return
    pub result: TemplateNodeId,
}

/// Incremental construction of a `MethodTemplate`
///
/// # Example
/// ```text
/// let mut b = MethodTemplate::builder(main);
/// let obj = b.alloc(circle, 1);
/// let call = b.invoke_virtual(10, shape_area, obj, &[]);
/// b.returns(call.result);
/// let template = b.build();
/// ```
#[derive(Debug)]
pub struct MethodTemplateBuilder {
    template: MethodTemplate,
}

impl MethodTemplateBuilder {
    pub fn new(method: MethodId) -> Self {
        Self {
            template: MethodTemplate {
                method,
                receiver: None,
                parameters: Vec::new(),
                result: None,
                nodes: Vec::new(),
                never_returns: false,
                returned_parameter: None,
            },
        }
    }

    fn push(&mut self, kind: FlowKind, declared_type: Option<TypeId>) -> TemplateNodeId {
        let id = self.template.nodes.len() as TemplateNodeId;
        self.template.nodes.push(TemplateNode {
            kind,
            declared_type,
            uses: Vec::new(),
        });
        id
    }

    /// Formal receiver (created once)
    pub fn receiver(&mut self, declared_type: Option<TypeId>) -> TemplateNodeId {
        if let Some(r) = self.template.receiver {
            return r;
        }
        let id = self.push(FlowKind::Receiver, declared_type);
        self.template.receiver = Some(id);
        id
    }

    /// Formal parameter at `index`; positions without a node stay `None`
    pub fn parameter(&mut self, index: usize, declared_type: Option<TypeId>) -> TemplateNodeId {
        if let Some(existing) = self.template.parameter(index) {
            return existing;
        }
        let id = self.push(FlowKind::Parameter(index), declared_type);
        if self.template.parameters.len() <= index {
            self.template.parameters.resize(index + 1, None);
        }
        self.template.parameters[index] = Some(id);
        id
    }

    pub fn local(&mut self, declared_type: Option<TypeId>) -> TemplateNodeId {
        self.push(FlowKind::Local, declared_type)
    }

    /// `new T()` at `site`
    pub fn alloc(&mut self, ty: TypeId, site: AllocSiteId) -> TemplateNodeId {
        self.push(FlowKind::Source(TypeState::for_allocation(ty, site)), Some(ty))
    }

    pub fn constant(&mut self, state: TypeState) -> TemplateNodeId {
        self.push(FlowKind::Source(state), None)
    }

    pub fn null_constant(&mut self) -> TemplateNodeId {
        self.constant(TypeState::null())
    }

    /// Use-edge: updates of `from` propagate into `to`
    pub fn flow(&mut self, from: TemplateNodeId, to: TemplateNodeId) -> &mut Self {
        let uses = &mut self.template.nodes[from as usize].uses;
        if !uses.contains(&to) {
            uses.push(to);
        }
        self
    }

    /// Type test fed by `input`
    pub fn filter(&mut self, input: TemplateNodeId, spec: FilterSpec) -> TemplateNodeId {
        let id = self.push(FlowKind::Filter(spec), Some(spec.filter_type));
        self.flow(input, id);
        id
    }

    pub fn field_load(&mut self, field: FieldId, declared_type: Option<TypeId>) -> TemplateNodeId {
        self.push(FlowKind::FieldLoad(field), declared_type)
    }

    /// Store of `value` into `field`
    pub fn field_store(
        &mut self,
        field: FieldId,
        value: TemplateNodeId,
        declared_type: Option<TypeId>,
    ) -> TemplateNodeId {
        let id = self.push(FlowKind::FieldStore(field), declared_type);
        self.flow(value, id);
        id
    }

    /// Call site; virtual calls observe their receiver through a use-edge
    pub fn invoke(
        &mut self,
        kind: InvokeKind,
        site: CallSiteId,
        target: MethodId,
        receiver: Option<TemplateNodeId>,
        arguments: &[Option<TemplateNodeId>],
    ) -> InvokeHandle {
        let result = self.local(None);
        let node = self.push(
            FlowKind::Invoke(InvokeTemplate {
                kind,
                site,
                target,
                receiver,
                arguments: arguments.to_vec(),
                result: Some(result),
            }),
            None,
        );
        if let (InvokeKind::Virtual, Some(r)) = (kind, receiver) {
            self.flow(r, node);
        }
        InvokeHandle { node, result }
    }

    pub fn invoke_static(
        &mut self,
        site: CallSiteId,
        target: MethodId,
        arguments: &[TemplateNodeId],
    ) -> InvokeHandle {
        let args: Vec<_> = arguments.iter().copied().map(Some).collect();
        self.invoke(InvokeKind::Static, site, target, None, &args)
    }

    pub fn invoke_special(
        &mut self,
        site: CallSiteId,
        target: MethodId,
        receiver: TemplateNodeId,
        arguments: &[TemplateNodeId],
    ) -> InvokeHandle {
        let args: Vec<_> = arguments.iter().copied().map(Some).collect();
        self.invoke(InvokeKind::Special, site, target, Some(receiver), &args)
    }

    pub fn invoke_virtual(
        &mut self,
        site: CallSiteId,
        target: MethodId,
        receiver: TemplateNodeId,
        arguments: &[TemplateNodeId],
    ) -> InvokeHandle {
        let args: Vec<_> = arguments.iter().copied().map(Some).collect();
        self.invoke(InvokeKind::Virtual, site, target, Some(receiver), &args)
    }

    /// `return value`
    pub fn returns(&mut self, value: TemplateNodeId) -> &mut Self {
        let result = match self.template.result {
            Some(r) => r,
            None => {
                let r = self.push(FlowKind::Result, None);
                self.template.result = Some(r);
                r
            }
        };
        self.flow(value, result)
    }

    /// Declared type of the formal result
    pub fn result_type(&mut self, declared_type: TypeId) -> &mut Self {
        let result = match self.template.result {
            Some(r) => r,
            None => {
                let r = self.push(FlowKind::Result, None);
                self.template.result = Some(r);
                r
            }
        };
        self.template.nodes[result as usize].declared_type = Some(declared_type);
        self
    }

    pub fn never_returns(&mut self) -> &mut Self {
        self.template.never_returns = true;
        self
    }

    pub fn returns_parameter(&mut self, parameter: ParameterRef) -> &mut Self {
        self.template.returned_parameter = Some(parameter);
        self
    }

    pub fn build(self) -> MethodTemplate {
        self.template
    }
}

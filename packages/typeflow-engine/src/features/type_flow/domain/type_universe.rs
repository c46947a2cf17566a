//! Type Universe
//!
//! The nominal type hierarchy the analysis runs against: types with ordered
//! supertypes, the methods they declare (keyed by dispatch selector) and
//! fields. Built once by the front end, then shared read-only by the engine.

use crate::errors::{Result, TypeFlowError};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unique identifier for types
pub type TypeId = u32;

/// Unique identifier for methods
pub type MethodId = u32;

/// Unique identifier for fields
pub type FieldId = u32;

/// Allocation site (concrete object identity)
pub type AllocSiteId = u32;

/// Call site, unique within the whole program
pub type CallSiteId = u32;

/// Definition of a type to register
#[derive(Debug, Clone, Default)]
pub struct TypeDef {
    pub name: String,
    pub supertypes: Vec<TypeId>,
    pub is_final: bool,
    pub is_abstract: bool,
}

impl TypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a direct supertype (class or interface)
    pub fn extends(mut self, supertype: TypeId) -> Self {
        self.supertypes.push(supertype);
        self
    }

    pub fn final_type(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }
}

/// Registered type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub id: TypeId,
    pub name: String,
    pub supertypes: Vec<TypeId>,
    pub is_final: bool,
    pub is_abstract: bool,
}

/// Method modifiers relevant to dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodFlags {
    pub is_static: bool,
    pub is_final: bool,
    pub is_private: bool,
    pub is_abstract: bool,
}

impl MethodFlags {
    /// Plain overridable instance method
    pub fn instance() -> Self {
        Self::default()
    }

    pub fn static_method() -> Self {
        Self {
            is_static: true,
            ..Self::default()
        }
    }

    pub fn abstract_method() -> Self {
        Self {
            is_abstract: true,
            ..Self::default()
        }
    }

    pub fn final_method() -> Self {
        Self {
            is_final: true,
            ..Self::default()
        }
    }

    pub fn private_method() -> Self {
        Self {
            is_private: true,
            ..Self::default()
        }
    }
}

/// Registered method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub id: MethodId,
    /// Dispatch selector
    pub name: String,
    pub declaring_type: Option<TypeId>,
    pub flags: MethodFlags,
}

impl MethodDescriptor {
    pub fn is_static(&self) -> bool {
        self.flags.is_static
    }
}

/// Registered field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: FieldId,
    pub name: String,
    pub declaring_type: Option<TypeId>,
    pub declared_type: TypeId,
    pub is_static: bool,
}

/// The program's nominal type hierarchy
#[derive(Debug, Default)]
pub struct TypeUniverse {
    types: Vec<TypeDescriptor>,
    methods: Vec<MethodDescriptor>,
    fields: Vec<FieldDescriptor>,

    /// Self-first linearization of every type's supertypes
    ancestors: Vec<Vec<TypeId>>,

    /// Reflexive set of types assignable to each type
    subtypes: Vec<BTreeSet<TypeId>>,

    /// (type, selector) → method declared directly on the type
    declared: FxHashMap<(TypeId, String), MethodId>,

    type_by_name: FxHashMap<String, TypeId>,
}

impl TypeUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type. Supertypes must already be registered.
    pub fn add_type(&mut self, def: TypeDef) -> Result<TypeId> {
        for &sup in &def.supertypes {
            self.check_type(sup)?;
        }

        let id = self.types.len() as TypeId;

        let mut linearized = vec![id];
        for &sup in &def.supertypes {
            for &anc in &self.ancestors[sup as usize] {
                if !linearized.contains(&anc) {
                    linearized.push(anc);
                }
            }
        }

        for &anc in &linearized[1..] {
            self.subtypes[anc as usize].insert(id);
        }
        self.subtypes.push(BTreeSet::from([id]));
        self.ancestors.push(linearized);

        self.type_by_name.insert(def.name.clone(), id);
        self.types.push(TypeDescriptor {
            id,
            name: def.name,
            supertypes: def.supertypes,
            is_final: def.is_final,
            is_abstract: def.is_abstract,
        });
        Ok(id)
    }

    /// Register a method; `declaring_type` is `None` for free functions
    pub fn add_method(
        &mut self,
        declaring_type: Option<TypeId>,
        name: impl Into<String>,
        flags: MethodFlags,
    ) -> Result<MethodId> {
        let name = name.into();
        let id = self.methods.len() as MethodId;
        if let Some(ty) = declaring_type {
            self.check_type(ty)?;
            self.declared.insert((ty, name.clone()), id);
        }
        self.methods.push(MethodDescriptor {
            id,
            name,
            declaring_type,
            flags,
        });
        Ok(id)
    }

    pub fn add_field(
        &mut self,
        declaring_type: Option<TypeId>,
        name: impl Into<String>,
        declared_type: TypeId,
        is_static: bool,
    ) -> Result<FieldId> {
        if let Some(ty) = declaring_type {
            self.check_type(ty)?;
        }
        self.check_type(declared_type)?;

        let id = self.fields.len() as FieldId;
        self.fields.push(FieldDescriptor {
            id,
            name: name.into(),
            declaring_type,
            declared_type,
            is_static,
        });
        Ok(id)
    }

    fn check_type(&self, ty: TypeId) -> Result<()> {
        if (ty as usize) < self.types.len() {
            Ok(())
        } else {
            Err(TypeFlowError::UnknownType(ty))
        }
    }

    pub fn type_(&self, id: TypeId) -> Option<&TypeDescriptor> {
        self.types.get(id as usize)
    }

    pub fn method(&self, id: MethodId) -> Option<&MethodDescriptor> {
        self.methods.get(id as usize)
    }

    pub fn field(&self, id: FieldId) -> Option<&FieldDescriptor> {
        self.fields.get(id as usize)
    }

    pub fn type_by_name(&self, name: &str) -> Option<TypeId> {
        self.type_by_name.get(name).copied()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.iter()
    }

    /// Display name for logging; falls back to the raw id
    pub fn type_name(&self, id: TypeId) -> String {
        self.type_(id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| format!("#{}", id))
    }

    pub fn method_name(&self, id: MethodId) -> String {
        match self.method(id) {
            Some(m) => match m.declaring_type {
                Some(ty) => format!("{}.{}", self.type_name(ty), m.name),
                None => m.name.clone(),
            },
            None => format!("#{}", id),
        }
    }

    /// `from` can be stored where `to` is expected
    pub fn is_assignable(&self, from: TypeId, to: TypeId) -> bool {
        self.ancestors
            .get(from as usize)
            .map_or(false, |anc| anc.contains(&to))
    }

    /// Self-first linearized supertypes
    pub fn ancestors(&self, ty: TypeId) -> &[TypeId] {
        self.ancestors
            .get(ty as usize)
            .map_or(&[], |anc| anc.as_slice())
    }

    /// All types assignable to `ty`, including `ty` itself
    pub fn subtypes(&self, ty: TypeId) -> Option<&BTreeSet<TypeId>> {
        self.subtypes.get(ty as usize)
    }

    /// Virtual-method table lookup: the implementation `concrete` runs for `selector`
    pub fn resolve_virtual(&self, concrete: TypeId, selector: &str) -> Option<MethodId> {
        self.ancestors(concrete).iter().find_map(|&ty| {
            self.declared
                .get(&(ty, selector.to_string()))
                .copied()
                .filter(|&m| !self.methods[m as usize].flags.is_abstract)
        })
    }

    /// A call to `method` can have at most one target regardless of receiver
    pub fn is_statically_bindable(&self, method: MethodId) -> bool {
        let Some(m) = self.method(method) else {
            return false;
        };
        if m.flags.is_static || m.flags.is_private || m.flags.is_final {
            return true;
        }
        m.declaring_type
            .and_then(|ty| self.type_(ty))
            .map_or(false, |t| t.is_final)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shape ← Circle, Shape ← Square (final), Drawable interface on Circle
    fn shapes() -> (TypeUniverse, TypeId, TypeId, TypeId, TypeId) {
        let mut u = TypeUniverse::new();
        let shape = u.add_type(TypeDef::new("Shape").abstract_type()).unwrap();
        let drawable = u.add_type(TypeDef::new("Drawable").abstract_type()).unwrap();
        let circle = u
            .add_type(TypeDef::new("Circle").extends(shape).extends(drawable))
            .unwrap();
        let square = u
            .add_type(TypeDef::new("Square").extends(shape).final_type())
            .unwrap();
        (u, shape, drawable, circle, square)
    }

    #[test]
    fn test_assignability_is_reflexive_and_transitive() {
        let (mut u, shape, drawable, circle, square) = shapes();
        let small = u.add_type(TypeDef::new("SmallCircle").extends(circle)).unwrap();

        assert!(u.is_assignable(circle, circle));
        assert!(u.is_assignable(small, shape));
        assert!(u.is_assignable(small, drawable));
        assert!(!u.is_assignable(square, drawable));
        assert!(!u.is_assignable(shape, circle));
    }

    #[test]
    fn test_subtypes_include_self() {
        let (u, shape, _, circle, square) = shapes();
        let subs = u.subtypes(shape).unwrap();
        assert_eq!(subs.iter().copied().collect::<Vec<_>>(), vec![shape, circle, square]);
        assert_eq!(u.subtypes(circle).unwrap().len(), 1);
    }

    #[test]
    fn test_linearization_is_self_first() {
        let (u, shape, drawable, circle, _) = shapes();
        assert_eq!(u.ancestors(circle), &[circle, shape, drawable]);
    }

    #[test]
    fn test_resolve_virtual_skips_abstract() {
        let (mut u, shape, _, circle, square) = shapes();
        let area = u.add_method(Some(shape), "area", MethodFlags::abstract_method()).unwrap();
        let circle_area = u.add_method(Some(circle), "area", MethodFlags::instance()).unwrap();

        assert_eq!(u.resolve_virtual(circle, "area"), Some(circle_area));
        // Square inherits only the abstract declaration
        assert_eq!(u.resolve_virtual(square, "area"), None);
        assert_ne!(area, circle_area);
    }

    #[test]
    fn test_resolve_virtual_inherits() {
        let (mut u, shape, _, circle, square) = shapes();
        let name = u.add_method(Some(shape), "name", MethodFlags::instance()).unwrap();
        assert_eq!(u.resolve_virtual(circle, "name"), Some(name));
        assert_eq!(u.resolve_virtual(square, "name"), Some(name));
        assert_eq!(u.resolve_virtual(square, "missing"), None);
    }

    #[test]
    fn test_statically_bindable() {
        let (mut u, shape, _, _, square) = shapes();
        let open = u.add_method(Some(shape), "open", MethodFlags::instance()).unwrap();
        let fin = u.add_method(Some(shape), "fin", MethodFlags::final_method()).unwrap();
        let in_final = u.add_method(Some(square), "side", MethodFlags::instance()).unwrap();
        let free = u.add_method(None, "main", MethodFlags::static_method()).unwrap();

        assert!(!u.is_statically_bindable(open));
        assert!(u.is_statically_bindable(fin));
        assert!(u.is_statically_bindable(in_final));
        assert!(u.is_statically_bindable(free));
    }

    #[test]
    fn test_unknown_supertype_rejected() {
        let mut u = TypeUniverse::new();
        let err = u.add_type(TypeDef::new("Orphan").extends(42)).unwrap_err();
        assert!(matches!(err, TypeFlowError::UnknownType(42)));
    }

    #[test]
    fn test_names() {
        let (mut u, shape, _, _, _) = shapes();
        let m = u.add_method(Some(shape), "area", MethodFlags::abstract_method()).unwrap();
        assert_eq!(u.method_name(m), "Shape.area");
        assert_eq!(u.type_by_name("Circle"), Some(2));
        assert_eq!(u.type_name(99), "#99");
    }
}

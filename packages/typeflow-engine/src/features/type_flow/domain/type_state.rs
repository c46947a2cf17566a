//! TypeState lattice
//!
//! Immutable approximation of the runtime values reaching a program point:
//! a set of `(type, optional allocation site)` pairs plus a null bit, or the
//! distinguished top element `Unknown`.
//!
//! A pair without an allocation site is a type-level entry ("some instance of
//! exactly this type"). When a state is used as a filter, a type-level entry
//! matches every pair of that type; concrete pairs match only themselves.
//! Object identity of kept pairs is never rewritten.
//!
//! # Example
//! ```text
//! U       = {(A, site 1), (B, site 2), (C, -)}
//! filter  = {(A, -), (C, -)}
//! U ∩ f   = {(A, site 1), (C, -)}
//! U − f   = {(B, site 2)}
//! ```

use super::type_universe::{AllocSiteId, TypeId, TypeUniverse};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Objects of one type; `None` is the type-level entry
pub type ObjectSet = BTreeSet<Option<AllocSiteId>>;

/// Lattice operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TypeStateError {
    /// Narrowing a state whose contents are not known
    #[error("cannot filter an unknown type state")]
    FilterOnUnknown,
}

/// Set of possible runtime types/objects at a program point
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeState {
    /// Top: anything may flow here
    Unknown,

    /// Finite set of pairs plus null
    Known {
        objects: BTreeMap<TypeId, ObjectSet>,
        null: bool,
    },
}

impl Default for TypeState {
    fn default() -> Self {
        Self::empty()
    }
}

impl TypeState {
    /// Bottom
    pub fn empty() -> Self {
        TypeState::Known {
            objects: BTreeMap::new(),
            null: false,
        }
    }

    pub fn unknown() -> Self {
        TypeState::Unknown
    }

    /// Only the null constant
    pub fn null() -> Self {
        TypeState::Known {
            objects: BTreeMap::new(),
            null: true,
        }
    }

    /// Type-level entry for exactly `ty`
    pub fn for_exact_type(ty: TypeId, include_null: bool) -> Self {
        Self::for_types([ty], include_null)
    }

    /// One concrete object
    pub fn for_allocation(ty: TypeId, site: AllocSiteId) -> Self {
        Self::for_object(ty, Some(site))
    }

    /// One `(type, object)` pair
    pub fn for_object(ty: TypeId, object: Option<AllocSiteId>) -> Self {
        let mut objects = BTreeMap::new();
        objects.insert(ty, BTreeSet::from([object]));
        TypeState::Known {
            objects,
            null: false,
        }
    }

    /// Type-level entries for each of `types`
    pub fn for_types(types: impl IntoIterator<Item = TypeId>, include_null: bool) -> Self {
        let objects = types
            .into_iter()
            .map(|ty| (ty, BTreeSet::from([None])))
            .collect();
        TypeState::Known {
            objects,
            null: include_null,
        }
    }

    /// Type-level entries for `ty` and every type assignable to it
    pub fn for_type_hierarchy(universe: &TypeUniverse, ty: TypeId, include_null: bool) -> Self {
        match universe.subtypes(ty) {
            Some(subs) => Self::for_types(subs.iter().copied(), include_null),
            None => Self::for_types([ty], include_null),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TypeState::Unknown)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            TypeState::Unknown => false,
            TypeState::Known { objects, null } => objects.is_empty() && !null,
        }
    }

    pub fn can_be_null(&self) -> bool {
        match self {
            TypeState::Unknown => true,
            TypeState::Known { null, .. } => *null,
        }
    }

    /// Number of distinct types (0 for Unknown)
    pub fn type_count(&self) -> usize {
        match self {
            TypeState::Unknown => 0,
            TypeState::Known { objects, .. } => objects.len(),
        }
    }

    /// Number of `(type, object)` pairs (0 for Unknown)
    pub fn object_count(&self) -> usize {
        match self {
            TypeState::Unknown => 0,
            TypeState::Known { objects, .. } => objects.values().map(|s| s.len()).sum(),
        }
    }

    pub fn contains_type(&self, ty: TypeId) -> bool {
        match self {
            TypeState::Unknown => false,
            TypeState::Known { objects, .. } => objects.contains_key(&ty),
        }
    }

    /// Types in ascending id order (empty for Unknown)
    pub fn types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.known_objects().into_iter().flat_map(|o| o.keys().copied())
    }

    /// All `(type, object)` pairs in ascending order (empty for Unknown)
    pub fn objects(&self) -> impl Iterator<Item = (TypeId, Option<AllocSiteId>)> + '_ {
        self.known_objects()
            .into_iter()
            .flat_map(|o| o.iter())
            .flat_map(|(&ty, set)| set.iter().map(move |&obj| (ty, obj)))
    }

    fn known_objects(&self) -> Option<&BTreeMap<TypeId, ObjectSet>> {
        match self {
            TypeState::Unknown => None,
            TypeState::Known { objects, .. } => Some(objects),
        }
    }

    /// `(ty, obj)` is matched by this state used as a filter
    fn covers(&self, ty: TypeId, obj: Option<AllocSiteId>) -> bool {
        match self {
            TypeState::Unknown => true,
            TypeState::Known { objects, .. } => objects
                .get(&ty)
                .map_or(false, |set| set.contains(&None) || set.contains(&obj)),
        }
    }

    /// Least upper bound
    pub fn union(&self, other: &TypeState) -> TypeState {
        match (self, other) {
            (TypeState::Unknown, _) | (_, TypeState::Unknown) => TypeState::Unknown,
            (
                TypeState::Known { objects: a, null: na },
                TypeState::Known { objects: b, null: nb },
            ) => {
                let mut objects = a.clone();
                for (&ty, set) in b {
                    objects.entry(ty).or_default().extend(set.iter().copied());
                }
                TypeState::Known {
                    objects,
                    null: *na || *nb,
                }
            }
        }
    }

    /// Pairs of either side matched by the other side
    pub fn intersect(&self, other: &TypeState) -> Result<TypeState, TypeStateError> {
        if self.is_unknown() || other.is_unknown() {
            return Err(TypeStateError::FilterOnUnknown);
        }

        let mut objects: BTreeMap<TypeId, ObjectSet> = BTreeMap::new();
        for (ty, obj) in self.objects() {
            if other.covers(ty, obj) {
                objects.entry(ty).or_default().insert(obj);
            }
        }
        for (ty, obj) in other.objects() {
            if self.covers(ty, obj) {
                objects.entry(ty).or_default().insert(obj);
            }
        }

        Ok(TypeState::Known {
            objects,
            null: self.can_be_null() && other.can_be_null(),
        })
    }

    /// Pairs of `self` not matched by `other`
    pub fn subtract(&self, other: &TypeState) -> Result<TypeState, TypeStateError> {
        if self.is_unknown() || other.is_unknown() {
            return Err(TypeStateError::FilterOnUnknown);
        }

        let mut objects: BTreeMap<TypeId, ObjectSet> = BTreeMap::new();
        for (ty, obj) in self.objects() {
            if !other.covers(ty, obj) {
                objects.entry(ty).or_default().insert(obj);
            }
        }

        Ok(TypeState::Known {
            objects,
            null: self.can_be_null() && !other.can_be_null(),
        })
    }

    /// Partial order of the lattice (Unknown is top). Compares pairs
    /// literally; type-level entries are not treated as wildcards here.
    pub fn is_subset_of(&self, other: &TypeState) -> bool {
        match (self, other) {
            (_, TypeState::Unknown) => true,
            (TypeState::Unknown, TypeState::Known { .. }) => false,
            (
                TypeState::Known { objects: a, null: na },
                TypeState::Known { objects: b, null: nb },
            ) => {
                (!na || *nb)
                    && a.iter().all(|(ty, set)| {
                        b.get(ty).map_or(false, |other_set| set.is_subset(other_set))
                    })
            }
        }
    }
}

impl fmt::Display for TypeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeState::Unknown => write!(f, "<unknown>"),
            TypeState::Known { null, .. } => {
                write!(f, "{{")?;
                let mut first = true;
                for (ty, obj) in self.objects() {
                    if !first {
                        write!(f, ", ")?;
                    }
                    first = false;
                    match obj {
                        Some(site) => write!(f, "{}@{}", ty, site)?,
                        None => write!(f, "{}", ty)?,
                    }
                }
                if *null {
                    if !first {
                        write!(f, ", ")?;
                    }
                    write!(f, "null")?;
                }
                write!(f, "}}")
            }
        }
    }
}

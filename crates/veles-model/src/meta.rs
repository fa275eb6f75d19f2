//! Meta-type definitions.
//!
//! A [`TypeNode`] describes one class of the modeled domain: its name, its
//! single optional base type, and the attribute, containment and reference
//! rules it declares itself. Inherited rules are not materialized here; the
//! export engine propagates them through the subtype closure.

use serde::{Deserialize, Serialize};

use crate::path::ModelPath;
use crate::value::AttributeKind;

/// Multiplicity bounds of a containment or reference rule.
///
/// `-1` means "no lower bound enforced" for `min` and "unbounded" for `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multiplicity {
    /// Minimum cardinality, `-1` when not enforced.
    #[serde(default = "Multiplicity::no_bound")]
    pub min: i64,
    /// Maximum cardinality, `-1` when unbounded.
    #[serde(default = "Multiplicity::no_bound")]
    pub max: i64,
}

impl Multiplicity {
    /// The unenforced/unbounded marker.
    pub const NO_BOUND: i64 = -1;

    fn no_bound() -> i64 {
        Self::NO_BOUND
    }

    /// Fully unbounded multiplicity (0..unbounded in schema terms).
    pub fn unbounded() -> Self {
        Self { min: Self::NO_BOUND, max: Self::NO_BOUND }
    }

    /// Exact bounds.
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Lower bound as exported: an unenforced minimum renders as 0.
    pub fn lower(&self) -> i64 {
        if self.min < 0 {
            0
        } else {
            self.min
        }
    }

    /// Upper bound as exported; `-1` stays `-1` (unbounded).
    pub fn upper(&self) -> i64 {
        self.max
    }

    /// A relation is a to-one pointer iff both bounds are exactly 1.
    pub fn is_to_one(&self) -> bool {
        self.min == 1 && self.max == 1
    }
}

impl Default for Multiplicity {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// An attribute declared by a type: a name and a primitive kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDef {
    pub name: String,
    pub kind: AttributeKind,
}

/// A containment rule: one allowed child type with multiplicity bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainmentRule {
    /// Path of the allowed child type.
    pub child: ModelPath,
    #[serde(flatten)]
    pub bounds: Multiplicity,
}

/// One allowed target of a reference rule, with per-target bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRule {
    /// Path of the allowed target type.
    pub target: ModelPath,
    #[serde(flatten)]
    pub bounds: Multiplicity,
}

/// A named reference rule: aggregate bounds plus the allowed target types.
///
/// Set-membership rules share this shape; what distinguishes a to-one
/// pointer is the aggregate multiplicity being exactly 1..1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRule {
    /// Relation name.
    pub name: String,
    #[serde(flatten)]
    pub bounds: Multiplicity,
    /// Allowed target types, in declaration order.
    pub targets: Vec<TargetRule>,
}

impl ReferenceRule {
    /// Whether this rule is a to-one pointer (eligible for inverse
    /// synthesis).
    pub fn is_pointer(&self) -> bool {
        self.bounds.is_to_one()
    }
}

/// A meta-type definition: a read-only view supplied by the backing store.
///
/// `base` is absent only on the root type of the hierarchy (conventionally
/// named FCO). Only rules the type declares itself appear here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeNode {
    /// Unique path identifying this type.
    pub path: ModelPath,
    /// Class name, unique across the type set.
    pub name: String,
    /// Abstract types export the same features; the flag is descriptive
    /// only.
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// The single base type, absent on the hierarchy root.
    #[serde(default)]
    pub base: Option<ModelPath>,
    /// Own attribute declarations.
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
    /// Own containment rules.
    #[serde(default)]
    pub containment: Vec<ContainmentRule>,
    /// Own reference (and set-membership) rules.
    #[serde(default)]
    pub references: Vec<ReferenceRule>,
}

//! Document key vocabulary.
//!
//! Relation-derived attribute keys combine a category prefix, the relation
//! name and a type name, joined by [`DIV`]. Both documents use the same
//! vocabulary so the schema's feature names line up with the instance
//! document's slots.

/// Stable-identifier attribute key.
pub const ID: &str = "id";

/// Relative-identifier attribute key.
pub const RELID: &str = "relid";

/// Meta-definition flag attribute key.
pub const IS_META: &str = "isMeta";

/// Fixed key of the instantiation pointer; never combined with a type name.
pub const BASE: &str = "base";

/// Prefix of attribute-value slots.
pub const ATTR_PREFIX: &str = "atr-";

/// Prefix of reference slots and features.
pub const REL_PREFIX: &str = "rel-";

/// Prefix of synthesized inverse-reference slots and features.
pub const INV_REL_PREFIX: &str = "invrel-";

/// Prefix of set-membership slots.
pub const SET_REL_PREFIX: &str = "set-";

/// Separator between relation name and type name in combined keys.
pub const DIV: &str = "-";

/// Child-list key of class entries in the schema document.
pub const CLASS_LIST: &str = "class";

/// Child-list key of feature entries in a class entry.
pub const FEATURE_LIST: &str = "feature";

//! Loaded instance-node views.

use uuid::Uuid;

use crate::path::ModelPath;
use crate::value::AttributeValue;

/// A fully loaded view of one node in the instance graph.
///
/// Produced by a backing store's `load_node`; the engine never mutates it.
/// All relation listings are explicit ordered sequences so that document
/// building stays data-driven over whatever names exist on the node, and so
/// that output order is reproducible across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceNode {
    /// Unique path of this node.
    pub path: ModelPath,
    /// Stable identifier, unique across the whole graph.
    pub id: Uuid,
    /// Relative identifier, unique only among siblings.
    pub relid: String,
    /// Containment owner; `None` only for the traversal root.
    pub parent: Option<ModelPath>,
    /// Declared type: the most specific meta type reached through the
    /// instantiation chain (a meta node's declared type is itself).
    pub type_path: ModelPath,
    /// Whether this node is itself a meta-type definition.
    pub is_meta: bool,
    /// Own attribute values (not inherited), in store order.
    pub attributes: Vec<(String, AttributeValue)>,
    /// Pointer slots: relation name to resolved target path. Unset pointers
    /// carry `None`. The `base` pointer, when present, appears under its own
    /// name like any other slot.
    pub pointers: Vec<(String, Option<ModelPath>)>,
    /// Set memberships: set name to member paths, in store order.
    pub sets: Vec<(String, Vec<ModelPath>)>,
    /// Back-reference collections computed by the store (incoming pointers
    /// grouped by relation name, including `base`).
    pub collections: Vec<(String, Vec<ModelPath>)>,
    /// Directly contained children, in store enumeration order.
    pub children: Vec<ModelPath>,
}

impl InstanceNode {
    /// Look up an own attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Ordered attribute names.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|(n, _)| n.as_str())
    }

    /// Ordered pointer relation names.
    pub fn pointer_names(&self) -> impl Iterator<Item = &str> {
        self.pointers.iter().map(|(n, _)| n.as_str())
    }

    /// Ordered set names.
    pub fn set_names(&self) -> impl Iterator<Item = &str> {
        self.sets.iter().map(|(n, _)| n.as_str())
    }

    /// Ordered back-reference collection names.
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.iter().map(|(n, _)| n.as_str())
    }
}

//! Backing-store capability trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::meta::TypeNode;
use crate::node::InstanceNode;
use crate::path::ModelPath;

/// Errors raised by a backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A node path could not be resolved.
    #[error("node not found: {0}")]
    NodeNotFound(ModelPath),

    /// A path used as a meta type is not in the type set.
    #[error("meta type not found: {0}")]
    TypeNotFound(ModelPath),

    /// A node's instantiation chain never reaches a meta type.
    #[error("no declared type on the instantiation chain of {0}")]
    UndeclaredType(ModelPath),

    /// A base chain loops back on itself.
    #[error("inheritance cycle involving {0}")]
    InheritanceCycle(ModelPath),

    /// The root node is missing from the graph.
    #[error("root node missing: {0}")]
    MissingRoot(ModelPath),

    /// A non-root node has no parent node in the graph.
    #[error("missing parent for node {0}")]
    MissingParent(ModelPath),

    /// Two nodes or types share a path, or other structural defects.
    #[error("invalid model: {0}")]
    InvalidModel(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Abstract capability set of the backing store the export engine consumes.
///
/// The store owns child enumeration order and computes back-reference
/// collections; the engine treats both as authoritative. Node loading is the
/// only suspension point of an export, so it is the only async capability.
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// The meta-type set of this model.
    fn type_set(&self) -> Result<Vec<TypeNode>>;

    /// The type system's own subtype test: whether `sub` is `ancestor` or
    /// derives from it, directly or transitively.
    fn is_subtype_of(&self, sub: &ModelPath, ancestor: &ModelPath) -> Result<bool>;

    /// Resolve a path to a fully loaded node view.
    async fn load_node(&self, path: &ModelPath) -> Result<InstanceNode>;

    /// Path of the traversal root.
    fn root(&self) -> ModelPath;
}

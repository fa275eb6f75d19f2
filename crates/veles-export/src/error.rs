//! Export error taxonomy.

use thiserror::Error;
use veles_model::{ModelPath, StoreError};

/// Errors that abort an export.
///
/// Nothing here is recovered or retried: the first error wins, the whole
/// export fails, and no artifact is persisted for a partially built result.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Backing-store failure, including failed relationship resolution
    /// during traversal.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// A type names a base that is not in the supplied type set.
    #[error("dangling base {base} on type {owner}")]
    DanglingBase { owner: String, base: ModelPath },

    /// A containment rule names a child type that is not in the type set.
    #[error("containment child {child} of type {owner} is not in the type set")]
    DanglingChild { owner: String, child: ModelPath },

    /// A reference rule names a target type that is not in the type set.
    #[error("target {target} of reference {relation} on type {owner} is not in the type set")]
    DanglingTarget {
        owner: String,
        relation: String,
        target: ModelPath,
    },

    /// A node's declared type is not in the type set.
    #[error("declared type {0} is not in the type set")]
    UnknownType(ModelPath),

    /// The markup codec collaborator failed.
    #[error("codec error: {0}")]
    Codec(String),

    /// The persistence collaborator failed.
    #[error("persistence error: {0}")]
    Persistence(String),
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

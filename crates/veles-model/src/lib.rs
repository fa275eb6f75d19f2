//! Data model for typed, inheritance-based model graphs.
//!
//! This crate holds everything the export engine and its collaborators
//! share: meta-type definitions, loaded instance-node views, the generic
//! nested document shape, and the [`ModelStore`] backing-store trait with an
//! in-memory reference implementation.
//!
//! # Quick Start
//!
//! ```
//! use veles_model::{AttributeKind, ModelBuilder, ModelPath, ModelStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), veles_model::StoreError> {
//! let mut builder = ModelBuilder::new();
//! builder.set_name("circuit");
//!
//! let part = builder.add_type("/meta/Part", "Part");
//! builder.add_attribute(part, "label", AttributeKind::String);
//!
//! let r1 = builder.add_node("/r1");
//! builder.set_node_base(r1, "/meta/Part");
//! builder.set_attribute(r1, "label", "resistor");
//!
//! let store = builder.build()?;
//! let node = store.load_node(&ModelPath::new("/r1")).await?;
//! assert_eq!(node.type_path, ModelPath::new("/meta/Part"));
//! # Ok(())
//! # }
//! ```
//!
//! # Layers
//!
//! - **Meta** ([`TypeNode`]): single-inheritance class definitions with own
//!   attribute, containment and reference rules.
//! - **Instances** ([`InstanceNode`]): lazily loaded node views with ordered
//!   relation enumerations.
//! - **Documents** ([`Entry`]): the nested named-entry shape both export
//!   artifacts are built from.
//! - **Store** ([`ModelStore`]): the async capability set a backing store
//!   must provide; [`InMemoryModel`] is the reference implementation, built
//!   by hand via [`ModelBuilder`] or loaded from JSON via [`ModelProject`].

mod document;
mod memory;
mod meta;
mod node;
mod path;
mod project;
mod store;
mod value;

pub use document::Entry;
pub use memory::{InMemoryModel, ModelBuilder, NodeHandle, NodeSpec, TypeHandle, BASE_RELATION};
pub use meta::{
    AttributeDef, ContainmentRule, Multiplicity, ReferenceRule, TargetRule, TypeNode,
};
pub use node::InstanceNode;
pub use path::ModelPath;
pub use project::{
    AttributeEntry, ModelProject, NodeEntry, PointerEntry, ProjectError, SetEntry,
};
pub use store::{ModelStore, Result, StoreError};
pub use value::{AttributeKind, AttributeValue, PrimitiveType};

// The stable-identifier type is part of the public node surface.
pub use uuid::Uuid;

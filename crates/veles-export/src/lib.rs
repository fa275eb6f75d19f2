//! Typed-graph export engine.
//!
//! Exports a typed, inheritance-based model graph into two linked
//! documents: a schema document describing the type hierarchy and an
//! instance document serializing the node graph against it. The engine
//! consumes any [`veles_model::ModelStore`]; rendering and persistence are
//! pluggable collaborators.
//!
//! # Architecture
//!
//! - [`TypeClosureIndex`]: transitive-subtype index over the meta types.
//! - [`SchemaBuilder`]: class entries with containment/reference
//!   propagation and inverse-reference synthesis for to-one pointers.
//! - [`InstanceTraverser`]: asynchronous pre-order walk of the instance
//!   graph, fan-out/fan-in relationship resolution, visitation-order
//!   output.
//! - [`ExportCoordinator`]: drives both builders, wraps envelopes, and
//!   hands the serialized documents to the [`DocumentCodec`] and
//!   [`ArtifactSink`] collaborators.
//!
//! # Example
//!
//! ```no_run
//! use veles_export::{ExportCoordinator, DocumentCodec, MemorySink};
//! use veles_model::{ModelBuilder, Entry};
//!
//! # struct AnyCodec;
//! # impl DocumentCodec for AnyCodec {
//! #     fn serialize(&self, _: &str, _: &Entry) -> veles_export::Result<String> {
//! #         Ok(String::new())
//! #     }
//! # }
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> veles_export::Result<()> {
//! let mut builder = ModelBuilder::new();
//! builder.set_name("demo");
//! let node = builder.add_type("/meta/Node", "Node");
//! builder.allow_child(node, node, -1, -1);
//! let store = builder.build()?;
//!
//! let sink = MemorySink::new();
//! let report = ExportCoordinator::new(&store)
//!     .export(&AnyCodec, &sink)
//!     .await?;
//! assert_eq!(report.artifacts.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! # Failure model
//!
//! Every error is fatal to the whole export: a failed subtype test, a
//! dangling schema rule, an unresolvable relationship target, a codec or
//! sink failure. Nothing is retried and nothing partial is persisted.

mod closure;
mod coordinator;
mod error;
mod schema;
mod sink;
mod traverse;

pub mod keys;

pub use closure::TypeClosureIndex;
pub use coordinator::{DocumentCodec, ExportCoordinator, ExportOptions, ExportReport};
pub use error::{ExportError, Result};
pub use schema::SchemaBuilder;
pub use sink::{ArtifactRef, ArtifactSink, MemorySink};
pub use traverse::InstanceTraverser;

//! Veles - typed model-graph export toolkit.
//!
//! This crate provides a unified interface to the Veles library ecosystem
//! for exporting typed, inheritance-based model graphs into linked schema
//! and instance documents.
//!
//! # Crates
//!
//! - [`veles_model`] - Data model (meta types, instance nodes, documents,
//!   backing-store trait and in-memory store)
//! - [`veles_export`] - Export engine (closure index, schema synthesis,
//!   async traversal, coordination)
//! - [`veles_xml`] - XML codec and filesystem persistence
//!
//! # Example
//!
//! ```no_run
//! use veles::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load a model project
//! let store = ModelProject::from_path("model.json")?.into_store()?;
//!
//! // Export schema and instance documents next to each other
//! let report = ExportCoordinator::new(&store)
//!     .export(&XmlCodec::new(), &FileSink::new("out"))
//!     .await?;
//!
//! for artifact in &report.artifacts {
//!     println!("stored {}", artifact.location);
//! }
//! # Ok(())
//! # }
//! ```

// Re-export all sub-crates
pub use veles_export as export;
pub use veles_model as model;
pub use veles_xml as xml;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use veles_export::{
        ExportCoordinator, ExportOptions, ExportReport, MemorySink, TypeClosureIndex,
    };
    pub use veles_model::{
        AttributeKind, AttributeValue, Entry, InMemoryModel, ModelBuilder, ModelPath,
        ModelProject, ModelStore,
    };
    pub use veles_xml::{FileSink, XmlCodec};
}

// Re-export commonly used types at the crate root
pub use veles_export::ExportCoordinator;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::prelude::*;

    fn pointer_model() -> InMemoryModel {
        let mut b = ModelBuilder::new();
        b.set_name("wiring");

        let part = b.add_type("/m/Part", "Part");
        b.add_attribute(part, "label", AttributeKind::String);
        b.allow_child(part, part, -1, -1);
        b.add_reference(part, "drives", 1, 1);
        b.add_reference_target(part, "drives", part, -1, 1);

        let motor = b.add_node("/motor");
        b.set_node_base(motor, "/m/Part");
        b.set_attribute(motor, "label", "motor");

        let shaft = b.add_node("/motor/shaft");
        b.set_node_base(shaft, "/m/Part");
        b.set_pointer(shaft, "drives", Some(ModelPath::new("/wheel")));

        let wheel = b.add_node("/wheel");
        b.set_node_base(wheel, "/m/Part");

        b.build().unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_xml_export() {
        let store = pointer_model();
        let sink = MemorySink::new();
        let report = ExportCoordinator::new(&store)
            .export(&XmlCodec::new(), &sink)
            .await
            .unwrap();

        assert_eq!(report.language, "wiring");
        let artifacts = sink.artifacts();
        assert_eq!(artifacts.len(), 2);

        let (schema_name, schema) = &artifacts[0];
        assert_eq!(schema_name, "wiring.ecore");
        assert!(schema.contains("<schema"));
        assert!(schema.contains("name=\"Part\""));
        assert!(schema.contains("name=\"rel-drives-Part\""));
        assert!(schema.contains("name=\"invrel-drives-Part\""));

        let (instance_name, instance) = &artifacts[1];
        assert_eq!(instance_name, "wiring.xmi");
        assert!(instance.contains("<wiring:ROOT"));
        assert!(instance.contains("relid=\"shaft\""));
        assert!(instance.contains("atr-label=\"motor\""));
        assert!(instance.contains("rel-drives-Part="));
        assert!(instance.contains("invrel-drives-Part="));
    }

    #[tokio::test]
    async fn test_repeated_exports_are_byte_identical() {
        let store = pointer_model();

        let first = MemorySink::new();
        ExportCoordinator::new(&store)
            .export(&XmlCodec::new(), &first)
            .await
            .unwrap();

        let second = MemorySink::new();
        ExportCoordinator::new(&store)
            .export(&XmlCodec::new(), &second)
            .await
            .unwrap();

        assert_eq!(first.artifacts(), second.artifacts());
    }
}

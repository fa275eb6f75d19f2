//! Export coordination.
//!
//! [`ExportCoordinator`] drives the schema builder and the instance
//! traverser over one store, wraps both results in envelope entries, and
//! hands them to the codec and persistence collaborators. Either builder
//! failing fails the whole export before anything is persisted, so the two
//! artifacts are always mutually consistent.

use veles_model::{Entry, ModelStore};

use crate::closure::TypeClosureIndex;
use crate::error::Result;
use crate::schema::SchemaBuilder;
use crate::sink::{ArtifactRef, ArtifactSink};
use crate::traverse::InstanceTraverser;

/// Language name used when the root node has no `name` attribute.
const DEFAULT_LANGUAGE: &str = "model";

/// Root tag of the serialized schema document.
const SCHEMA_ROOT_TAG: &str = "schema";

/// Markup codec collaborator: turns a nested document into text.
pub trait DocumentCodec: Send + Sync {
    /// Serialize a document under the given root tag.
    fn serialize(&self, root_tag: &str, document: &Entry) -> Result<String>;
}

/// Envelope and naming options. Everything here is opaque passthrough: the
/// engine copies it into the document envelopes and artifact names without
/// interpreting it.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Namespace URI recorded in both envelopes.
    pub ns_uri: String,
    /// Version/namespace metadata attributes, copied verbatim onto both
    /// envelopes ahead of the engine's own entries.
    pub metadata: Vec<(String, String)>,
    /// File extension of the schema artifact.
    pub schema_extension: String,
    /// File extension of the instance artifact.
    pub instance_extension: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            ns_uri: "http://example.org/model".to_string(),
            metadata: vec![
                ("xmi:version".to_string(), "2.0".to_string()),
                ("xmlns:xmi".to_string(), "http://www.omg.org/XMI".to_string()),
                (
                    "xmlns:xsi".to_string(),
                    "http://www.w3.org/2001/XMLSchema-instance".to_string(),
                ),
            ],
            schema_extension: "ecore".to_string(),
            instance_extension: "xmi".to_string(),
        }
    }
}

/// Outcome of a successful export.
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Language name the artifacts were derived for.
    pub language: String,
    /// Stored artifacts: schema first, instance second.
    pub artifacts: Vec<ArtifactRef>,
}

/// Orchestrates one export over a backing store.
pub struct ExportCoordinator<'a> {
    store: &'a dyn ModelStore,
    options: ExportOptions,
}

impl<'a> ExportCoordinator<'a> {
    /// Coordinator with default options.
    pub fn new(store: &'a dyn ModelStore) -> Self {
        Self::with_options(store, ExportOptions::default())
    }

    /// Coordinator with explicit options.
    pub fn with_options(store: &'a dyn ModelStore, options: ExportOptions) -> Self {
        Self { store, options }
    }

    /// Run the export: build both documents, serialize them, persist them.
    ///
    /// Persistence is only invoked once both documents are fully built and
    /// serialized; any earlier failure leaves the sink untouched.
    pub async fn export(
        &self,
        codec: &dyn DocumentCodec,
        sink: &dyn ArtifactSink,
    ) -> Result<ExportReport> {
        let root_path = self.store.root();
        let root = self.store.load_node(&root_path).await?;
        let language = root
            .attribute("name")
            .map(|v| v.to_string())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let types = self.store.type_set()?;
        tracing::info!(language = %language, types = types.len(), "starting export");

        let closure = TypeClosureIndex::build(self.store, &types)?;
        let traverser = InstanceTraverser::new(self.store, &types);
        let schema_builder = SchemaBuilder::new(&types, &closure);

        // The traversal suspends on store lookups; schema synthesis runs
        // alongside it on the same join.
        let (instance_body, schema_body) = tokio::try_join!(
            traverser.run(&root_path),
            async { schema_builder.build() },
        )?;

        let schema_doc = self.schema_envelope(&language, schema_body);
        let instance_doc = self.instance_envelope(&language, instance_body);

        let schema_text = codec.serialize(SCHEMA_ROOT_TAG, &schema_doc)?;
        let instance_root_tag = format!("{}:ROOT", language);
        let instance_text = codec.serialize(&instance_root_tag, &instance_doc)?;

        let schema_name = format!("{}.{}", language, self.options.schema_extension);
        let instance_name = format!("{}.{}", language, self.options.instance_extension);
        let (schema_ref, instance_ref) = tokio::try_join!(
            sink.save(&schema_name, &schema_text),
            sink.save(&instance_name, &instance_text),
        )?;

        tracing::info!(
            schema = %schema_ref.location,
            instance = %instance_ref.location,
            "export complete"
        );

        Ok(ExportReport {
            language,
            artifacts: vec![schema_ref, instance_ref],
        })
    }

    fn schema_envelope(&self, language: &str, body: Entry) -> Entry {
        let mut doc = Entry::new();
        for (key, value) in &self.options.metadata {
            doc.set(key, value);
        }
        doc.set("name", language);
        doc.set("nsPrefix", language);
        doc.set("nsURI", &self.options.ns_uri);
        merge_children(&mut doc, body);
        doc
    }

    fn instance_envelope(&self, language: &str, body: Entry) -> Entry {
        let mut doc = Entry::new();
        for (key, value) in &self.options.metadata {
            doc.set(key, value);
        }
        doc.set(format!("xmlns:{}", language), &self.options.ns_uri);
        doc.set(
            "xsi:schemaLocation",
            format!(
                "{} {}.{}",
                self.options.ns_uri, language, self.options.schema_extension
            ),
        );
        merge_children(&mut doc, body);
        doc
    }
}

fn merge_children(envelope: &mut Entry, body: Entry) {
    for (relation, entries) in body.into_children() {
        for entry in entries {
            envelope.append_child(&relation, entry);
        }
    }
}

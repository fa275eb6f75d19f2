//! JSON project format.
//!
//! A [`ModelProject`] is the on-disk shape of a model: the meta-type set
//! plus a flat node list, convertible into an [`InMemoryModel`]. All lists
//! are ordered; the file order becomes the store's enumeration order, which
//! in turn fixes the export's traversal order.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::memory::{InMemoryModel, NodeSpec};
use crate::meta::TypeNode;
use crate::path::ModelPath;
use crate::store::StoreError;
use crate::value::AttributeValue;

/// Errors raised while reading a project file.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON.
    #[error("malformed project: {0}")]
    Json(#[from] serde_json::Error),

    /// Structurally invalid model.
    #[error("{0}")]
    Store(#[from] StoreError),
}

/// One attribute value on a node entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeEntry {
    pub name: String,
    pub value: AttributeValue,
}

/// One pointer slot on a node entry. A missing `target` declares the slot
/// unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointerEntry {
    pub name: String,
    #[serde(default)]
    pub target: Option<ModelPath>,
}

/// One set on a node entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetEntry {
    pub name: String,
    #[serde(default)]
    pub members: Vec<ModelPath>,
}

/// One node of the instance graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEntry {
    pub path: ModelPath,
    /// Stable identifier; derived from the path when omitted.
    #[serde(default)]
    pub guid: Option<Uuid>,
    /// Instantiation pointer.
    #[serde(default)]
    pub base: Option<ModelPath>,
    #[serde(default)]
    pub attributes: Vec<AttributeEntry>,
    #[serde(default)]
    pub pointers: Vec<PointerEntry>,
    #[serde(default)]
    pub sets: Vec<SetEntry>,
}

/// A complete model project: type set plus instance graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelProject {
    /// Optional model name; injected as the root's `name` attribute when
    /// the root entry does not set one itself.
    #[serde(default)]
    pub name: Option<String>,
    /// Traversal root path; the tree root by default.
    #[serde(default)]
    pub root: ModelPath,
    pub types: Vec<TypeNode>,
    pub nodes: Vec<NodeEntry>,
}

impl ModelProject {
    /// Parse a project from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a project file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Convert into an in-memory store.
    pub fn into_store(self) -> Result<InMemoryModel, ProjectError> {
        let root = self.root.clone();
        let name = self.name;

        let mut specs: Vec<NodeSpec> = Vec::with_capacity(self.nodes.len() + 1);
        let mut has_root = false;
        for entry in self.nodes {
            let is_root = entry.path == root;
            has_root = has_root || is_root;

            let mut attributes: Vec<(String, AttributeValue)> = entry
                .attributes
                .into_iter()
                .map(|a| (a.name, a.value))
                .collect();
            if is_root {
                if let Some(name) = &name {
                    if !attributes.iter().any(|(n, _)| n == "name") {
                        attributes.push(("name".to_string(), AttributeValue::from(name.clone())));
                    }
                }
            }

            specs.push(NodeSpec {
                path: entry.path,
                guid: entry.guid,
                base: entry.base,
                attributes,
                pointers: entry
                    .pointers
                    .into_iter()
                    .map(|p| (p.name, p.target))
                    .collect(),
                sets: entry.sets.into_iter().map(|s| (s.name, s.members)).collect(),
            });
        }

        // A project may leave the root implicit when it carries nothing but
        // the model name.
        if !has_root {
            let mut spec = NodeSpec { path: root.clone(), ..NodeSpec::default() };
            if let Some(name) = &name {
                spec.attributes
                    .push(("name".to_string(), AttributeValue::from(name.clone())));
            }
            specs.insert(0, spec);
        }

        Ok(InMemoryModel::new(root, self.types, specs)?)
    }
}

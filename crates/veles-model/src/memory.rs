//! In-memory backing store and builder.
//!
//! [`InMemoryModel`] is the reference [`ModelStore`]: a flat set of meta
//! types plus node specs keyed by path, with parent/child structure derived
//! from the paths themselves. [`ModelBuilder`] offers a handle-based API for
//! assembling a model programmatically.
//!
//! # Example
//!
//! ```
//! use veles_model::{AttributeKind, ModelBuilder, ModelStore};
//!
//! let mut builder = ModelBuilder::new();
//! builder.set_name("demo");
//!
//! let node = builder.add_type("/meta/Node", "Node");
//! builder.add_attribute(node, "label", AttributeKind::String);
//! builder.allow_child(node, node, -1, -1);
//!
//! let a = builder.add_node("/a");
//! builder.set_node_base(a, "/meta/Node");
//! builder.set_attribute(a, "label", "first");
//!
//! let model = builder.build()?;
//! assert_eq!(model.type_set()?.len(), 1);
//! # Ok::<(), veles_model::StoreError>(())
//! ```

use async_trait::async_trait;
use rustc_hash::{FxHashMap, FxHashSet};
use uuid::Uuid;

use crate::meta::{
    AttributeDef, ContainmentRule, Multiplicity, ReferenceRule, TargetRule, TypeNode,
};
use crate::node::InstanceNode;
use crate::path::ModelPath;
use crate::store::{ModelStore, Result, StoreError};
use crate::value::{AttributeKind, AttributeValue};

/// Relation name of the instantiation pointer.
pub const BASE_RELATION: &str = "base";

/// Raw description of one node before the store derives structure from it.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    /// Unique path; the parent is the longest proper path prefix.
    pub path: ModelPath,
    /// Stable identifier; derived deterministically from the path when
    /// absent, so repeated exports of the same model agree.
    pub guid: Option<Uuid>,
    /// Instantiation pointer: the type or prototype this node specializes.
    pub base: Option<ModelPath>,
    /// Own attribute values, in order.
    pub attributes: Vec<(String, AttributeValue)>,
    /// Pointer slots (excluding `base`), in order; `None` marks a declared
    /// but unset slot.
    pub pointers: Vec<(String, Option<ModelPath>)>,
    /// Set memberships, in order.
    pub sets: Vec<(String, Vec<ModelPath>)>,
}

#[derive(Debug, Clone)]
struct NodeRecord {
    spec: NodeSpec,
    id: Uuid,
    type_path: ModelPath,
    children: Vec<ModelPath>,
    collections: Vec<(String, Vec<ModelPath>)>,
}

/// In-memory model store.
#[derive(Debug)]
pub struct InMemoryModel {
    root: ModelPath,
    types: Vec<TypeNode>,
    type_index: FxHashMap<ModelPath, usize>,
    nodes: Vec<NodeRecord>,
    node_index: FxHashMap<ModelPath, usize>,
}

impl InMemoryModel {
    /// Build a store from a type set and node specs.
    ///
    /// Validates structure eagerly: duplicate paths or names, missing root
    /// or parents, and unresolvable instantiation chains are all rejected
    /// here. Dangling pointer and set targets are not checked; they surface
    /// as load failures during traversal.
    pub fn new(root: ModelPath, types: Vec<TypeNode>, specs: Vec<NodeSpec>) -> Result<Self> {
        let mut type_index = FxHashMap::default();
        let mut names = FxHashSet::default();
        for (i, ty) in types.iter().enumerate() {
            if type_index.insert(ty.path.clone(), i).is_some() {
                return Err(StoreError::InvalidModel(format!(
                    "duplicate type path: {}",
                    ty.path
                )));
            }
            if !names.insert(ty.name.clone()) {
                return Err(StoreError::InvalidModel(format!(
                    "duplicate type name: {}",
                    ty.name
                )));
            }
        }

        let mut nodes: Vec<NodeRecord> = Vec::with_capacity(specs.len());
        let mut node_index = FxHashMap::default();
        for spec in specs {
            let id = spec
                .guid
                .unwrap_or_else(|| Uuid::new_v5(&Uuid::NAMESPACE_OID, spec.path.as_str().as_bytes()));
            if node_index.insert(spec.path.clone(), nodes.len()).is_some() {
                return Err(StoreError::InvalidModel(format!(
                    "duplicate node path: {}",
                    spec.path
                )));
            }
            nodes.push(NodeRecord {
                spec,
                id,
                type_path: ModelPath::root(),
                children: Vec::new(),
                collections: Vec::new(),
            });
        }

        if !node_index.contains_key(&root) {
            return Err(StoreError::MissingRoot(root));
        }

        // Containment: wire each node into its parent, preserving spec order
        // as the child enumeration order.
        for i in 0..nodes.len() {
            let path = nodes[i].spec.path.clone();
            if path == root {
                continue;
            }
            let parent = path
                .parent()
                .ok_or_else(|| StoreError::MissingParent(path.clone()))?;
            let pi = *node_index
                .get(&parent)
                .ok_or_else(|| StoreError::MissingParent(path.clone()))?;
            nodes[pi].children.push(path);
        }

        // Declared types: walk each instantiation chain to the nearest meta
        // type. The root is exempt: it is never emitted as a node entry, and
        // like the original tree root it carries no instantiation pointer.
        for i in 0..nodes.len() {
            let origin = nodes[i].spec.path.clone();
            if origin == root && nodes[i].spec.base.is_none() {
                continue;
            }
            let mut visited = FxHashSet::default();
            let mut cursor = origin.clone();
            loop {
                if type_index.contains_key(&cursor) {
                    nodes[i].type_path = cursor;
                    break;
                }
                if !visited.insert(cursor.clone()) {
                    return Err(StoreError::InheritanceCycle(origin));
                }
                let record = node_index
                    .get(&cursor)
                    .map(|&j| &nodes[j])
                    .ok_or_else(|| StoreError::UndeclaredType(origin.clone()))?;
                cursor = record
                    .spec
                    .base
                    .clone()
                    .ok_or_else(|| StoreError::UndeclaredType(origin.clone()))?;
            }
        }

        // Back-reference collections: incoming base and pointer relations,
        // grouped by relation name in scan order.
        for i in 0..nodes.len() {
            let source = nodes[i].spec.path.clone();
            let mut incoming: Vec<(String, ModelPath)> = Vec::new();
            if let Some(base) = &nodes[i].spec.base {
                incoming.push((BASE_RELATION.to_string(), base.clone()));
            }
            for (name, target) in &nodes[i].spec.pointers {
                if let Some(target) = target {
                    incoming.push((name.clone(), target.clone()));
                }
            }
            for (name, target) in incoming {
                let Some(&ti) = node_index.get(&target) else {
                    continue;
                };
                match nodes[ti].collections.iter_mut().find(|(n, _)| *n == name) {
                    Some((_, members)) => members.push(source.clone()),
                    None => nodes[ti].collections.push((name, vec![source.clone()])),
                }
            }
        }

        Ok(Self { root, types, type_index, nodes, node_index })
    }

    fn type_by_path(&self, path: &ModelPath) -> Result<&TypeNode> {
        self.type_index
            .get(path)
            .map(|&i| &self.types[i])
            .ok_or_else(|| StoreError::TypeNotFound(path.clone()))
    }
}

#[async_trait]
impl ModelStore for InMemoryModel {
    fn type_set(&self) -> Result<Vec<TypeNode>> {
        Ok(self.types.clone())
    }

    fn is_subtype_of(&self, sub: &ModelPath, ancestor: &ModelPath) -> Result<bool> {
        self.type_by_path(ancestor)?;
        let mut cursor = self.type_by_path(sub)?;
        let mut steps = 0usize;
        loop {
            if &cursor.path == ancestor {
                return Ok(true);
            }
            match &cursor.base {
                Some(base) => {
                    cursor = self.type_by_path(base)?;
                    steps += 1;
                    if steps > self.types.len() {
                        return Err(StoreError::InheritanceCycle(sub.clone()));
                    }
                }
                None => return Ok(false),
            }
        }
    }

    async fn load_node(&self, path: &ModelPath) -> Result<InstanceNode> {
        let Some(record) = self.node_index.get(path).map(|&i| &self.nodes[i]) else {
            // Meta types are loadable nodes even when the project does not
            // spell them out in the tree; pointer resolution reaches them
            // through `base` slots.
            if let Ok(ty) = self.type_by_path(path) {
                return Ok(InstanceNode {
                    path: ty.path.clone(),
                    id: Uuid::new_v5(&Uuid::NAMESPACE_OID, ty.path.as_str().as_bytes()),
                    relid: ty.path.relid().to_string(),
                    parent: ty.path.parent(),
                    type_path: ty.path.clone(),
                    is_meta: true,
                    attributes: vec![(
                        "name".to_string(),
                        AttributeValue::from(ty.name.clone()),
                    )],
                    pointers: ty
                        .base
                        .as_ref()
                        .map(|base| vec![(BASE_RELATION.to_string(), Some(base.clone()))])
                        .unwrap_or_default(),
                    sets: Vec::new(),
                    collections: Vec::new(),
                    children: Vec::new(),
                });
            }
            return Err(StoreError::NodeNotFound(path.clone()));
        };

        let mut pointers = Vec::with_capacity(record.spec.pointers.len() + 1);
        if let Some(base) = &record.spec.base {
            pointers.push((BASE_RELATION.to_string(), Some(base.clone())));
        }
        pointers.extend(record.spec.pointers.iter().cloned());

        Ok(InstanceNode {
            path: record.spec.path.clone(),
            id: record.id,
            relid: record.spec.path.relid().to_string(),
            parent: record.spec.path.parent(),
            type_path: record.type_path.clone(),
            is_meta: self.type_index.contains_key(&record.spec.path),
            attributes: record.spec.attributes.clone(),
            pointers,
            sets: record.spec.sets.clone(),
            collections: record.collections.clone(),
            children: record.children.clone(),
        })
    }

    fn root(&self) -> ModelPath {
        self.root.clone()
    }
}

/// Handle to a type being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeHandle(usize);

/// Handle to a node being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle(usize);

/// Handle-based builder for [`InMemoryModel`].
#[derive(Debug)]
pub struct ModelBuilder {
    root: ModelPath,
    types: Vec<TypeNode>,
    nodes: Vec<NodeSpec>,
}

impl ModelBuilder {
    /// Create a builder with an empty root node at path `""`.
    pub fn new() -> Self {
        let root = ModelPath::root();
        Self {
            root: root.clone(),
            types: Vec::new(),
            nodes: vec![NodeSpec { path: root, ..NodeSpec::default() }],
        }
    }

    /// Handle of the root node.
    pub fn root(&self) -> NodeHandle {
        NodeHandle(0)
    }

    /// Set the model name (the root node's `name` attribute, which names
    /// the exported language).
    pub fn set_name(&mut self, name: &str) {
        let root = self.root();
        self.set_attribute(root, "name", name);
    }

    /// Define a new meta type.
    pub fn add_type(&mut self, path: &str, name: &str) -> TypeHandle {
        self.types.push(TypeNode {
            path: ModelPath::new(path),
            name: name.to_string(),
            is_abstract: false,
            base: None,
            attributes: Vec::new(),
            containment: Vec::new(),
            references: Vec::new(),
        });
        TypeHandle(self.types.len() - 1)
    }

    /// Set the base of a type.
    pub fn set_type_base(&mut self, ty: TypeHandle, base: TypeHandle) {
        let base_path = self.types[base.0].path.clone();
        self.types[ty.0].base = Some(base_path);
    }

    /// Mark a type abstract.
    pub fn set_abstract(&mut self, ty: TypeHandle, is_abstract: bool) {
        self.types[ty.0].is_abstract = is_abstract;
    }

    /// Declare an attribute on a type.
    pub fn add_attribute(&mut self, ty: TypeHandle, name: &str, kind: AttributeKind) {
        self.types[ty.0]
            .attributes
            .push(AttributeDef { name: name.to_string(), kind });
    }

    /// Declare a containment rule on a type.
    pub fn allow_child(&mut self, ty: TypeHandle, child: TypeHandle, min: i64, max: i64) {
        let child_path = self.types[child.0].path.clone();
        self.types[ty.0].containment.push(ContainmentRule {
            child: child_path,
            bounds: Multiplicity::new(min, max),
        });
    }

    /// Declare a reference rule with aggregate bounds.
    pub fn add_reference(&mut self, ty: TypeHandle, name: &str, min: i64, max: i64) {
        self.types[ty.0].references.push(ReferenceRule {
            name: name.to_string(),
            bounds: Multiplicity::new(min, max),
            targets: Vec::new(),
        });
    }

    /// Add an allowed target to a previously declared reference rule.
    ///
    /// # Panics
    ///
    /// Panics when the rule was never declared; builder misuse is a
    /// programming error, not model data.
    pub fn add_reference_target(
        &mut self,
        ty: TypeHandle,
        name: &str,
        target: TypeHandle,
        min: i64,
        max: i64,
    ) {
        let target_path = self.types[target.0].path.clone();
        let rule = self.types[ty.0]
            .references
            .iter_mut()
            .find(|r| r.name == name)
            .unwrap_or_else(|| panic!("reference rule not declared: {}", name));
        rule.targets
            .push(TargetRule { target: target_path, bounds: Multiplicity::new(min, max) });
    }

    /// Path of a type, for wiring nodes.
    pub fn type_path(&self, ty: TypeHandle) -> &ModelPath {
        &self.types[ty.0].path
    }

    /// Add a node at the given path.
    pub fn add_node(&mut self, path: &str) -> NodeHandle {
        self.nodes
            .push(NodeSpec { path: ModelPath::new(path), ..NodeSpec::default() });
        NodeHandle(self.nodes.len() - 1)
    }

    /// Set a node's instantiation pointer (type or prototype path).
    pub fn set_node_base(&mut self, node: NodeHandle, base: impl Into<ModelPath>) {
        self.nodes[node.0].base = Some(base.into());
    }

    /// Pin a node's stable identifier instead of deriving it from the path.
    pub fn set_guid(&mut self, node: NodeHandle, guid: Uuid) {
        self.nodes[node.0].guid = Some(guid);
    }

    /// Set an own attribute value on a node.
    pub fn set_attribute(
        &mut self,
        node: NodeHandle,
        name: &str,
        value: impl Into<AttributeValue>,
    ) {
        let spec = &mut self.nodes[node.0];
        let value = value.into();
        match spec.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => spec.attributes.push((name.to_string(), value)),
        }
    }

    /// Set a pointer slot on a node; `None` declares the slot unset.
    pub fn set_pointer(&mut self, node: NodeHandle, name: &str, target: Option<ModelPath>) {
        let spec = &mut self.nodes[node.0];
        match spec.pointers.iter_mut().find(|(n, _)| n == name) {
            Some((_, t)) => *t = target,
            None => spec.pointers.push((name.to_string(), target)),
        }
    }

    /// Append a member to a set on a node.
    pub fn add_set_member(&mut self, node: NodeHandle, set: &str, member: impl Into<ModelPath>) {
        let spec = &mut self.nodes[node.0];
        let member = member.into();
        match spec.sets.iter_mut().find(|(n, _)| n == set) {
            Some((_, members)) => members.push(member),
            None => spec.sets.push((set.to_string(), vec![member])),
        }
    }

    /// Finish building, validating the assembled model.
    pub fn build(self) -> Result<InMemoryModel> {
        InMemoryModel::new(self.root, self.types, self.nodes)
    }
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

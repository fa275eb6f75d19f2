//! Asynchronous instance-graph traversal.
//!
//! Depth-first, pre-order walk from the traversal root (which is itself
//! excluded from the output), building the instance document in visitation
//! order. Store lookups are the only suspension points: a node's pointer,
//! set and collection resolutions run concurrently with each other and with
//! sibling and descendant subtree walks, joined per node with fail-fast
//! semantics. A child entry's position in its parent's containment list is
//! fixed by enumeration order at visit time, never by resolution completion
//! order, so the document is reproducible under arbitrary I/O interleaving.

use futures::future::{try_join, try_join_all, BoxFuture, FutureExt};
use rustc_hash::FxHashMap;
use veles_model::{Entry, InstanceNode, ModelPath, ModelStore, TypeNode};

use crate::error::{ExportError, Result};
use crate::keys;

/// How a resolved relation value lands in its node entry.
enum SlotMode {
    /// Single-valued slot (pointers).
    Single,
    /// Space-accumulated slot (set and collection members).
    Accumulate,
}

/// One resolved relation value, keyed and ready to record.
struct SlotValue {
    key: String,
    value: String,
    mode: SlotMode,
}

/// Walks the instance graph and assembles the instance document body.
pub struct InstanceTraverser<'a> {
    store: &'a dyn ModelStore,
    type_names: FxHashMap<ModelPath, String>,
}

impl<'a> InstanceTraverser<'a> {
    /// Create a traverser over a store and its type set.
    pub fn new(store: &'a dyn ModelStore, types: &[TypeNode]) -> Self {
        let type_names = types
            .iter()
            .map(|ty| (ty.path.clone(), ty.name.clone()))
            .collect();
        Self { store, type_names }
    }

    /// Traverse from `root` and return the document body: the root's
    /// children (and their subtrees) grouped under their type names. The
    /// root node itself is never emitted.
    pub async fn run(&self, root: &ModelPath) -> Result<Entry> {
        let root_node = self.store.load_node(root).await?;
        tracing::debug!(
            root = %root_node.path,
            children = root_node.children.len(),
            "traversing instance graph"
        );

        let mut doc = Entry::new();
        for (type_name, entry) in self.visit_children(&root_node).await? {
            doc.append_child(type_name, entry);
        }
        Ok(doc)
    }

    /// Visit one node: record its entry synchronously, then resolve its
    /// relations and walk its children concurrently. Returns the node's
    /// declared type name (its containment key) with the finished entry.
    fn visit<'b>(&'b self, path: &'b ModelPath) -> BoxFuture<'b, Result<(String, Entry)>> {
        async move {
            let node = self.store.load_node(path).await?;
            let type_name = self.type_name(&node.type_path)?.to_string();

            // The entry and everything derivable from the loaded node alone
            // are recorded before any relationship resolution completes; the
            // slots filled below only ever extend it.
            let mut entry = Entry::new();
            entry.set(keys::ID, node.id.to_string());
            entry.set(keys::RELID, &node.relid);
            entry.set(keys::IS_META, if node.is_meta { "true" } else { "false" });
            for (name, value) in &node.attributes {
                entry.set(format!("{}{}", keys::ATTR_PREFIX, name), value.to_string());
            }

            let (slots, subtrees) =
                try_join(self.resolve_relations(&node), self.visit_children(&node)).await?;

            for slot in slots {
                match slot.mode {
                    SlotMode::Single => entry.set(slot.key, slot.value),
                    SlotMode::Accumulate => entry.accumulate(slot.key, &slot.value),
                }
            }
            for (child_type, child_entry) in subtrees {
                entry.append_child(child_type, child_entry);
            }

            Ok((type_name, entry))
        }
        .boxed()
    }

    /// Walk a node's children concurrently. The result order, and with it
    /// every containment-list append, is the store's child enumeration
    /// order, regardless of which subtree finishes first.
    async fn visit_children(&self, node: &InstanceNode) -> Result<Vec<(String, Entry)>> {
        try_join_all(node.children.iter().map(|child| self.visit(child))).await
    }

    /// Fan out every relationship resolution of one node and join them,
    /// failing fast. Results come back in relation-enumeration order:
    /// pointers, then set members, then collection members.
    async fn resolve_relations(&self, node: &InstanceNode) -> Result<Vec<SlotValue>> {
        let mut futures: Vec<BoxFuture<'_, Result<SlotValue>>> = Vec::new();

        for (name, target) in &node.pointers {
            let Some(target) = target else {
                continue;
            };
            futures.push(self.resolve_pointer(name, target).boxed());
        }

        for (name, members) in &node.sets {
            for member in members {
                futures.push(
                    self.resolve_member(keys::SET_REL_PREFIX, name, member)
                        .boxed(),
                );
            }
        }

        for (name, members) in &node.collections {
            // The base collection would duplicate the instantiation pointer
            // already recorded on every pointing node.
            if name == keys::BASE {
                continue;
            }
            for member in members {
                futures.push(
                    self.resolve_member(keys::INV_REL_PREFIX, name, member)
                        .boxed(),
                );
            }
        }

        try_join_all(futures).await
    }

    async fn resolve_pointer(&self, name: &str, target: &ModelPath) -> Result<SlotValue> {
        let target_node = self.store.load_node(target).await?;
        if name == keys::BASE {
            return Ok(SlotValue {
                key: keys::BASE.to_string(),
                value: target_node.id.to_string(),
                mode: SlotMode::Single,
            });
        }

        let target_type = self.type_name(&target_node.type_path)?;
        Ok(SlotValue {
            key: format!("{}{}{}{}", keys::REL_PREFIX, name, keys::DIV, target_type),
            value: target_node.id.to_string(),
            mode: SlotMode::Single,
        })
    }

    async fn resolve_member(
        &self,
        prefix: &str,
        name: &str,
        member: &ModelPath,
    ) -> Result<SlotValue> {
        let member_node = self.store.load_node(member).await?;
        let member_type = self.type_name(&member_node.type_path)?;
        Ok(SlotValue {
            key: format!("{}{}{}{}", prefix, name, keys::DIV, member_type),
            value: member_node.id.to_string(),
            mode: SlotMode::Accumulate,
        })
    }

    fn type_name(&self, path: &ModelPath) -> Result<&str> {
        self.type_names
            .get(path)
            .map(String::as_str)
            .ok_or_else(|| ExportError::UnknownType(path.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use veles_model::{
        InstanceNode, ModelBuilder, ModelPath, ModelStore, StoreError, TypeNode,
    };

    use super::*;

    /// Store wrapper injecting per-path load latency, for asserting that
    /// completion order never leaks into the document.
    struct DelayedStore<S> {
        inner: S,
        delays: FxHashMap<ModelPath, u64>,
    }

    impl<S> DelayedStore<S> {
        fn new(inner: S) -> Self {
            Self { inner, delays: FxHashMap::default() }
        }

        fn delay(mut self, path: &str, millis: u64) -> Self {
            self.delays.insert(ModelPath::new(path), millis);
            self
        }
    }

    #[async_trait]
    impl<S: ModelStore> ModelStore for DelayedStore<S> {
        fn type_set(&self) -> veles_model::Result<Vec<TypeNode>> {
            self.inner.type_set()
        }

        fn is_subtype_of(
            &self,
            sub: &ModelPath,
            ancestor: &ModelPath,
        ) -> veles_model::Result<bool> {
            self.inner.is_subtype_of(sub, ancestor)
        }

        async fn load_node(&self, path: &ModelPath) -> veles_model::Result<InstanceNode> {
            if let Some(&millis) = self.delays.get(path) {
                tokio::time::sleep(Duration::from_millis(millis)).await;
            }
            self.inner.load_node(path).await
        }

        fn root(&self) -> ModelPath {
            self.inner.root()
        }
    }

    fn sibling_model() -> ModelBuilder {
        let mut b = ModelBuilder::new();
        b.set_name("ordering");
        let node = b.add_type("/m/Node", "Node");
        b.allow_child(node, node, -1, -1);
        for relid in ["first", "second", "third"] {
            let n = b.add_node(&format!("/{}", relid));
            b.set_node_base(n, "/m/Node");
        }
        b
    }

    async fn traverse(store: &dyn ModelStore) -> Result<Entry> {
        let types = store.type_set()?;
        let traverser = InstanceTraverser::new(store, &types);
        traverser.run(&store.root()).await
    }

    #[tokio::test]
    async fn test_root_is_excluded_and_children_keyed_by_type() {
        let store = sibling_model().build().unwrap();
        let doc = traverse(&store).await.unwrap();

        // Only the containment list, no identity attributes on the body.
        assert_eq!(doc.attributes().count(), 0);
        let nodes = doc.child_list("Node").unwrap();
        assert_eq!(nodes.len(), 3);
        let relids: Vec<_> = nodes
            .iter()
            .map(|e| e.attribute(keys::RELID).unwrap())
            .collect();
        assert_eq!(relids, ["first", "second", "third"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_containment_order_ignores_resolution_latency() {
        // The first sibling is slow to load and its subtree slower still;
        // pre-order position must be unaffected.
        let store = DelayedStore::new(sibling_model().build().unwrap())
            .delay("/first", 500)
            .delay("/second", 40)
            .delay("/third", 3);
        let doc = traverse(&store).await.unwrap();

        let relids: Vec<_> = doc
            .child_list("Node")
            .unwrap()
            .iter()
            .map(|e| e.attribute(keys::RELID).unwrap())
            .collect();
        assert_eq!(relids, ["first", "second", "third"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_accumulation_order_ignores_member_latency() {
        let mut b = ModelBuilder::new();
        let node = b.add_type("/m/Node", "Node");
        b.allow_child(node, node, -1, -1);
        let holder = b.add_node("/holder");
        b.set_node_base(holder, "/m/Node");
        for relid in ["a", "b", "c"] {
            let n = b.add_node(&format!("/{}", relid));
            b.set_node_base(n, "/m/Node");
            b.add_set_member(holder, "members", format!("/{}", relid));
        }
        let store = DelayedStore::new(b.build().unwrap())
            .delay("/a", 300)
            .delay("/b", 20)
            .delay("/c", 1);

        let doc = traverse(&store).await.unwrap();
        let holder_entry = doc
            .child_list("Node")
            .unwrap()
            .iter()
            .find(|e| e.attribute(keys::RELID) == Some("holder"))
            .unwrap();

        let a = store.inner.load_node(&ModelPath::new("/a")).await.unwrap().id;
        let bb = store.inner.load_node(&ModelPath::new("/b")).await.unwrap().id;
        let c = store.inner.load_node(&ModelPath::new("/c")).await.unwrap().id;
        assert_eq!(
            holder_entry.attribute("set-members-Node"),
            Some(format!("{} {} {}", a, bb, c).as_str())
        );
    }

    #[tokio::test]
    async fn test_node_slots_and_base_handling() {
        let mut b = ModelBuilder::new();
        let node = b.add_type("/m/Node", "Node");
        b.allow_child(node, node, -1, -1);

        // `left` instantiates `right` directly, so its `base` slot points at
        // a sibling node rather than a meta type.
        let left = b.add_node("/left");
        b.set_node_base(left, "/right");
        b.set_attribute(left, "label", "L");
        b.set_pointer(left, "peer", Some(ModelPath::new("/right")));
        // Declared but unset pointers are skipped entirely.
        b.set_pointer(left, "spare", None);

        let right = b.add_node("/right");
        b.set_node_base(right, "/m/Node");

        let store = b.build().unwrap();
        let doc = traverse(&store).await.unwrap();
        let nodes = doc.child_list("Node").unwrap();

        let left_entry = &nodes[0];
        let right_entry = &nodes[1];
        let right_id = store
            .load_node(&ModelPath::new("/right"))
            .await
            .unwrap()
            .id
            .to_string();

        assert_eq!(left_entry.attribute("atr-label"), Some("L"));
        assert_eq!(left_entry.attribute("isMeta"), Some("false"));
        assert_eq!(
            left_entry.attribute("rel-peer-Node"),
            Some(right_id.as_str())
        );
        assert_eq!(left_entry.attribute("rel-spare-Node"), None);

        // The instantiation pointer lands under the fixed `base` key, not
        // the generic reference scheme...
        assert_eq!(left_entry.attribute(keys::BASE), Some(right_id.as_str()));
        assert!(left_entry.attribute("rel-base-Node").is_none());
        // ...and the corresponding back-reference collection is never
        // exported, while the `peer` collection is.
        assert!(right_entry
            .attributes()
            .all(|(k, _)| !k.starts_with("invrel-base")));
        let left_id = store
            .load_node(&ModelPath::new("/left"))
            .await
            .unwrap()
            .id
            .to_string();
        assert_eq!(
            right_entry.attribute("invrel-peer-Node"),
            Some(left_id.as_str())
        );
    }

    #[tokio::test]
    async fn test_meta_node_flag() {
        let mut b = ModelBuilder::new();
        let node = b.add_type("/m/Node", "Node");
        b.allow_child(node, node, -1, -1);
        // The meta definition itself appears in the tree; as the hierarchy
        // root it carries no instantiation pointer of its own.
        let meta_dir = b.add_node("/m");
        b.set_node_base(meta_dir, "/m/Node");
        b.add_node("/m/Node");
        let store = b.build().unwrap();

        let doc = traverse(&store).await.unwrap();
        let dir_entry = &doc.child_list("Node").unwrap()[0];
        let meta_entry = &dir_entry.child_list("Node").unwrap()[0];
        assert_eq!(meta_entry.attribute(keys::IS_META), Some("true"));
        assert_eq!(dir_entry.attribute(keys::IS_META), Some("false"));
    }

    #[tokio::test]
    async fn test_nesting_follows_containment() {
        let mut b = ModelBuilder::new();
        let node = b.add_type("/m/Node", "Node");
        b.allow_child(node, node, -1, -1);
        for path in ["/a", "/a/b", "/a/b/c"] {
            let n = b.add_node(path);
            b.set_node_base(n, "/m/Node");
        }
        let store = b.build().unwrap();

        let doc = traverse(&store).await.unwrap();
        assert_eq!(doc.depth(), 3);
        let a = &doc.child_list("Node").unwrap()[0];
        let b_entry = &a.child_list("Node").unwrap()[0];
        let c = &b_entry.child_list("Node").unwrap()[0];
        assert_eq!(c.attribute(keys::RELID), Some("c"));
        assert!(!c.has_children());
    }

    #[tokio::test]
    async fn test_unresolvable_pointer_aborts_traversal() {
        let mut b = ModelBuilder::new();
        let node = b.add_type("/m/Node", "Node");
        b.allow_child(node, node, -1, -1);
        let n = b.add_node("/a");
        b.set_node_base(n, "/m/Node");
        b.set_pointer(n, "peer", Some(ModelPath::new("/gone")));
        let store = b.build().unwrap();

        let err = traverse(&store).await.unwrap_err();
        assert!(matches!(
            err,
            ExportError::Store(StoreError::NodeNotFound(_))
        ));
    }
}

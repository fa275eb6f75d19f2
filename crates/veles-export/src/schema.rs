//! Schema document synthesis.
//!
//! One class entry per meta type, carrying attribute features plus
//! containment and reference features. Inherited structure is not copied
//! onto subtypes; instead, wherever a type is permitted (as a child or as a
//! reference target), every type in its subtype closure is permitted too,
//! with unbounded multiplicity. To-one pointer rules additionally get
//! inverse reference features synthesized onto their target classes.

use rustc_hash::{FxHashMap, FxHashSet};
use veles_model::{Entry, ModelPath, ReferenceRule, TypeNode};

use crate::closure::TypeClosureIndex;
use crate::error::{ExportError, Result};
use crate::keys;

/// Schema feature kind marker: attribute features.
const KIND_ATTRIBUTE: &str = "attribute";
/// Schema feature kind marker: reference features (containment included).
const KIND_REFERENCE: &str = "reference";

/// Builds the schema document from a type set and its closure index.
pub struct SchemaBuilder<'a> {
    types: &'a [TypeNode],
    closure: &'a TypeClosureIndex,
    by_path: FxHashMap<&'a ModelPath, &'a TypeNode>,
}

/// One class entry under construction, with its feature-name dedup set.
struct ClassSlot {
    name: String,
    entry: Entry,
    feature_names: FxHashSet<String>,
}

impl ClassSlot {
    /// Append a feature unless one with the same name already exists;
    /// duplicates reached via different derivation paths are silently
    /// dropped, first writer wins.
    fn push_feature(&mut self, feature: Entry) {
        let name = feature
            .attribute("name")
            .expect("schema features always carry a name")
            .to_string();
        if self.feature_names.insert(name) {
            self.entry.append_child(keys::FEATURE_LIST, feature);
        }
    }
}

impl<'a> SchemaBuilder<'a> {
    /// Create a builder over a type set and its precomputed closure.
    pub fn new(types: &'a [TypeNode], closure: &'a TypeClosureIndex) -> Self {
        let by_path = types.iter().map(|ty| (&ty.path, ty)).collect();
        Self { types, closure, by_path }
    }

    /// Produce the schema document body: one `class` child entry per type,
    /// in type-set order. Deterministic: identical input yields identical
    /// output, including feature order.
    pub fn build(&self) -> Result<Entry> {
        let mut slots: Vec<ClassSlot> = Vec::with_capacity(self.types.len());
        let mut slot_index: FxHashMap<String, usize> = FxHashMap::default();
        let mut inverses: Vec<(String, Entry)> = Vec::new();

        for ty in self.types {
            let slot = self.class_entry(ty, &mut inverses)?;
            slot_index.insert(slot.name.clone(), slots.len());
            slots.push(slot);
        }

        // Inverse features are applied after every class exists, since a
        // pointer may target a class declared later in the set.
        for (target_class, feature) in inverses {
            let idx = slot_index[&target_class];
            slots[idx].push_feature(feature);
        }

        let mut doc = Entry::new();
        for slot in slots {
            doc.append_child(keys::CLASS_LIST, slot.entry);
        }
        Ok(doc)
    }

    fn class_entry(
        &self,
        ty: &TypeNode,
        inverses: &mut Vec<(String, Entry)>,
    ) -> Result<ClassSlot> {
        let mut slot = ClassSlot {
            name: ty.name.clone(),
            entry: Entry::new(),
            feature_names: FxHashSet::default(),
        };
        slot.entry.set("name", &ty.name);

        match &ty.base {
            Some(base) => {
                let base_ty = self.lookup(base).ok_or_else(|| ExportError::DanglingBase {
                    owner: ty.name.clone(),
                    base: base.clone(),
                })?;
                // Identity features are inherited through subtyping, not
                // duplicated.
                slot.entry.set("supertype", &base_ty.name);
            }
            None => {
                // The rootless type carries the identity features and the
                // optional self-typed instantiation reference.
                let mut id = attribute_feature(keys::ID, "string");
                id.set("identity", "true");
                slot.push_feature(id);
                slot.push_feature(attribute_feature(keys::RELID, "string"));
                slot.push_feature(attribute_feature(keys::IS_META, "boolean"));
                slot.push_feature(reference_feature(keys::BASE, &ty.name, 0, 1));
            }
        }

        for attr in &ty.attributes {
            slot.push_feature(attribute_feature(
                &format!("{}{}", keys::ATTR_PREFIX, attr.name),
                attr.kind.primitive().as_str(),
            ));
        }

        self.containment_features(ty, &mut slot)?;
        self.reference_features(ty, &mut slot, inverses)?;

        Ok(slot)
    }

    fn containment_features(&self, ty: &TypeNode, slot: &mut ClassSlot) -> Result<()> {
        let mut added: FxHashSet<ModelPath> = FxHashSet::default();
        let mut own: Vec<ModelPath> = Vec::new();

        for rule in &ty.containment {
            let child = self.lookup(&rule.child).ok_or_else(|| ExportError::DanglingChild {
                owner: ty.name.clone(),
                child: rule.child.clone(),
            })?;
            if added.insert(rule.child.clone()) {
                own.push(rule.child.clone());
            }
            let mut feature =
                reference_feature(&child.name, &child.name, rule.bounds.lower(), rule.bounds.upper());
            feature.set("containment", "true");
            slot.push_feature(feature);
        }

        // A subtype instance may appear wherever its supertype is permitted;
        // the propagated rule is strictly looser than the declared one, so
        // the bounds are left unbounded rather than inherited.
        for own_path in &own {
            for derived in self.closure.derived_of(own_path) {
                if !added.insert(derived.clone()) {
                    continue;
                }
                let child = self.known(derived)?;
                let mut feature = reference_feature(&child.name, &child.name, 0, -1);
                feature.set("containment", "true");
                slot.push_feature(feature);
            }
        }

        Ok(())
    }

    fn reference_features(
        &self,
        ty: &TypeNode,
        slot: &mut ClassSlot,
        inverses: &mut Vec<(String, Entry)>,
    ) -> Result<()> {
        for rule in &ty.references {
            let mut added: FxHashSet<ModelPath> = FxHashSet::default();
            let mut own: Vec<ModelPath> = Vec::new();

            for target_rule in &rule.targets {
                let target =
                    self.lookup(&target_rule.target)
                        .ok_or_else(|| ExportError::DanglingTarget {
                            owner: ty.name.clone(),
                            relation: rule.name.clone(),
                            target: target_rule.target.clone(),
                        })?;
                if added.insert(target_rule.target.clone()) {
                    own.push(target_rule.target.clone());
                }
                slot.push_feature(reference_feature(
                    &relation_key(keys::REL_PREFIX, &rule.name, &target.name),
                    &target.name,
                    target_rule.bounds.lower(),
                    target_rule.bounds.upper(),
                ));

                if rule.is_pointer() {
                    self.collect_inverses(ty, rule, target, inverses)?;
                }
            }

            for own_path in &own {
                for derived in self.closure.derived_of(own_path) {
                    if !added.insert(derived.clone()) {
                        continue;
                    }
                    let target = self.known(derived)?;
                    slot.push_feature(reference_feature(
                        &relation_key(keys::REL_PREFIX, &rule.name, &target.name),
                        &target.name,
                        0,
                        -1,
                    ));
                }
            }
        }

        Ok(())
    }

    /// Synthesize the inverse features of one to-one pointer rule target:
    /// every allowed target class (the target and its subtype closure)
    /// receives an inverse typed by the owner, replicated for every subtype
    /// of the owner, since a subtype instance is a valid pointer source
    /// wherever its supertype is.
    fn collect_inverses(
        &self,
        owner: &TypeNode,
        rule: &ReferenceRule,
        target: &TypeNode,
        inverses: &mut Vec<(String, Entry)>,
    ) -> Result<()> {
        let mut target_names = vec![target.name.clone()];
        for derived in self.closure.derived_of(&target.path) {
            target_names.push(self.known(derived)?.name.clone());
        }

        let mut owner_names = vec![owner.name.clone()];
        for derived in self.closure.derived_of(&owner.path) {
            owner_names.push(self.known(derived)?.name.clone());
        }

        for target_name in &target_names {
            for owner_name in &owner_names {
                let feature = reference_feature(
                    &relation_key(keys::INV_REL_PREFIX, &rule.name, owner_name),
                    owner_name,
                    0,
                    -1,
                );
                inverses.push((target_name.clone(), feature));
            }
        }

        Ok(())
    }

    fn lookup(&self, path: &ModelPath) -> Option<&TypeNode> {
        self.by_path.get(path).copied()
    }

    /// Lookup for paths produced by the closure index, which always come
    /// from the type set.
    fn known(&self, path: &ModelPath) -> Result<&TypeNode> {
        self.lookup(path)
            .ok_or_else(|| ExportError::UnknownType(path.clone()))
    }
}

fn attribute_feature(name: &str, primitive: &str) -> Entry {
    let mut entry = Entry::new();
    entry.set("kind", KIND_ATTRIBUTE);
    entry.set("name", name);
    entry.set("type", primitive);
    entry
}

fn reference_feature(name: &str, target_type: &str, lower: i64, upper: i64) -> Entry {
    let mut entry = Entry::new();
    entry.set("kind", KIND_REFERENCE);
    entry.set("name", name);
    entry.set("type", target_type);
    entry.set("lower", lower.to_string());
    entry.set("upper", upper.to_string());
    entry
}

fn relation_key(prefix: &str, relation: &str, type_name: &str) -> String {
    format!("{}{}{}{}", prefix, relation, keys::DIV, type_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use veles_model::{AttributeKind, ModelBuilder, ModelStore};

    fn build_schema(store: &dyn ModelStore) -> Entry {
        let types = store.type_set().unwrap();
        let closure = TypeClosureIndex::build(store, &types).unwrap();
        SchemaBuilder::new(&types, &closure).build().unwrap()
    }

    fn feature_names(class: &Entry) -> Vec<&str> {
        class
            .child_list(keys::FEATURE_LIST)
            .unwrap_or(&[])
            .iter()
            .map(|f| f.attribute("name").unwrap())
            .collect()
    }

    fn class_by_name<'e>(doc: &'e Entry, name: &str) -> &'e Entry {
        doc.child_list(keys::CLASS_LIST)
            .unwrap()
            .iter()
            .find(|c| c.attribute("name") == Some(name))
            .unwrap()
    }

    #[test]
    fn test_minimal_self_containing_root() {
        // A single rootless type `Node` containing 0..unbounded `Node`s.
        let mut b = ModelBuilder::new();
        let node = b.add_type("/m/Node", "Node");
        b.allow_child(node, node, -1, -1);
        let store = b.build().unwrap();

        let doc = build_schema(&store);
        let classes = doc.child_list(keys::CLASS_LIST).unwrap();
        assert_eq!(classes.len(), 1);

        let class = &classes[0];
        assert_eq!(class.attribute("supertype"), None);
        assert_eq!(
            feature_names(class),
            [keys::ID, keys::RELID, keys::IS_META, keys::BASE, "Node"]
        );

        let features = class.child_list(keys::FEATURE_LIST).unwrap();
        // Identity attribute carries the marker.
        assert_eq!(features[0].attribute("identity"), Some("true"));
        assert_eq!(features[0].attribute("type"), Some("string"));
        assert_eq!(features[2].attribute("type"), Some("boolean"));
        // Optional self-typed instantiation reference.
        assert_eq!(features[3].attribute("lower"), Some("0"));
        assert_eq!(features[3].attribute("upper"), Some("1"));
        // Self containment: unenforced minimum renders as 0, unbounded stays
        // -1.
        assert_eq!(features[4].attribute("containment"), Some("true"));
        assert_eq!(features[4].attribute("lower"), Some("0"));
        assert_eq!(features[4].attribute("upper"), Some("-1"));
    }

    #[test]
    fn test_attributes_and_asset_degradation() {
        let mut b = ModelBuilder::new();
        let fco = b.add_type("/m/FCO", "FCO");
        b.add_attribute(fco, "label", AttributeKind::String);
        b.add_attribute(fco, "icon", AttributeKind::Asset);
        b.add_attribute(fco, "weight", AttributeKind::Float);
        let store = b.build().unwrap();

        let doc = build_schema(&store);
        let class = class_by_name(&doc, "FCO");
        let features = class.child_list(keys::FEATURE_LIST).unwrap();

        let icon = features
            .iter()
            .find(|f| f.attribute("name") == Some("atr-icon"))
            .unwrap();
        assert_eq!(icon.attribute("kind"), Some(KIND_ATTRIBUTE));
        assert_eq!(icon.attribute("type"), Some("string"));

        let weight = features
            .iter()
            .find(|f| f.attribute("name") == Some("atr-weight"))
            .unwrap();
        assert_eq!(weight.attribute("type"), Some("float"));
    }

    #[test]
    fn test_containment_propagates_to_subtypes_unbounded() {
        let mut b = ModelBuilder::new();
        let fco = b.add_type("/m/FCO", "FCO");
        let block = b.add_type("/m/Block", "Block");
        b.set_type_base(block, fco);
        let gain = b.add_type("/m/Gain", "Gain");
        b.set_type_base(gain, block);
        // FCO allows Block children 1..8; Gain is reachable only through
        // the closure.
        b.allow_child(fco, block, 1, 8);
        let store = b.build().unwrap();

        let doc = build_schema(&store);
        let class = class_by_name(&doc, "FCO");
        let features = class.child_list(keys::FEATURE_LIST).unwrap();

        let declared = features
            .iter()
            .find(|f| f.attribute("name") == Some("Block"))
            .unwrap();
        assert_eq!(declared.attribute("lower"), Some("1"));
        assert_eq!(declared.attribute("upper"), Some("8"));

        let propagated = features
            .iter()
            .find(|f| f.attribute("name") == Some("Gain"))
            .unwrap();
        assert_eq!(propagated.attribute("containment"), Some("true"));
        assert_eq!(propagated.attribute("lower"), Some("0"));
        assert_eq!(propagated.attribute("upper"), Some("-1"));
    }

    #[test]
    fn test_declared_rule_wins_over_propagation() {
        let mut b = ModelBuilder::new();
        let fco = b.add_type("/m/FCO", "FCO");
        let sub = b.add_type("/m/Sub", "Sub");
        b.set_type_base(sub, fco);
        // Both declared explicitly; the closure of FCO also yields Sub, but
        // the declared bounds must survive (first writer wins).
        b.allow_child(fco, fco, -1, -1);
        b.allow_child(fco, sub, 2, 5);
        let store = b.build().unwrap();

        let doc = build_schema(&store);
        let class = class_by_name(&doc, "FCO");
        let features = class.child_list(keys::FEATURE_LIST).unwrap();
        let subs: Vec<_> = features
            .iter()
            .filter(|f| f.attribute("name") == Some("Sub"))
            .collect();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].attribute("lower"), Some("2"));
        assert_eq!(subs[0].attribute("upper"), Some("5"));
    }

    #[test]
    fn test_pointer_inverse_synthesis_with_subtypes() {
        // A declares a to-one pointer `owner` to A; B extends A. Both A and
        // B are eligible targets and eligible owners, so both classes carry
        // the inverse for both owner names.
        let mut b = ModelBuilder::new();
        let a = b.add_type("/m/A", "A");
        let bb = b.add_type("/m/B", "B");
        b.set_type_base(bb, a);
        b.add_reference(a, "owner", 1, 1);
        b.add_reference_target(a, "owner", a, -1, 1);
        let store = b.build().unwrap();

        let doc = build_schema(&store);

        for class_name in ["A", "B"] {
            let class = class_by_name(&doc, class_name);
            let names = feature_names(class);
            let inverse_count = names
                .iter()
                .filter(|n| n.starts_with(keys::INV_REL_PREFIX))
                .count();
            assert_eq!(inverse_count, 2, "class {}", class_name);
            assert!(names.contains(&"invrel-owner-A"));
            assert!(names.contains(&"invrel-owner-B"));
        }

        // The inverse is typed by its owner and unbounded.
        let class = class_by_name(&doc, "B");
        let inv = class
            .child_list(keys::FEATURE_LIST)
            .unwrap()
            .iter()
            .find(|f| f.attribute("name") == Some("invrel-owner-B"))
            .unwrap();
        assert_eq!(inv.attribute("type"), Some("B"));
        assert_eq!(inv.attribute("lower"), Some("0"));
        assert_eq!(inv.attribute("upper"), Some("-1"));

        // The owning side got the direct features for both target names.
        let class = class_by_name(&doc, "A");
        let names = feature_names(class);
        assert!(names.contains(&"rel-owner-A"));
        assert!(names.contains(&"rel-owner-B"));
    }

    #[test]
    fn test_non_pointer_rules_get_no_inverse() {
        let mut b = ModelBuilder::new();
        let a = b.add_type("/m/A", "A");
        b.add_reference(a, "tags", 0, -1);
        b.add_reference_target(a, "tags", a, -1, -1);
        let store = b.build().unwrap();

        let doc = build_schema(&store);
        let class = class_by_name(&doc, "A");
        assert!(feature_names(class)
            .iter()
            .all(|n| !n.starts_with(keys::INV_REL_PREFIX)));
    }

    #[test]
    fn test_inverse_dedup_over_multiple_derivations() {
        // Three-level chain; targets and owners each expand to {A, B, C},
        // producing nine pairs that dedup to three inverse features per
        // class.
        let mut b = ModelBuilder::new();
        let a = b.add_type("/m/A", "A");
        let bb = b.add_type("/m/B", "B");
        b.set_type_base(bb, a);
        let c = b.add_type("/m/C", "C");
        b.set_type_base(c, bb);
        b.add_reference(a, "owner", 1, 1);
        b.add_reference_target(a, "owner", a, -1, 1);
        let store = b.build().unwrap();

        let doc = build_schema(&store);
        for class_name in ["A", "B", "C"] {
            let class = class_by_name(&doc, class_name);
            let inverse_count = feature_names(class)
                .iter()
                .filter(|n| n.starts_with(keys::INV_REL_PREFIX))
                .count();
            assert_eq!(inverse_count, 3, "class {}", class_name);
        }
    }

    #[test]
    fn test_schema_synthesis_is_deterministic() {
        let mut b = ModelBuilder::new();
        let a = b.add_type("/m/A", "A");
        let bb = b.add_type("/m/B", "B");
        b.set_type_base(bb, a);
        b.add_reference(a, "owner", 1, 1);
        b.add_reference_target(a, "owner", a, -1, 1);
        b.allow_child(a, a, -1, -1);
        let store = b.build().unwrap();

        let first = build_schema(&store);
        let second = build_schema(&store);
        assert_eq!(first, second);
    }

    #[test]
    fn test_abstract_type_keeps_features() {
        let mut b = ModelBuilder::new();
        let a = b.add_type("/m/A", "A");
        b.set_abstract(a, true);
        b.add_attribute(a, "label", AttributeKind::String);
        let store = b.build().unwrap();

        let doc = build_schema(&store);
        let class = class_by_name(&doc, "A");
        assert!(feature_names(class).contains(&"atr-label"));
        // Abstractness is descriptive only and never exported.
        assert_eq!(class.attribute("abstract"), None);
    }

    #[test]
    fn test_dangling_base_is_fatal() {
        let types = vec![TypeNode {
            path: ModelPath::new("/m/A"),
            name: "A".into(),
            is_abstract: false,
            base: Some(ModelPath::new("/m/Gone")),
            attributes: vec![],
            containment: vec![],
            references: vec![],
        }];
        let store = veles_model::InMemoryModel::new(
            ModelPath::root(),
            vec![],
            vec![veles_model::NodeSpec::default()],
        )
        .unwrap();
        let closure = TypeClosureIndex::build(&store, &[]).unwrap();

        let err = SchemaBuilder::new(&types, &closure).build().unwrap_err();
        assert!(matches!(err, ExportError::DanglingBase { .. }));
    }

    #[test]
    fn test_dangling_reference_target_is_fatal() {
        let mut b = ModelBuilder::new();
        b.add_type("/m/A", "A");
        let store = b.build().unwrap();
        let closure = TypeClosureIndex::build(&store, &store.type_set().unwrap()).unwrap();

        let mut types = store.type_set().unwrap();
        types[0].references.push(ReferenceRule {
            name: "ref".into(),
            bounds: veles_model::Multiplicity::new(1, 1),
            targets: vec![veles_model::TargetRule {
                target: ModelPath::new("/m/Missing"),
                bounds: veles_model::Multiplicity::new(-1, 1),
            }],
        });

        let err = SchemaBuilder::new(&types, &closure).build().unwrap_err();
        assert!(matches!(err, ExportError::DanglingTarget { .. }));
    }
}

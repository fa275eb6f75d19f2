//! Subtype closure index.

use rustc_hash::FxHashMap;
use veles_model::{ModelPath, ModelStore, TypeNode};

use crate::error::Result;

/// For every meta type, the ordered list of all types deriving from it,
/// directly or transitively, excluding the type itself.
///
/// Built with a full pairwise scan over the store's own subtype test:
/// meta-models are small (tens to low hundreds of types), so the O(n²)
/// simplicity beats an incremental or topological computation. Multi-level
/// specialization resolves correctly because the store answers the
/// transitive question itself; base pointers are never walked here.
#[derive(Debug)]
pub struct TypeClosureIndex {
    derived: FxHashMap<ModelPath, Vec<ModelPath>>,
}

impl TypeClosureIndex {
    /// Compute the closure of every type in the set.
    ///
    /// Fails only if the subtype test itself fails, and then fails the
    /// whole computation; there is no partial index.
    pub fn build(store: &dyn ModelStore, types: &[TypeNode]) -> Result<Self> {
        let mut derived = FxHashMap::default();

        for ancestor in types {
            let mut list = Vec::new();
            for candidate in types {
                if candidate.path == ancestor.path {
                    continue;
                }
                if store.is_subtype_of(&candidate.path, &ancestor.path)? {
                    list.push(candidate.path.clone());
                }
            }
            derived.insert(ancestor.path.clone(), list);
        }

        Ok(Self { derived })
    }

    /// All types deriving from `path`, in type-set order. Unknown paths
    /// yield an empty slice.
    pub fn derived_of(&self, path: &ModelPath) -> &[ModelPath] {
        self.derived.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of indexed types.
    pub fn len(&self) -> usize {
        self.derived.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.derived.is_empty()
    }
}

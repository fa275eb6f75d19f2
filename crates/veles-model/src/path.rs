//! Slash-separated node paths.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Path of a node inside a model tree.
///
/// The root is the empty path `""`; every other path is a `/`-joined chain
/// of relative identifiers, e.g. `"/engine/2"`. Meta types and instance
/// nodes share the same path space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelPath(String);

impl ModelPath {
    /// The root path.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Create a path from a string. The root is `""`; all other paths must
    /// start with `/`.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The raw path string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the root path.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of the containing parent, or `None` for the root.
    pub fn parent(&self) -> Option<ModelPath> {
        if self.is_root() {
            return None;
        }

        match self.0.rfind('/') {
            Some(idx) => Some(ModelPath(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// The relative identifier: the last path segment, unique only among
    /// siblings. The root's relative identifier is `""`.
    pub fn relid(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Append a relative identifier, producing a child path.
    pub fn join(&self, relid: &str) -> ModelPath {
        ModelPath(format!("{}/{}", self.0, relid))
    }
}

impl fmt::Display for ModelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<&str> for ModelPath {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ModelPath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

//! Generic nested documents.
//!
//! Both export artifacts, the schema document and the instance document,
//! are trees of [`Entry`] values: ordered string attributes plus ordered
//! child lists keyed by relation name. The markup codec consumes this shape
//! without knowing anything about the model it came from.

/// One entry in a nested document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    attributes: Vec<(String, String)>,
    children: Vec<(String, Vec<Entry>)>,
}

impl Entry {
    /// Create an empty entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, replacing any previous value under the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Accumulate into a space-delimited attribute slot: the first write
    /// sets the value, later writes append with a separating space.
    pub fn accumulate(&mut self, key: impl Into<String>, value: &str) {
        let key = key.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => {
                v.push(' ');
                v.push_str(value);
            }
            None => self.attributes.push((key, value.to_string())),
        }
    }

    /// Append a child entry under a relation name. Lists keep the order
    /// children were appended in; relation keys keep first-appearance order.
    pub fn append_child(&mut self, relation: impl Into<String>, child: Entry) {
        let relation = relation.into();
        match self.children.iter_mut().find(|(r, _)| *r == relation) {
            Some((_, list)) => list.push(child),
            None => self.children.push((relation, vec![child])),
        }
    }

    /// Look up an attribute value.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Ordered attributes.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Child list under a relation name.
    pub fn child_list(&self, relation: &str) -> Option<&[Entry]> {
        self.children
            .iter()
            .find(|(r, _)| r == relation)
            .map(|(_, list)| list.as_slice())
    }

    /// Ordered child lists.
    pub fn child_lists(&self) -> impl Iterator<Item = (&str, &[Entry])> {
        self.children.iter().map(|(r, list)| (r.as_str(), list.as_slice()))
    }

    /// Consume the entry, yielding its child lists.
    pub fn into_children(self) -> Vec<(String, Vec<Entry>)> {
        self.children
    }

    /// Whether the entry has neither attributes nor children.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty()
    }

    /// Whether the entry has any children.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Maximum nesting depth below this entry: 0 for a leaf, 1 + deepest
    /// child otherwise.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .flat_map(|(_, list)| list.iter())
            .map(|c| 1 + c.depth())
            .max()
            .unwrap_or(0)
    }
}

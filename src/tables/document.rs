//! Editable table documents
//!
//! A [`TableDocument`] is a small tree mirroring one or more binary tables,
//! in the spirit of a ttx dump: every node has a tag, string attributes and
//! children. Edits are field level; a table is never rewritten wholesale.
//! Documents are written to the build directory as JSON between the dump
//! and the apply step.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Attribute holding a leaf node's value
pub const VALUE: &str = "value";

/// One element of a table document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocNode {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocNode>,
}

impl DocNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// A leaf with a single `value` attribute
    pub fn leaf(tag: impl Into<String>, value: impl ToString) -> Self {
        Self::new(tag).with_attr(VALUE, value)
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attrs.insert(key.into(), value.to_string());
        self
    }

    pub fn with_child(mut self, child: DocNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn value(&self) -> Option<&str> {
        self.attr(VALUE)
    }

    /// Every node with `tag`, this one included, in document order
    pub fn iter<'a>(&'a self, tag: &str) -> Vec<&'a DocNode> {
        let mut found = Vec::new();
        self.collect(tag, &mut found);
        found
    }

    fn collect<'a>(&'a self, tag: &str, found: &mut Vec<&'a DocNode>) {
        if self.tag == tag {
            found.push(self);
        }
        for child in &self.children {
            child.collect(tag, found);
        }
    }

    fn for_each_mut(&mut self, tag: &str, f: &mut dyn FnMut(&mut DocNode)) {
        if self.tag == tag {
            f(self);
        }
        for child in &mut self.children {
            child.for_each_mut(tag, f);
        }
    }
}

/// A dumped set of tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDocument {
    pub root: DocNode,
}

impl Default for TableDocument {
    fn default() -> Self {
        Self {
            root: DocNode::new("ttFont"),
        }
    }
}

impl TableDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_table(&mut self, table: DocNode) {
        self.root.children.push(table);
    }

    pub fn iter<'a>(&'a self, tag: &str) -> Vec<&'a DocNode> {
        self.root.iter(tag)
    }

    /// First node with `tag`
    pub fn find(&self, tag: &str) -> Option<&DocNode> {
        self.iter(tag).into_iter().next()
    }

    /// Set `key` on every node with `tag`. Returns how many nodes changed.
    pub fn set(&mut self, tag: &str, key: &str, value: impl ToString) -> usize {
        let value = value.to_string();
        let mut count = 0;
        self.root.for_each_mut(tag, &mut |node| {
            node.attrs.insert(key.to_string(), value.clone());
            count += 1;
        });
        count
    }

    /// Set the `value` attribute on every node with `tag`.
    pub fn set_value(&mut self, tag: &str, value: impl ToString) -> usize {
        self.set(tag, VALUE, value)
    }

    /// Append a copy of `child` to every node with `tag`.
    pub fn append(&mut self, tag: &str, child: &DocNode) -> usize {
        let mut count = 0;
        self.root.for_each_mut(tag, &mut |node| {
            node.children.push(child.clone());
            count += 1;
        });
        count
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write table document {}", path.display()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read table document {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid table document {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> TableDocument {
        let mut doc = TableDocument::new();
        doc.push_table(
            DocNode::new("OS_2")
                .with_child(DocNode::leaf("xAvgCharWidth", 1000))
                .with_child(DocNode::new("panose").with_child(DocNode::leaf("bWeight", 6))),
        );
        doc.push_table(DocNode::new("post").with_child(DocNode::leaf("isFixedPitch", 1)));
        doc
    }

    #[test]
    fn set_reaches_nested_nodes() {
        let mut doc = sample();
        assert_eq!(doc.set_value("bWeight", 8), 1);
        assert_eq!(doc.find("bWeight").unwrap().value(), Some("8"));
        assert_eq!(doc.set_value("missing", 1), 0);
    }

    #[test]
    fn append_adds_to_every_match() {
        let mut doc = sample();
        let child = DocNode::new("map").with_attr("code", "0xf101");
        assert_eq!(doc.append("OS_2", &child), 1);
        assert_eq!(doc.iter("map").len(), 1);
    }

    #[test]
    fn json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let doc = sample();
        doc.save(&path).unwrap();
        assert_eq!(TableDocument::load(&path).unwrap(), doc);
    }
}

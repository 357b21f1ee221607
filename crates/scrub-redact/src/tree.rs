//! Tree model shared by the normalizer, engine and renderer.
//!
//! A tree node is a `serde_json::Value`: scalars (string, number, bool,
//! null), sequences and mappings. Mappings keep insertion order (the
//! `preserve_order` feature), which is what makes rendering stable.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tree node.
pub type Tree = Value;

/// An ordered mapping node.
pub type Mapping = serde_json::Map<String, Value>;

/// Coarse shape of a node, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Null,
    Bool,
    Number,
    String,
    Sequence,
    Mapping,
}

impl NodeKind {
    /// Classify a node.
    pub fn of(node: &Tree) -> Self {
        match node {
            Value::Null => NodeKind::Null,
            Value::Bool(_) => NodeKind::Bool,
            Value::Number(_) => NodeKind::Number,
            Value::String(_) => NodeKind::String,
            Value::Array(_) => NodeKind::Sequence,
            Value::Object(_) => NodeKind::Mapping,
        }
    }

    /// Sequences and mappings are structured; everything else is a scalar.
    pub fn is_structured(&self) -> bool {
        matches!(self, NodeKind::Sequence | NodeKind::Mapping)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NodeKind::Null => "null",
            NodeKind::Bool => "bool",
            NodeKind::Number => "number",
            NodeKind::String => "string",
            NodeKind::Sequence => "sequence",
            NodeKind::Mapping => "mapping",
        };
        write!(f, "{}", s)
    }
}

/// Data handed to the engine at a capture boundary.
///
/// Raw bodies arrive as bytes or text and may or may not hold a serialized
/// tree; callers that already hold structured data pass a `Tree`.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Bytes(Vec<u8>),
    Text(String),
    Tree(Tree),
}

impl Payload {
    /// Returns the tree if this payload is structured data.
    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            Payload::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    /// Returns whether this payload holds a mapping or a sequence.
    pub fn is_structured(&self) -> bool {
        self.as_tree()
            .map(|tree| NodeKind::of(tree).is_structured())
            .unwrap_or(false)
    }
}

impl From<Tree> for Payload {
    fn from(tree: Tree) -> Self {
        Payload::Tree(tree)
    }
}

impl From<&Tree> for Payload {
    fn from(tree: &Tree) -> Self {
        Payload::Tree(tree.clone())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Bytes(bytes)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Payload::Bytes(bytes.to_vec())
    }
}

/// Visit every string scalar in the tree (mapping values and sequence
/// elements, not keys), descending at most `max_depth` containers.
///
/// Returns `false` if some part of the tree was deeper than `max_depth`
/// and was skipped.
pub fn for_each_string_mut<F>(node: &mut Tree, max_depth: usize, f: &mut F) -> bool
where
    F: FnMut(&mut String),
{
    match node {
        Value::String(s) => {
            f(s);
            true
        }
        Value::Array(_) | Value::Object(_) if max_depth == 0 => false,
        Value::Array(items) => {
            let mut complete = true;
            for item in items {
                complete &= for_each_string_mut(item, max_depth - 1, f);
            }
            complete
        }
        Value::Object(map) => {
            let mut complete = true;
            for value in map.values_mut() {
                complete &= for_each_string_mut(value, max_depth - 1, f);
            }
            complete
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_kind() {
        assert_eq!(NodeKind::of(&json!(null)), NodeKind::Null);
        assert_eq!(NodeKind::of(&json!(1)), NodeKind::Number);
        assert_eq!(NodeKind::of(&json!("x")), NodeKind::String);
        assert_eq!(NodeKind::of(&json!([1])), NodeKind::Sequence);
        assert_eq!(NodeKind::of(&json!({"a": 1})), NodeKind::Mapping);
        assert!(NodeKind::Mapping.is_structured());
        assert!(!NodeKind::Bool.is_structured());
    }

    #[test]
    fn test_payload_structured() {
        assert!(Payload::from(json!({"a": 1})).is_structured());
        assert!(!Payload::from(json!("a")).is_structured());
        assert!(!Payload::from("{\"a\": 1}").is_structured());
    }

    #[test]
    fn test_for_each_string_skips_keys() {
        let mut tree = json!({"k": ["a", {"k2": "b"}], "n": 3});
        let mut seen = Vec::new();
        let complete = for_each_string_mut(&mut tree, 8, &mut |s: &mut String| {
            seen.push(s.clone());
            s.push('!');
        });
        assert!(complete);
        assert_eq!(seen, vec!["a", "b"]);
        assert_eq!(tree, json!({"k": ["a!", {"k2": "b!"}], "n": 3}));
    }

    #[test]
    fn test_for_each_string_depth_limit() {
        let mut tree = json!({"a": "x", "b": {"c": ["y"]}});
        let mut seen = Vec::new();
        let complete = for_each_string_mut(&mut tree, 2, &mut |s: &mut String| seen.push(s.clone()));
        assert!(!complete);
        assert_eq!(seen, vec!["x"]);
    }
}

//! In-memory document model
//!
//! A document is a tree of mappings, sequences and scalar leaves. Templates
//! navigate it through the accessors defined here; nothing in this module
//! mutates a node once it is built.

mod error;
mod load;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset};

pub use error::AccessError;
pub use load::LoadError;

/// A leaf value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Timestamp(DateTime<FixedOffset>),
}

impl Scalar {
    /// Name of the scalar kind, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Scalar::String(_) => "string",
            Scalar::Int(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::Bool(_) => "boolean",
            Scalar::Timestamp(_) => "timestamp",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => f.write_str(s),
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Timestamp(ts) => f.write_str(&ts.to_rfc3339()),
        }
    }
}

/// A node of a hierarchical document
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Mapping(BTreeMap<String, Node>),
    Sequence(Vec<Node>),
    Scalar(Scalar),
    Null,
}

impl Node {
    /// Build a mapping node from key/value pairs
    pub fn mapping<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Node)>,
    {
        Node::Mapping(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a sequence node
    pub fn sequence(items: impl IntoIterator<Item = Node>) -> Self {
        Node::Sequence(items.into_iter().collect())
    }

    /// Name of the node kind, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Mapping(_) => "mapping",
            Node::Sequence(_) => "sequence",
            Node::Scalar(s) => s.kind_name(),
            Node::Null => "null",
        }
    }

    /// Look up `name` in a mapping
    pub fn get_field(&self, name: &str) -> Result<&Node, AccessError> {
        match self {
            Node::Mapping(entries) => entries.get(name).ok_or_else(|| AccessError::MissingField {
                field: name.to_string(),
            }),
            other => Err(AccessError::NotAMapping {
                field: name.to_string(),
                found: other.kind_name(),
            }),
        }
    }

    /// Look up position `index` in a sequence
    pub fn get_index(&self, index: i64) -> Result<&Node, AccessError> {
        match self {
            Node::Sequence(items) => usize::try_from(index)
                .ok()
                .and_then(|i| items.get(i))
                .ok_or(AccessError::IndexOutOfRange {
                    index,
                    len: items.len(),
                }),
            other => Err(AccessError::NotASequence {
                index,
                found: other.kind_name(),
            }),
        }
    }

    pub fn as_scalar(&self) -> Result<&Scalar, AccessError> {
        match self {
            Node::Scalar(s) => Ok(s),
            other => Err(AccessError::NotAScalar {
                found: other.kind_name(),
            }),
        }
    }

    /// Boolean value of the node, if it is a boolean scalar
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Structural equality used by `eq` and `ne`
    ///
    /// Scalars are equal only when both kind and value match. Composite and
    /// null operands are rejected.
    pub fn structural_eq(&self, other: &Node) -> Result<bool, AccessError> {
        Ok(self.as_scalar()? == other.as_scalar()?)
    }
}

impl From<Scalar> for Node {
    fn from(scalar: Scalar) -> Self {
        Node::Scalar(scalar)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Scalar(Scalar::String(s))
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::Scalar(Scalar::Int(n))
    }
}

impl From<f64> for Node {
    fn from(x: f64) -> Self {
        Node::Scalar(Scalar::Float(x))
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Scalar(Scalar::Bool(b))
    }
}

impl From<DateTime<FixedOffset>> for Node {
    fn from(ts: DateTime<FixedOffset>) -> Self {
        Node::Scalar(Scalar::Timestamp(ts))
    }
}

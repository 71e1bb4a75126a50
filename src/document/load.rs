//! Building documents from JSON and TOML sources

use std::path::Path;

use chrono::DateTime;
use thiserror::Error;

use super::{Node, Scalar};

/// Errors that can occur when loading a document
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read document file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse document JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Failed to parse document TOML: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Unsupported document format '{0}' (expected .json or .toml)")]
    UnsupportedFormat(String),
}

impl Node {
    /// Load a document from a `.json` or `.toml` file
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let content = std::fs::read_to_string(path)?;
        match extension.as_str() {
            "json" => Self::from_json_str(&content),
            "toml" => Self::from_toml_str(&content),
            other => Err(LoadError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, LoadError> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        Ok(value.into())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, LoadError> {
        let table: toml::Table = toml::from_str(content)?;
        Ok(toml::Value::Table(table).into())
    }

    /// JSON view of the node, used when a composite value is printed
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            Node::Mapping(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Node::Sequence(items) => Value::Array(items.iter().map(Node::to_json).collect()),
            Node::Scalar(Scalar::String(s)) => Value::String(s.clone()),
            Node::Scalar(Scalar::Int(n)) => Value::from(*n),
            // Non-finite floats have no JSON form
            Node::Scalar(Scalar::Float(x)) => Value::from(*x),
            Node::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            Node::Scalar(Scalar::Timestamp(ts)) => Value::String(ts.to_rfc3339()),
            Node::Null => Value::Null,
        }
    }
}

impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Node::Scalar(Scalar::Int(i)),
                // u64 beyond i64::MAX and real numbers
                None => Node::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            Value::String(s) => Node::Scalar(Scalar::String(s)),
            Value::Array(items) => Node::Sequence(items.into_iter().map(Node::from).collect()),
            Value::Object(entries) => {
                Node::Mapping(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<toml::Value> for Node {
    fn from(value: toml::Value) -> Self {
        use toml::Value;

        match value {
            Value::String(s) => Node::Scalar(Scalar::String(s)),
            Value::Integer(i) => Node::Scalar(Scalar::Int(i)),
            Value::Float(x) => Node::Scalar(Scalar::Float(x)),
            Value::Boolean(b) => Node::Scalar(Scalar::Bool(b)),
            // Local dates and times carry no offset; keep them as text
            Value::Datetime(dt) => {
                let text = dt.to_string();
                match DateTime::parse_from_rfc3339(&text) {
                    Ok(ts) => Node::Scalar(Scalar::Timestamp(ts)),
                    Err(_) => Node::Scalar(Scalar::String(text)),
                }
            }
            Value::Array(items) => Node::Sequence(items.into_iter().map(Node::from).collect()),
            Value::Table(entries) => {
                Node::Mapping(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

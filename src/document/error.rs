//! Errors raised by document accessors

use thiserror::Error;

/// Failure of a single document lookup
///
/// Accessors know nothing about templates, so these carry no span or path.
/// The evaluator wraps them with that context.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccessError {
    /// Mapping has no entry for the requested key
    #[error("field '{field}' not found")]
    MissingField { field: String },

    /// Field lookup on something that is not a mapping
    #[error("cannot read field '{field}' of {found} value")]
    NotAMapping { field: String, found: &'static str },

    /// Index outside `[0, len)`
    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    /// Positional lookup on something that is not a sequence
    #[error("cannot index {found} value with {index}")]
    NotASequence { index: i64, found: &'static str },

    /// Scalar required but a composite or null was supplied
    #[error("expected scalar, found {found}")]
    NotAScalar { found: &'static str },
}

//! Error types for template evaluation

use thiserror::Error;

use crate::document::AccessError;
use crate::error::{diagnostic, ErrorKind};
use crate::parser::ast::Span;

/// Errors that can occur while evaluating a template against a document
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A document lookup failed; `path` names the expression being resolved
    #[error("{path}: {source}")]
    Access {
        path: String,
        source: AccessError,
        span: Span,
    },

    /// A value of the wrong kind reached an operation
    #[error("{context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: &'static str,
        found: &'static str,
        span: Span,
    },

    /// Read of, or assignment to, a variable that was never declared
    #[error("undefined variable '{name}'")]
    UndefinedVariable { name: String, span: Span },
}

impl EvalError {
    /// Create a type mismatch error
    pub fn mismatch(
        context: impl Into<String>,
        expected: &'static str,
        found: &'static str,
        span: Span,
    ) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected,
            found,
            span,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::Access { source, .. } => match source {
                AccessError::MissingField { .. } | AccessError::NotAMapping { .. } => {
                    ErrorKind::FieldNotFound
                }
                AccessError::IndexOutOfRange { .. } | AccessError::NotASequence { .. } => {
                    ErrorKind::IndexOutOfRange
                }
                AccessError::NotAScalar { .. } => ErrorKind::TypeMismatch,
            },
            EvalError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            EvalError::UndefinedVariable { .. } => ErrorKind::UndefinedVariable,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            EvalError::Access { span, .. }
            | EvalError::TypeMismatch { span, .. }
            | EvalError::UndefinedVariable { span, .. } => span.clone(),
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let message = format!("{}: {}", self.kind(), self);
        let label = match self {
            EvalError::Access { source, .. } => source.to_string(),
            EvalError::TypeMismatch {
                expected, found, ..
            } => format!("this is {}, not {}", found, expected),
            EvalError::UndefinedVariable { .. } => "declare it first with ':='".to_string(),
        };
        diagnostic(source, filename, self.span(), &message, &label)
    }
}

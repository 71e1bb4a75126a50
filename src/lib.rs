//! Doc Template - text templates evaluated against structured documents
//!
//! This library provides a parser, evaluator, and renderer for a small
//! template language that reads mappings, sequences and scalars out of a
//! document and produces plain text.
//!
//! # Example
//!
//! ```rust
//! use doc_template::{render, Node};
//!
//! let doc = Node::mapping([("spec", Node::mapping([("replicas", Node::from(2_i64))]))]);
//! let text = render(&doc, "replicas: {{ .spec.replicas }}").unwrap();
//! assert_eq!(text, "replicas: 2");
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod eval;
pub mod parser;
pub mod renderer;

pub use config::{ConfigError, Delimiters, RenderConfig};
pub use document::{AccessError, LoadError, Node, Scalar};
pub use error::{ErrorKind, ParseError};
pub use eval::EvalError;
pub use parser::{parse, parse_with_config, Template};

use thiserror::Error;
use tracing::debug;

use crate::parser::ast::Span;

/// Errors that can occur during the render pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// Malformed template, detected before the document is read
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// Document or variable mismatch found while evaluating
    #[error("{0}")]
    Eval(#[from] EvalError),
}

impl RenderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RenderError::Parse(e) => e.kind(),
            RenderError::Eval(e) => e.kind(),
        }
    }

    /// Location in the template that triggered the failure
    pub fn span(&self) -> Span {
        match self {
            RenderError::Parse(e) => e.span(),
            RenderError::Eval(e) => e.span(),
        }
    }

    /// Human-readable detail: the path, variable or token involved
    pub fn detail(&self) -> String {
        self.to_string()
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        match self {
            RenderError::Parse(e) => e.format(source, filename),
            RenderError::Eval(e) => e.format(source, filename),
        }
    }
}

/// Render a template against a document with the default configuration
///
/// This is the main entry point for the library. It parses the template,
/// then evaluates it against the document. The first failure is returned;
/// there is no partial output.
///
/// # Example
///
/// ```rust
/// use doc_template::{render, ErrorKind, Node};
///
/// let doc = Node::mapping([("name", Node::from("web"))]);
/// assert_eq!(render(&doc, "{{ .name }}").unwrap(), "web");
///
/// let err = render(&doc, "{{ .image }}").unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::FieldNotFound);
/// ```
pub fn render(document: &Node, template: &str) -> Result<String, RenderError> {
    render_with_config(document, template, &RenderConfig::default())
}

/// Render a template with custom delimiters or nesting limit
///
/// # Example
///
/// ```rust
/// use doc_template::{render_with_config, Node, RenderConfig};
///
/// let config = RenderConfig::new().with_delimiters("<%", "%>");
/// let doc = Node::mapping([("port", Node::from(8080_i64))]);
/// let text = render_with_config(&doc, "port=<% .port %>", &config).unwrap();
/// assert_eq!(text, "port=8080");
/// ```
pub fn render_with_config(
    document: &Node,
    template: &str,
    config: &RenderConfig,
) -> Result<String, RenderError> {
    let parsed = parse_with_config(template, config)?;
    let output = parsed.render(document)?;
    debug!(
        template_len = template.len(),
        output_len = output.len(),
        "rendered template"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc() -> Node {
        Node::mapping([
            ("name", Node::from("web")),
            (
                "ports",
                Node::sequence([Node::from(80_i64), Node::from(443_i64)]),
            ),
        ])
    }

    #[test]
    fn test_render_text_only() {
        assert_eq!(render(&doc(), "plain text").unwrap(), "plain text");
        assert_eq!(render(&doc(), "").unwrap(), "");
    }

    #[test]
    fn test_render_field() {
        assert_eq!(render(&doc(), "name={{ .name }}").unwrap(), "name=web");
    }

    #[test]
    fn test_render_range() {
        let out = render(&doc(), "{{ range .ports }}[{{ . }}]{{ end }}").unwrap();
        assert_eq!(out, "[80][443]");
    }

    #[test]
    fn test_parse_error_kind() {
        let err = render(&doc(), "{{ range .ports }}").unwrap_err();
        assert!(matches!(err, RenderError::Parse(_)));
        assert_eq!(err.kind(), ErrorKind::UnterminatedBlock);
        assert_eq!(err.span(), 0..18);
    }

    #[test]
    fn test_eval_error_kind() {
        let err = render(&doc(), "{{ index .ports 2 }}").unwrap_err();
        assert!(matches!(err, RenderError::Eval(_)));
        assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
        assert_eq!(
            err.detail(),
            ".ports[2]: index 2 out of range for sequence of length 2"
        );
    }

    #[test]
    fn test_syntax_error_before_document_access() {
        // The missing field would fail too, but parsing fails first
        let err = render(&Node::Null, "{{ .missing }}{{ end }}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEnd);
    }

    #[test]
    fn test_render_with_custom_delimiters() {
        let config = RenderConfig::new().with_delimiters("[[", "]]");
        let out = render_with_config(&doc(), "{{ [[ .name ]] }}", &config).unwrap();
        assert_eq!(out, "{{ web }}");
    }

    #[test]
    fn test_format_points_at_span() {
        let source = "{{ .nope }}";
        let err = render(&doc(), source).unwrap_err();
        let report = err.format(source, "inline");
        assert!(report.contains("FieldNotFound"));
        assert!(report.contains("inline"));
    }

    #[test]
    fn test_format_label_after_multibyte_text() {
        // Same layout, but 'ü' takes two bytes
        let wide = "ü {{ .nope }}";
        let narrow = "u {{ .nope }}";
        let wide_err = render(&doc(), wide).unwrap_err();
        let narrow_err = render(&doc(), narrow).unwrap_err();
        assert_eq!(wide_err.span(), 6..11);
        assert_eq!(&wide[wide_err.span()], ".nope");
        assert_eq!(narrow_err.span(), 5..10);

        let wide_report = wide_err.format(wide, "t");
        let narrow_report = narrow_err.format(narrow, "t");
        assert_eq!(wide_report.replace('ü', "u"), narrow_report);
    }

    #[test]
    fn test_nesting_limit_is_capped() {
        let config = RenderConfig::new().with_max_nesting(config::MAX_NESTING_LIMIT + 1);
        let err = render_with_config(&doc(), "{{ .name }}", &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
    }

    #[test]
    fn test_shared_across_threads() {
        fn is_send_sync<T: Send + Sync>() {}
        is_send_sync::<Template>();
        is_send_sync::<Node>();
        is_send_sync::<RenderError>();

        let template = Template::parse("{{ .name }}").unwrap();
        let document = doc();
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| template.render(&document)))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap().unwrap(), "web");
            }
        });
    }
}

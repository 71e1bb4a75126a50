//! Assembles scanned text and parsed actions into a block tree
//!
//! Blocks are matched in one left-to-right pass using an explicit stack of
//! open `if`/`range` frames; `end` always closes the innermost one.

use tracing::debug;

use crate::config::RenderConfig;
use crate::error::ParseError;
use crate::parser::ast::*;
use crate::parser::grammar::{parse_action, Action};
use crate::parser::scanner::{scan, Piece};

type Body = Vec<Spanned<TemplateNode>>;

#[derive(Debug)]
enum FrameKind {
    If(Spanned<Expr>),
    Range {
        index_var: Option<Spanned<Identifier>>,
        value_var: Option<Spanned<Identifier>>,
        source: Spanned<Expr>,
    },
}

/// An open block waiting for its `end`
#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    /// Span of the opening action
    span: Span,
    body: Body,
    else_body: Option<Body>,
    /// Opened by `else if`; closed by the same `end` as its parent
    chained: bool,
}

impl Frame {
    fn new(kind: FrameKind, span: Span) -> Self {
        Self {
            kind,
            span,
            body: Vec::new(),
            else_body: None,
            chained: false,
        }
    }

    fn keyword(&self) -> &'static str {
        match self.kind {
            FrameKind::If(_) => "if",
            FrameKind::Range { .. } => "range",
        }
    }

    fn target(&mut self) -> &mut Body {
        match &mut self.else_body {
            Some(body) => body,
            None => &mut self.body,
        }
    }

    fn close(self, end: usize) -> Spanned<TemplateNode> {
        let node = match self.kind {
            FrameKind::If(test) => TemplateNode::If(IfBlock {
                test,
                then_body: self.body,
                else_body: self.else_body,
            }),
            FrameKind::Range {
                index_var,
                value_var,
                source,
            } => TemplateNode::Range(RangeBlock {
                index_var,
                value_var,
                source,
                body: self.body,
                else_body: self.else_body,
            }),
        };
        Spanned::new(node, self.span.start..end)
    }
}

fn push(root: &mut Body, stack: &mut [Frame], node: Spanned<TemplateNode>) {
    match stack.last_mut() {
        Some(frame) => frame.target().push(node),
        None => root.push(node),
    }
}

fn open(stack: &mut Vec<Frame>, frame: Frame, max_nesting: usize) -> Result<(), ParseError> {
    if stack.len() >= max_nesting {
        return Err(ParseError::syntax(
            frame.span,
            format!("blocks nested deeper than {}", max_nesting),
        ));
    }
    stack.push(frame);
    Ok(())
}

/// Start the else branch of the innermost block
fn begin_else<'f>(stack: &'f mut [Frame], span: &Span) -> Result<&'f mut Frame, ParseError> {
    let Some(frame) = stack.last_mut() else {
        return Err(ParseError::syntax(
            span.clone(),
            "'else' outside of an 'if' or 'range' block",
        ));
    };
    if frame.else_body.is_some() {
        return Err(ParseError::syntax(
            span.clone(),
            format!("'{}' block already has an 'else'", frame.keyword()),
        ));
    }
    frame.else_body = Some(Vec::new());
    Ok(frame)
}

/// Parse a template into its block tree
pub fn build(source: &str, config: &RenderConfig) -> Result<Template, ParseError> {
    if let Err(err) = config.validate() {
        return Err(ParseError::syntax(0..0, err.to_string()));
    }

    let mut root: Body = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for piece in scan(source, &config.delimiters)? {
        let (body, body_start, span) = match piece {
            Piece::Text { text, span } => {
                push(
                    &mut root,
                    &mut stack,
                    Spanned::new(TemplateNode::Text(text.to_string()), span),
                );
                continue;
            }
            Piece::Action {
                body,
                body_start,
                span,
            } => (body, body_start, span),
        };

        match parse_action(body, body_start, span.clone(), config.max_nesting)? {
            Action::If(test) => {
                open(&mut stack, Frame::new(FrameKind::If(test), span), config.max_nesting)?;
            }
            Action::Range {
                index_var,
                value_var,
                source,
            } => {
                let kind = FrameKind::Range {
                    index_var,
                    value_var,
                    source,
                };
                open(&mut stack, Frame::new(kind, span), config.max_nesting)?;
            }
            Action::ElseIf(test) => {
                let parent = begin_else(&mut stack, &span)?;
                if !matches!(parent.kind, FrameKind::If(_)) {
                    return Err(ParseError::syntax(span, "'else if' is only valid inside 'if'"));
                }
                let mut frame = Frame::new(FrameKind::If(test), span);
                frame.chained = true;
                open(&mut stack, frame, config.max_nesting)?;
            }
            Action::Else => {
                begin_else(&mut stack, &span)?;
            }
            Action::End => {
                let Some(mut frame) = stack.pop() else {
                    return Err(ParseError::UnexpectedEnd { span });
                };
                // Closing an `else if` also closes every frame it was chained to
                loop {
                    let chained = frame.chained;
                    let node = frame.close(span.end);
                    push(&mut root, &mut stack, node);
                    if !chained {
                        break;
                    }
                    match stack.pop() {
                        Some(parent) => frame = parent,
                        None => break,
                    }
                }
            }
            Action::Declare { name, value } => {
                push(
                    &mut root,
                    &mut stack,
                    Spanned::new(TemplateNode::Declare { name, value }, span),
                );
            }
            Action::Assign { name, value } => {
                push(
                    &mut root,
                    &mut stack,
                    Spanned::new(TemplateNode::Assign { name, value }, span),
                );
            }
            Action::Output(expr) => {
                push(&mut root, &mut stack, Spanned::new(TemplateNode::Output(expr), span));
            }
        }
    }

    // Report the outermost block of an unfinished else-if chain
    if let Some(frame) = stack.iter().rev().find(|f| !f.chained) {
        return Err(ParseError::UnterminatedBlock {
            keyword: frame.keyword(),
            span: frame.span.clone(),
        });
    }

    debug!(nodes = root.len(), "parsed template");
    Ok(Template { nodes: root })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn build_default(source: &str) -> Result<Template, ParseError> {
        build(source, &RenderConfig::default())
    }

    #[test]
    fn test_text_and_output() {
        let template = build_default("replicas: {{ .spec.replicas }}").unwrap();
        assert_eq!(template.nodes.len(), 2);
        assert_eq!(
            template.nodes[0].node,
            TemplateNode::Text("replicas: ".to_string())
        );
        assert!(matches!(template.nodes[1].node, TemplateNode::Output(_)));
        assert_eq!(template.nodes[1].span, 10..30);
    }

    #[test]
    fn test_range_with_nested_if() {
        let template = build_default(
            "{{ range .items }}{{ if .ok }}y{{ else }}n{{ end }}{{ end }}after",
        )
        .unwrap();
        assert_eq!(template.nodes.len(), 2);
        match &template.nodes[0].node {
            TemplateNode::Range(range) => {
                assert_eq!(range.body.len(), 1);
                assert!(range.else_body.is_none());
                match &range.body[0].node {
                    TemplateNode::If(block) => {
                        assert_eq!(block.then_body.len(), 1);
                        assert_eq!(block.else_body.as_ref().map(Vec::len), Some(1));
                    }
                    other => panic!("Expected if, got {:?}", other),
                }
            }
            other => panic!("Expected range, got {:?}", other),
        }
        assert_eq!(template.nodes[1].node, TemplateNode::Text("after".into()));
    }

    #[test]
    fn test_block_span_covers_end() {
        let source = "{{ if true }}x{{ end }}";
        let template = build_default(source).unwrap();
        assert_eq!(template.nodes[0].span, 0..source.len());
    }

    #[test]
    fn test_else_if_chain() {
        let template = build_default(
            "{{ if .a }}A{{ else if .b }}B{{ else }}C{{ end }}!",
        )
        .unwrap();
        assert_eq!(template.nodes.len(), 2);
        match &template.nodes[0].node {
            TemplateNode::If(outer) => {
                let else_body = outer.else_body.as_ref().expect("else branch");
                assert_eq!(else_body.len(), 1);
                match &else_body[0].node {
                    TemplateNode::If(inner) => {
                        assert_eq!(inner.then_body[0].node, TemplateNode::Text("B".into()));
                        assert!(inner.else_body.is_some());
                    }
                    other => panic!("Expected nested if, got {:?}", other),
                }
            }
            other => panic!("Expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_range_else() {
        let template = build_default("{{ range .xs }}x{{ else }}none{{ end }}").unwrap();
        match &template.nodes[0].node {
            TemplateNode::Range(range) => assert!(range.else_body.is_some()),
            other => panic!("Expected range, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_range() {
        let err = build_default("a{{ range .items }}{{ . }}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnterminatedBlock);
        assert_eq!(
            err,
            ParseError::UnterminatedBlock {
                keyword: "range",
                span: 1..19
            }
        );
    }

    #[test]
    fn test_unterminated_else_if_reports_outer_if() {
        let err = build_default("{{ if .a }}{{ else if .b }}").unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnterminatedBlock {
                keyword: "if",
                span
            } if span == (0..11)
        ));
    }

    #[test]
    fn test_unexpected_end() {
        let err = build_default("x{{ end }}").unwrap_err();
        assert_eq!(err, ParseError::UnexpectedEnd { span: 1..10 });
    }

    #[test]
    fn test_else_outside_block() {
        let err = build_default("{{ else }}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
    }

    #[test]
    fn test_double_else() {
        let err = build_default("{{ if true }}{{ else }}{{ else }}{{ end }}").unwrap_err();
        assert!(err.to_string().contains("already has an 'else'"));
    }

    #[test]
    fn test_else_if_inside_range_rejected() {
        let err = build_default("{{ range .a }}{{ else if .b }}{{ end }}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
    }

    #[test]
    fn test_nesting_limit() {
        let config = RenderConfig::new().with_max_nesting(2);
        let ok = "{{ if true }}{{ if true }}{{ end }}{{ end }}";
        assert!(build(ok, &config).is_ok());
        let deep = "{{ if true }}{{ if true }}{{ if true }}{{ end }}{{ end }}{{ end }}";
        let err = build(deep, &config).unwrap_err();
        assert!(err.to_string().contains("nested deeper than 2"));
    }

    #[test]
    fn test_syntax_error_before_unterminated() {
        let err = build_default("{{ range .a }}{{ bogus }}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RenderConfig::new().with_delimiters("", "}}");
        assert!(build("x", &config).is_err());
    }
}

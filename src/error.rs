//! Error types for parsing and shared diagnostic formatting

use std::fmt;

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::ast::Span;
use crate::parser::lexer::Token;

/// Failure categories reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FieldNotFound,
    IndexOutOfRange,
    TypeMismatch,
    UndefinedVariable,
    SyntaxError,
    UnterminatedBlock,
    UnexpectedEnd,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::FieldNotFound => "FieldNotFound",
            ErrorKind::IndexOutOfRange => "IndexOutOfRange",
            ErrorKind::TypeMismatch => "TypeMismatch",
            ErrorKind::UndefinedVariable => "UndefinedVariable",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::UnterminatedBlock => "UnterminatedBlock",
            ErrorKind::UnexpectedEnd => "UnexpectedEnd",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },

    #[error("unterminated '{keyword}' block opened at {span:?}")]
    UnterminatedBlock { keyword: &'static str, span: Span },

    #[error("'end' at {span:?} has no open block")]
    UnexpectedEnd { span: Span },
}

impl ParseError {
    /// Create a syntax error without an expected-token list
    pub fn syntax(span: Span, message: impl Into<String>) -> Self {
        Self::Syntax {
            span,
            message: message.into(),
            expected: Vec::new(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::Syntax { .. } => ErrorKind::SyntaxError,
            ParseError::UnterminatedBlock { .. } => ErrorKind::UnterminatedBlock,
            ParseError::UnexpectedEnd { .. } => ErrorKind::UnexpectedEnd,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ParseError::Syntax { span, .. }
            | ParseError::UnterminatedBlock { span, .. }
            | ParseError::UnexpectedEnd { span } => span.clone(),
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        match self {
            ParseError::Syntax {
                span,
                message,
                expected,
            } => {
                let label = if expected.is_empty() {
                    message.clone()
                } else {
                    format!("{}\nExpected: {}", message, expected.join(", "))
                };
                let title = format!("{}: {}", self.kind(), message);
                diagnostic(source, filename, span.clone(), &title, &label)
            }
            ParseError::UnterminatedBlock { keyword, span } => diagnostic(
                source,
                filename,
                span.clone(),
                &format!("{}: unterminated '{}' block", self.kind(), keyword),
                "this block has no matching 'end'",
            ),
            ParseError::UnexpectedEnd { span } => diagnostic(
                source,
                filename,
                span.clone(),
                &format!("{}: unexpected 'end'", self.kind()),
                "no open 'if' or 'range' to close",
            ),
        }
    }
}

/// Render a single-label ariadne report
///
/// Spans are byte offsets into `source`.
pub(crate) fn diagnostic(
    source: &str,
    filename: &str,
    span: Span,
    message: &str,
    label: &str,
) -> String {
    let mut buf = Vec::new();
    let written = Report::build(ReportKind::Error, filename, span.start)
        .with_config(Config::default().with_index_type(IndexType::Byte))
        .with_message(message)
        .with_label(
            Label::new((filename, span))
                .with_message(label)
                .with_color(Color::Red),
        )
        .finish()
        .write((filename, Source::from(source)), &mut buf);
    match written {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => message.to_string(),
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        use chumsky::error::{RichPattern, RichReason};

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of action".to_string(),
                };
                format!("Unexpected {}", found_str)
            }
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                RichPattern::Token(tok) => Some(format_token(tok)),
                RichPattern::Label(label) => Some(label.to_string()),
                RichPattern::EndOfInput => Some("end of action".to_string()),
                RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                RichPattern::Any => Some("any token".to_string()),
                RichPattern::SomethingElse => None,
            })
            .collect();

        ParseError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::If => "keyword 'if'".to_string(),
        Token::Else => "keyword 'else'".to_string(),
        Token::End => "keyword 'end'".to_string(),
        Token::Range => "keyword 'range'".to_string(),
        Token::Index => "function 'index'".to_string(),
        Token::And => "function 'and'".to_string(),
        Token::Or => "function 'or'".to_string(),
        Token::Not => "function 'not'".to_string(),
        Token::Eq => "function 'eq'".to_string(),
        Token::Ne => "function 'ne'".to_string(),
        Token::True => "'true'".to_string(),
        Token::False => "'false'".to_string(),
        Token::Declare => "':='".to_string(),
        Token::Assign => "'='".to_string(),
        Token::Comma => "','".to_string(),
        Token::ParenOpen => "'('".to_string(),
        Token::ParenClose => "')'".to_string(),
        Token::ParenCloseChain(path) => format!("')' followed by '.{}'", path.join(".")),
        Token::Dot => "'.'".to_string(),
        Token::Field(path) => format!("field '.{}'", path.join(".")),
        Token::Variable(var) if var.path.is_empty() => format!("variable '{}'", var.name),
        Token::Variable(var) => format!("variable '{}.{}'", var.name, var.path.join(".")),
        Token::String(s) => format!("string \"{}\"", s),
        Token::Int(n) => format!("number {}", n),
        Token::Float(x) => format!("number {}", x),
        Token::Ident(s) => format!("identifier '{}'", s),
    }
}

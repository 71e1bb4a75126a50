//! Lexer for template actions using logos
//!
//! Only the text between the open and close markers goes through this lexer;
//! literal template text is split off earlier by the scanner.

use logos::Logos;

use crate::error::ParseError;
use crate::parser::ast::Span;

/// A `$name` reference with an optional trailing field chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableToken {
    /// Variable name including the `$` sigil; the root variable is just `$`
    pub name: String,
    pub path: Vec<String>,
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // Control keywords
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("end")]
    End,
    #[token("range")]
    Range,

    // Builtin functions
    #[token("index")]
    Index,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("eq")]
    Eq,
    #[token("ne")]
    Ne,

    // Boolean literals
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Operators and delimiters
    #[token(":=")]
    Declare,
    #[token("=")]
    Assign,
    #[token(",")]
    Comma,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,

    /// `)` immediately followed by a field chain, as in `(index .items 0).name`
    #[regex(r"\)(\.[a-zA-Z_][a-zA-Z0-9_]*)+", |lex| split_chain(&lex.slice()[1..]))]
    ParenCloseChain(Vec<String>),

    /// The current value `.`
    #[token(".")]
    Dot,

    /// A field chain rooted at the current value, as in `.spec.replicas`
    #[regex(r"(\.[a-zA-Z_][a-zA-Z0-9_]*)+", |lex| split_chain(lex.slice()))]
    Field(Vec<String>),

    #[regex(r"\$[a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)*", |lex| variable(lex.slice()))]
    Variable(VariableToken),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    #[regex(r"`[^`]*`", |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    String(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"-?[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    /// Bare words are never valid; kept so errors can name them
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),
}

fn split_chain(slice: &str) -> Vec<String> {
    slice.split('.').skip(1).map(str::to_string).collect()
}

fn variable(slice: &str) -> VariableToken {
    let mut parts = slice.split('.');
    let name = parts.next().unwrap_or("$").to_string();
    VariableToken {
        name,
        path: parts.map(str::to_string).collect(),
    }
}

/// Strip quotes and resolve backslash escapes; unknown escapes are an error
fn unescape(slice: &str) -> Option<String> {
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            _ => return None,
        }
    }
    Some(out)
}

/// Lex an action body into tokens with spans
///
/// `offset` is the byte position of `input` inside the whole template, so the
/// returned spans point into the template rather than the action.
pub fn lex_action(input: &str, offset: usize) -> Result<Vec<(Token, Span)>, ParseError> {
    let mut tokens = Vec::new();
    for (tok, span) in Token::lexer(input).spanned() {
        let span = (span.start + offset)..(span.end + offset);
        match tok {
            Ok(Token::Ident(word)) => {
                return Err(ParseError::syntax(
                    span,
                    format!("unknown keyword '{}'", word),
                ));
            }
            Ok(tok) => tokens.push((tok, span)),
            Err(()) => {
                let text = &input[(span.start - offset)..(span.end - offset)];
                return Err(ParseError::syntax(
                    span,
                    format!("unexpected input '{}'", text),
                ));
            }
        }
    }
    Ok(tokens)
}

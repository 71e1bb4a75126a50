//! Splits template source into literal text and action windows
//!
//! Handles the delimiter pair, `{{- ` / ` -}}` trim markers and
//! `{{/* ... */}}` comments, so later stages only see literal text and
//! action bodies.

use crate::config::Delimiters;
use crate::error::ParseError;
use crate::parser::ast::Span;

/// A slice of the template produced by the scanner
#[derive(Debug, Clone, PartialEq)]
pub enum Piece<'s> {
    Text {
        text: &'s str,
        span: Span,
    },
    Action {
        /// Action body with delimiters, trim markers and outer whitespace removed
        body: &'s str,
        /// Byte offset of `body` in the template
        body_start: usize,
        /// Whole action including delimiters
        span: Span,
    },
}

pub fn scan<'s>(source: &'s str, delimiters: &Delimiters) -> Result<Vec<Piece<'s>>, ParseError> {
    let open = delimiters.open.as_str();
    let close = delimiters.close.as_str();
    let mut pieces = Vec::new();
    let mut cursor = 0usize;

    while cursor < source.len() {
        let Some(rel) = source[cursor..].find(open) else {
            push_text(&mut pieces, source, cursor, source.len());
            break;
        };
        let action_start = cursor + rel;
        push_text(&mut pieces, source, cursor, action_start);

        let mut inner_start = action_start + open.len();
        let trim_left = has_left_trim(&source[inner_start..]);
        if trim_left {
            inner_start += 1;
            trim_last_text(&mut pieces);
        }

        let is_comment = source[inner_start..].trim_start().starts_with("/*");
        let search_from = if is_comment {
            let comment_start = inner_start + (source[inner_start..].len()
                - source[inner_start..].trim_start().len());
            match source[comment_start + 2..].find("*/") {
                Some(rel_end) => comment_start + 2 + rel_end + 2,
                None => {
                    return Err(ParseError::syntax(
                        action_start..source.len(),
                        "unclosed comment",
                    ))
                }
            }
        } else {
            inner_start
        };

        let Some(close_at) = find_close(source, search_from, close) else {
            return Err(ParseError::syntax(
                action_start..source.len(),
                format!("unclosed action (missing '{}')", close),
            ));
        };
        let span = action_start..close_at + close.len();

        let mut inner_end = close_at;
        let trim_right = has_right_trim(&source[inner_start..inner_end]);
        if trim_right {
            inner_end -= 1;
        }

        if is_comment {
            if !source[search_from..inner_end].trim().is_empty() {
                return Err(ParseError::syntax(
                    span,
                    "comment must be the whole action",
                ));
            }
        } else {
            let raw = &source[inner_start..inner_end];
            let body = raw.trim();
            let body_start = inner_start + (raw.len() - raw.trim_start().len());
            pieces.push(Piece::Action {
                body,
                body_start,
                span: span.clone(),
            });
        }

        cursor = span.end;
        if trim_right {
            cursor += source[cursor..].len() - source[cursor..].trim_start().len();
        }
    }

    Ok(pieces)
}

fn push_text<'s>(pieces: &mut Vec<Piece<'s>>, source: &'s str, start: usize, end: usize) {
    if start < end {
        pieces.push(Piece::Text {
            text: &source[start..end],
            span: start..end,
        });
    }
}

fn trim_last_text(pieces: &mut Vec<Piece<'_>>) {
    if let Some(Piece::Text { text, span }) = pieces.last_mut() {
        let trimmed = text.trim_end();
        span.end = span.start + trimmed.len();
        *text = trimmed;
        if text.is_empty() {
            pieces.pop();
        }
    }
}

/// `{{- ` trims only when the dash is followed by whitespace, so `{{-3}}` stays a number
fn has_left_trim(after_open: &str) -> bool {
    let mut chars = after_open.chars();
    chars.next() == Some('-') && chars.next().is_some_and(char::is_whitespace)
}

fn has_right_trim(before_close: &str) -> bool {
    let mut chars = before_close.chars().rev();
    chars.next() == Some('-') && chars.next().is_some_and(char::is_whitespace)
}

/// Find the close delimiter, skipping over quoted strings
fn find_close(source: &str, from: usize, close: &str) -> Option<usize> {
    let bytes = source.as_bytes();
    let close = close.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = from;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(b'"') if b == b'\\' => {
                i += 2;
                continue;
            }
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if bytes[i..].starts_with(close) => return Some(i),
            None if b == b'"' || b == b'`' => quote = Some(b),
            None => {}
        }
        i += 1;
    }
    None
}

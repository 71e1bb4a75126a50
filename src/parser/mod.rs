//! Parser for the template language

pub mod ast;
mod builder;
mod grammar;
pub mod lexer;
mod scanner;

pub use ast::*;

use crate::config::RenderConfig;
use crate::error::ParseError;

/// Parse a template with the default delimiters
pub fn parse(source: &str) -> Result<Template, ParseError> {
    builder::build(source, &RenderConfig::default())
}

/// Parse a template with custom delimiters and limits
pub fn parse_with_config(source: &str, config: &RenderConfig) -> Result<Template, ParseError> {
    builder::build(source, config)
}

impl Template {
    /// Parse a template with the default configuration
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        parse(source)
    }
}

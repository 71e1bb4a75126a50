//! Render configuration
//!
//! Configuration can be built in code with the `with_*` methods or loaded from
//! a TOML file:
//!
//! ```toml
//! max_nesting = 32
//!
//! [delimiters]
//! open = "<%"
//! close = "%>"
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading or validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Markers that open and close an action
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Delimiters {
    pub open: String,
    pub close: String,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new("{{", "}}")
    }
}

impl Delimiters {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

/// Largest accepted `max_nesting`; evaluation recurses once per block level
pub const MAX_NESTING_LIMIT: usize = 1024;

/// Configuration for parsing and rendering
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Action delimiters
    pub delimiters: Delimiters,
    /// Deepest allowed nesting of blocks, and of parentheses within an action
    pub max_nesting: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            delimiters: Delimiters::default(),
            max_nesting: 64,
        }
    }
}

impl RenderConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: RenderConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the action delimiters
    pub fn with_delimiters(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.delimiters = Delimiters::new(open, close);
        self
    }

    /// Set the nesting limit
    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    /// Check that the configuration can drive the parser
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Delimiters { open, close } = &self.delimiters;
        if open.is_empty() || close.is_empty() {
            return Err(ConfigError::Invalid("delimiters must not be empty".into()));
        }
        if open == close {
            return Err(ConfigError::Invalid(format!(
                "open and close delimiters are both '{}'",
                open
            )));
        }
        if self.max_nesting == 0 {
            return Err(ConfigError::Invalid("max_nesting must be at least 1".into()));
        }
        if self.max_nesting > MAX_NESTING_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_nesting must be at most {}",
                MAX_NESTING_LIMIT
            )));
        }
        Ok(())
    }
}

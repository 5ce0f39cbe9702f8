//! Error types for the BtJson engine.

use thiserror::Error;

/// Top-level error type for the BtJson engine.
#[derive(Debug, Error)]
pub enum BtError {
    #[error(transparent)]
    Expand(#[from] ExpandError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Invalid engine options: {0}")]
    Options(#[from] serde_json::Error),
}

/// Errors during tree expansion.
#[derive(Debug, Error)]
pub enum ExpandError {
    #[error("Infinite loop detected at \"{selector}\" (more than {limit} rewrites)")]
    Divergence { selector: String, limit: u32 },

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Rule for \"{selector}\" failed: {message}")]
    Rule { selector: String, message: String },
}

/// Errors from localized-string and table lookups performed by rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Keyset \"{keyset}\" was not found")]
    KeysetNotFound { keyset: String },

    #[error("Key \"{key}\" in keyset \"{keyset}\" was not found")]
    KeyNotFound { keyset: String, key: String },
}

impl ExpandError {
    /// Build a rule failure for the given selector.
    pub fn rule(selector: impl Into<String>, message: impl Into<String>) -> Self {
        ExpandError::Rule {
            selector: selector.into(),
            message: message.into(),
        }
    }
}

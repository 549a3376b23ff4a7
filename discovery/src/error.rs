//! Error types for the fallible edges of discovery.
//!
//! Help acquisition and parsing never fail; they degrade to empty nodes.
//! What remains is persistence, configuration, and the tool-call protocol.

use thiserror::Error;

/// Snapshot write failures.
#[derive(Debug, Error)]
pub enum CacheError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value outside its allowed range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Protocol-level tool-call failures.
///
/// A wrapped program that exits non-zero is not an error; its output is
/// formatted and returned normally.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServeError {
    /// No tool with the given name is registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The parameters cannot be turned into an invocation.
    #[error("invalid params: {0}")]
    InvalidParams(String),
}

//! Error types for Site Analyst.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Run history file errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to read run history {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write run history {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Run history {path} is not in a known format, refusing to overwrite it")]
    Unrecognized { path: PathBuf },

    #[error("Failed to serialize run history: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from the external model / realtime APIs.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("No API key configured for provider {provider}")]
    MissingCredentials { provider: String },

    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// PDF report errors.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Failed to write PDF: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template has no page tree")]
    MissingPageTree,
}

/// Model output that could not be read as a card list.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a JSON array, got {0}")]
    NotAnArray(&'static str),

    #[error("Array element {index} is not an object")]
    NotAnObject { index: usize },

    #[error("Array is empty")]
    Empty,
}

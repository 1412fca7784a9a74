//! Custom error types for dblpranker.
//!
//! This module defines all error types used throughout the application.
//! All functions return `Result<T, RankerError>` instead of using `unwrap()`.

use thiserror::Error;

/// Main error type for dblpranker operations.
///
/// Uses `thiserror` for ergonomic error handling and automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum RankerError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTML parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Non-success HTTP status from an external page
    #[error("HTTP status {status} from {url}")]
    Status {
        /// Response status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error (rule file, base URL, client construction)
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using `RankerError`
pub type Result<T> = std::result::Result<T, RankerError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a parse error message
    fn ok_or_parse(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| RankerError::Parse(msg.to_string()))
    }
}

//! Error types for the fraud ring demo

use crate::graph::GraphError;
use thiserror::Error;

/// Longest error text shown to a user for a failed query
pub const MAX_ERROR_DISPLAY: usize = 200;

/// Errors raised while configuring, generating, querying or verifying
#[derive(Error, Debug)]
pub enum FraudRingError {
    /// Missing or invalid store configuration; fatal at startup
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Store unreachable or refusing the connection; fatal
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Malformed pattern, missing entity, or server-side query failure
    #[error("Query error: {0}")]
    QueryError(String),

    /// The requested index is already defined; callers treat this as success
    #[error("Index already exists: {0}")]
    IndexExists(String),

    /// Embedded store failure
    #[error("Graph error: {0}")]
    GraphError(#[from] GraphError),

    /// HTTP transport error (remote store)
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Scenario catalog could not be parsed
    #[error("Catalog error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FraudRingError {
    /// Error text cut to [`MAX_ERROR_DISPLAY`] characters for display
    pub fn truncated(&self) -> String {
        truncate_message(&self.to_string(), MAX_ERROR_DISPLAY)
    }

    /// Fatal errors end the session; query errors are isolated per call
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FraudRingError::ConfigError(_) | FraudRingError::ConnectionError(_)
        )
    }
}

pub(crate) fn truncate_message(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        return message.to_string();
    }
    let mut cut: String = message.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

pub type FraudRingResult<T> = Result<T, FraudRingError>;

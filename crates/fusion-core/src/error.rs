//! Error types for the RAG fusion system.

use thiserror::Error;

/// Result type alias using FusionError.
pub type Result<T> = std::result::Result<T, FusionError>;

/// Errors that can occur in the RAG fusion system.
#[derive(Error, Debug)]
pub enum FusionError {
    /// Fusion parameters violate preconditions.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Query expansion service failed or returned no queries.
    #[error("Query expansion failed: {reason}")]
    ExpansionFailed { reason: String },

    /// Retrieval failed for a specific query.
    #[error("Retrieval failed for query '{query}': {reason}")]
    RetrievalFailed { query: String, reason: String },

    /// Answer synthesis failed.
    #[error("Synthesis failed: {reason}")]
    SynthesisFailed { reason: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl FusionError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an expansion error.
    pub fn expansion_failed(reason: impl Into<String>) -> Self {
        Self::ExpansionFailed {
            reason: reason.into(),
        }
    }

    /// Create a retrieval error for a query.
    pub fn retrieval_failed(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RetrievalFailed {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// Create a synthesis error.
    pub fn synthesis_failed(reason: impl Into<String>) -> Self {
        Self::SynthesisFailed {
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

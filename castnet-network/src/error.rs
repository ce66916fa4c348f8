//! Error types for the castnet-network crate.

use castnet_core::GraphKind;
use thiserror::Error;

/// Top-level error type for network building, snapshot storage, and feature extraction.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Snapshot not found: {0}")]
    NotFound(String),

    #[error("Snapshot already exists: {0}")]
    AlreadyExists(String),

    #[error("Corrupt snapshot '{label}': {reason}")]
    Corrupt { label: String, reason: String },

    #[error("Snapshot chain broken: expected '{expected}', found '{found}'")]
    ChainBroken { expected: String, found: String },

    #[error("Graph kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        expected: GraphKind,
        found: GraphKind,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl NetworkError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn corrupt(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            label: label.into(),
            reason: reason.into(),
        }
    }

    /// True for the "snapshot was never saved" case, which callers must not paper over.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// A movie whose credit fields could not be read as a list.
///
/// Recoverable: the builder logs it and moves on to the next movie.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("movie '{movie_id}': {field} {reason}")]
pub struct MalformedCredits {
    pub movie_id: String,
    pub field: &'static str,
    pub reason: String,
}

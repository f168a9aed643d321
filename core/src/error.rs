//! Error types for Lunary Core

use std::path::PathBuf;

/// Result type alias for Lunary operations
pub type LunaryResult<T> = Result<T, LunaryError>;

/// Main error type for Lunary
#[derive(Debug, thiserror::Error)]
pub enum LunaryError {
    /// Failed to create a storage directory
    #[error("Failed to create directory: {0}")]
    DirCreateFailed(PathBuf),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage backend errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Storage backend cannot be used in this environment
    #[error("Storage backend unavailable: {0}")]
    StorageUnavailable(String),

    /// Search engine errors
    #[error("Search failed: {0}")]
    SearchEngine(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unsupported operation errors
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl LunaryError {
    /// Create a new storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new search engine error
    pub fn search_engine(msg: impl Into<String>) -> Self {
        Self::SearchEngine(msg.into())
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new unsupported operation error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Check if this error came from a storage backend
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::StorageUnavailable(_) | Self::DirCreateFailed(_) | Self::Io(_)
        )
    }
}

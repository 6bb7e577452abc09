//! Storage error types for applied-set persistence.

/// Errors that can occur while persisting an applied set.
///
/// Loading never produces these: an unreadable record is treated as empty.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backing file or directory could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The applied set could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No persistent backend is available.
    #[error("Storage unavailable: {message}")]
    Unavailable {
        /// Why the backend is unavailable.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `Unavailable` error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Returns `true` if the backend is missing rather than failing.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

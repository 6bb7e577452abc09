use thiserror::Error;

/// Core error types for plan editing and reconciliation
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid {scope} operation: {message}")]
    Validation { scope: String, message: String },

    #[error("Unknown operation scope: {0}")]
    UnknownScope(String),

    #[error("Suggested operation is not part of the plan: {0}")]
    UnknownOperation(String),

    #[error("Plan entry not found: {0}")]
    EntryNotFound(String),

    #[error("Reference \"{reference}\" matches {matches} plan entries")]
    AmbiguousReference { reference: String, matches: usize },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new Validation error
    pub fn validation(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            scope: scope.into(),
            message: message.into(),
        }
    }

    /// Create a new UnknownScope error
    pub fn unknown_scope(scope: impl Into<String>) -> Self {
        Self::UnknownScope(scope.into())
    }

    /// Create a new UnknownOperation error
    pub fn unknown_operation(description: impl Into<String>) -> Self {
        Self::UnknownOperation(description.into())
    }

    /// Create a new EntryNotFound error
    pub fn entry_not_found(reference: impl Into<String>) -> Self {
        Self::EntryNotFound(reference.into())
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } | Self::UnknownScope(_) => ErrorCategory::Validation,
            Self::UnknownOperation(_) => ErrorCategory::Suggestion,
            Self::EntryNotFound(_) | Self::AmbiguousReference { .. } => ErrorCategory::NotFound,
            Self::JsonError(_) => ErrorCategory::Serialization,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Suggestion,
    NotFound,
    Serialization,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Suggestion => write!(f, "suggestion"),
            Self::NotFound => write!(f, "not_found"),
            Self::Serialization => write!(f, "serialization"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = CoreError::validation("add-column", "type is required");
        assert_eq!(
            err.to_string(),
            "Invalid add-column operation: type is required"
        );
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_unknown_operation_error() {
        let err = CoreError::unknown_operation("table-rename Foo -> Bar");
        assert!(err.to_string().contains("Foo -> Bar"));
        assert_eq!(err.category(), ErrorCategory::Suggestion);
    }

    #[test]
    fn test_ambiguous_reference_error() {
        let err = CoreError::AmbiguousReference {
            reference: "ab".into(),
            matches: 2,
        };
        assert_eq!(err.to_string(), "Reference \"ab\" matches 2 plan entries");
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("{ invalid json }").unwrap_err();
        let core_err: CoreError = json_err.into();

        assert!(matches!(core_err, CoreError::JsonError(_)));
        assert_eq!(core_err.category(), ErrorCategory::Serialization);
    }

    #[test]
    fn test_error_categories_display() {
        assert_eq!(ErrorCategory::Validation.to_string(), "validation");
        assert_eq!(ErrorCategory::Suggestion.to_string(), "suggestion");
        assert_eq!(ErrorCategory::NotFound.to_string(), "not_found");
        assert_eq!(ErrorCategory::Serialization.to_string(), "serialization");
    }
}

//! Error types for the triage service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application. The HTTP layer downcasts to [`TriageError`] to pick
//! a response status.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific triage scenarios
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("Invalid request: {reason}")]
    Validation { reason: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Patient store failure: {message}")]
    Store { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl TriageError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for TriageError {
    fn from(err: sqlx::Error) -> Self {
        TriageError::Store {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = TriageError::validation("name is required").into();
        match err.downcast_ref::<TriageError>() {
            Some(TriageError::Validation { reason }) => assert_eq!(reason, "name is required"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            TriageError::not_found("patient 7").to_string(),
            "Not found: patient 7"
        );
    }
}

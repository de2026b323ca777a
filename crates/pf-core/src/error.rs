//! Core error types for Portfolio RS

use thiserror::Error;

/// Core error type for portfolio operations
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Not found: {entity} with id={id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Standard Result type for portfolio operations
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::NotFound { .. } => "not_found",
            CoreError::Serialization(_) => "serialization_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = CoreError::not_found("achievement", "42");
        assert_eq!(err.to_string(), "Not found: achievement with id=42");
        assert_eq!(err.error_code(), "not_found");
    }

    #[test]
    fn test_from_serde_error() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CoreError = parse.into();
        assert_eq!(err.error_code(), "serialization_error");
    }
}

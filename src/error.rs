//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout agentdesk.
//! All errors are structured and map to stable error codes and HTTP statuses.
//!
//! # Error Categories
//! - `Validation`: Declared request fields missing or empty (422)
//! - `InvalidBody`: Request body could not be parsed (400)
//! - `InvalidInput`: Malformed configuration or parameters (400)
//! - `ConnectionFailed`: Pool exhausted, closed, or store unreachable (503)
//! - `QueryFailed`: Statement execution errors (500)
//! - `EngineError`: Engine-specific database errors (500)
//! - `ConfigError`: Configuration file or environment errors (500)

use axum::http::StatusCode;
use thiserror::Error;

use crate::validation::Violation;

/// Main error type for agentdesk operations
#[derive(Error, Debug)]
pub enum DeskError {
    /// One or more declared request fields failed validation
    #[error("Validation failed: {} field(s) rejected", .0.len())]
    Validation(Vec<Violation>),

    /// Request body could not be decoded
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Invalid input or missing required parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Connection could not be acquired
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Statement execution failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// Engine-specific database error
    #[error("Engine error ({engine}): {detail}")]
    EngineError { engine: String, detail: String },

    /// Configuration error (file not found, invalid JSON, bad env value, etc.)
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DeskError {
    /// Convert error to error code string for JSON output
    ///
    /// Error codes are stable and suitable for programmatic handling by clients.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::InvalidBody(_) => "INVALID_BODY",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::QueryFailed(_) => "QUERY_FAILED",
            Self::EngineError { .. } => "ENGINE_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
        }
    }

    /// HTTP status code the error is answered with
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidBody(_) | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::ConnectionFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::QueryFailed(_) | Self::EngineError { .. } | Self::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get human-readable error message (client-appropriate, no credentials)
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Create a validation error from collected violations
    pub fn validation(violations: Vec<Violation>) -> Self {
        Self::Validation(violations)
    }

    /// Create an invalid body error
    pub fn invalid_body(message: impl Into<String>) -> Self {
        Self::InvalidBody(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    /// Create a query failed error
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed(message.into())
    }

    /// Create an engine-specific error
    pub fn engine_error(engine: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::EngineError { engine: engine.into(), detail: detail.into() }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }
}

/// Result type alias for agentdesk operations
pub type Result<T> = std::result::Result<T, DeskError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{Location, Rule};

    #[test]
    fn test_error_codes() {
        assert_eq!(DeskError::validation(Vec::new()).error_code(), "VALIDATION_FAILED");
        assert_eq!(DeskError::invalid_body("test").error_code(), "INVALID_BODY");
        assert_eq!(DeskError::invalid_input("test").error_code(), "INVALID_INPUT");
        assert_eq!(DeskError::connection_failed("test").error_code(), "CONNECTION_FAILED");
        assert_eq!(DeskError::query_failed("test").error_code(), "QUERY_FAILED");
        assert_eq!(DeskError::engine_error("mysql", "test").error_code(), "ENGINE_ERROR");
        assert_eq!(DeskError::config_error("test").error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(DeskError::validation(Vec::new()).status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(DeskError::invalid_body("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(DeskError::connection_failed("x").status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(DeskError::query_failed("x").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            DeskError::engine_error("sqlite", "x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_messages() {
        let err = DeskError::query_failed("Duplicate entry 'A019'");
        assert!(err.message().contains("Duplicate entry 'A019'"));

        let err = DeskError::engine_error("mysql", "connection timeout");
        assert!(err.message().contains("mysql"));
        assert!(err.message().contains("connection timeout"));

        let rule = Rule::non_empty("AGENT_CODE", Location::Body);
        let err = DeskError::validation(vec![rule.violation(None), rule.violation(None)]);
        assert_eq!(err.message(), "Validation failed: 2 field(s) rejected");
    }
}

//! JSON Output Envelope Types
//!
//! This module defines the structured JSON shapes agentdesk emits besides raw
//! query results.
//!
//! # HTTP Contract
//! - Validation failure (422): `{"errors": [{"value", "msg", "param", "location"}, ...]}`
//! - Any other failure: `{"error": {"code": "...", "message": "..."}}`
//!
//! # CLI Contract
//! - Success: `{"ok": true, "engine": "...", "command": "...", "data": {...}, "meta": {...}}`
//! - Error: `{"ok": false, "engine": "...", "command": "...", "error": {"code": "...", "message": "..."}}`

use axum::response::{IntoResponse, Response};
use axum::Json;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::DeskError;
use crate::validation::Violation;

/// Body of a 422 response
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ValidationEnvelope {
    pub errors: Vec<Violation>,
}

/// Body of every other HTTP error response
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ErrorBody {
    pub error: ErrorInfo,
}

impl From<&DeskError> for ErrorBody {
    fn from(err: &DeskError) -> Self {
        Self { error: ErrorInfo::from(err) }
    }
}

impl IntoResponse for DeskError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            Self::Validation(errors) => (status, Json(ValidationEnvelope { errors })).into_response(),
            other => (status, Json(ErrorBody::from(&other))).into_response(),
        }
    }
}

/// Success envelope for CLI command results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    /// Always true for success envelopes
    pub ok: bool,

    /// Database engine used for this operation (mysql, sqlite)
    pub engine: String,

    /// Command that was executed
    pub command: String,

    /// Operation-specific data
    pub data: T,

    /// Execution metadata
    pub meta: Metadata,
}

impl<T> SuccessEnvelope<T> {
    /// Create a new success envelope
    pub fn new(engine: impl Into<String>, command: impl Into<String>, data: T, meta: Metadata) -> Self {
        Self { ok: true, engine: engine.into(), command: command.into(), data, meta }
    }
}

/// Error envelope for CLI command failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always false for error envelopes
    pub ok: bool,

    /// Database engine (empty string if the failure happened before one was chosen)
    pub engine: String,

    /// Command that was attempted
    pub command: String,

    /// Error information
    pub error: ErrorInfo,
}

impl ErrorEnvelope {
    /// Create error envelope from DeskError
    pub fn from_error(engine: impl Into<String>, command: impl Into<String>, err: &DeskError) -> Self {
        Self { ok: false, engine: engine.into(), command: command.into(), error: ErrorInfo::from(err) }
    }
}

/// Error information structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorInfo {
    /// Stable error code (e.g., "CONNECTION_FAILED", "QUERY_FAILED")
    pub code: String,

    /// Human-readable error message (no credentials)
    pub message: String,
}

impl ErrorInfo {
    /// Create a new error info
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }
}

impl From<&DeskError> for ErrorInfo {
    fn from(err: &DeskError) -> Self {
        Self::new(err.error_code(), err.message())
    }
}

/// Execution metadata included in CLI success output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Execution time in milliseconds
    pub execution_ms: u64,
}

impl Metadata {
    /// Create new metadata with execution time
    pub fn new(execution_ms: u64) -> Self {
        Self { execution_ms }
    }
}

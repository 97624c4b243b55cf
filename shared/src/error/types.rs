//! Error types

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details (missing fields, offending value, ...)
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Look up a detail entry
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.as_ref().and_then(|d| d.get(key))
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    // ==================== Taxonomy checks ====================

    /// Malformed input value; recoverable without contacting the catalog service
    pub fn is_validation(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::ValidationFailed
                | ErrorCode::InvalidFormat
                | ErrorCode::InvalidNumber
                | ErrorCode::InvalidBoolean
                | ErrorCode::InvalidDate
        )
    }

    pub fn is_persistence(&self) -> bool {
        self.code == ErrorCode::PersistenceFailed
    }

    pub fn is_schema_mismatch(&self) -> bool {
        self.code == ErrorCode::SchemaMismatch
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create a persistence error (catalog service rejected or failed a save)
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PersistenceFailed, msg)
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ParseFailed, msg)
    }

    /// Create a schema mismatch error listing the unmapped required fields by label
    pub fn schema_mismatch(missing_labels: Vec<String>) -> Self {
        let message = format!("Missing required fields: {}", missing_labels.join(", "));
        Self::with_message(ErrorCode::SchemaMismatch, message)
            .with_detail("missing", missing_labels)
    }

    /// Create a local storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::StorageError, msg)
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::NetworkError, msg)
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string())
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

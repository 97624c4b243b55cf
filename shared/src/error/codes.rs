//! Unified error codes for the attribute engine
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Attribute value errors
//! - 2xxx: Import errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Represented as u16 values so the code survives the trip to the UI layer
/// unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,

    // ==================== 1xxx: Attribute value ====================
    /// Value is not a finite number
    InvalidNumber = 1001,
    /// Value is not a boolean
    InvalidBoolean = 1002,
    /// Value is not an ISO-8601 date
    InvalidDate = 1003,
    /// Catalog service rejected or failed a save
    PersistenceFailed = 1101,
    /// Reloading authoritative values failed
    ReloadFailed = 1102,

    // ==================== 2xxx: Import ====================
    /// Required schema fields have no mapped column
    SchemaMismatch = 2001,
    /// Import file could not be parsed
    ParseFailed = 2002,
    /// Import file has no content
    EmptyFile = 2004,
    /// Import job not found
    ImportJobNotFound = 2005,
    /// Import job finished with failure status
    ImportJobFailed = 2006,
    /// Import job did not finish within the polling budget
    ImportPollTimeout = 2007,

    // ==================== 9xxx: System ====================
    /// Network error talking to the catalog service
    NetworkError = 9003,
    /// Local key-value storage failed
    StorageError = 9401,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",

            // Attribute value
            ErrorCode::InvalidNumber => "Value is not a valid number",
            ErrorCode::InvalidBoolean => "Value is not a valid boolean",
            ErrorCode::InvalidDate => "Value is not a valid date",
            ErrorCode::PersistenceFailed => "Failed to save attribute value",
            ErrorCode::ReloadFailed => "Failed to reload attribute values",

            // Import
            ErrorCode::SchemaMismatch => "Required import fields are not mapped",
            ErrorCode::ParseFailed => "Failed to parse import file",
            ErrorCode::EmptyFile => "Import file is empty",
            ErrorCode::ImportJobNotFound => "Import job not found",
            ErrorCode::ImportJobFailed => "Import job failed",
            ErrorCode::ImportPollTimeout => "Import job did not finish in time",

            // System
            ErrorCode::NetworkError => "Network error",
            ErrorCode::StorageError => "Local storage error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),

            // Attribute value
            1001 => Ok(ErrorCode::InvalidNumber),
            1002 => Ok(ErrorCode::InvalidBoolean),
            1003 => Ok(ErrorCode::InvalidDate),
            1101 => Ok(ErrorCode::PersistenceFailed),
            1102 => Ok(ErrorCode::ReloadFailed),

            // Import
            2001 => Ok(ErrorCode::SchemaMismatch),
            2002 => Ok(ErrorCode::ParseFailed),
            2004 => Ok(ErrorCode::EmptyFile),
            2005 => Ok(ErrorCode::ImportJobNotFound),
            2006 => Ok(ErrorCode::ImportJobFailed),
            2007 => Ok(ErrorCode::ImportPollTimeout),

            // System
            9003 => Ok(ErrorCode::NetworkError),
            9401 => Ok(ErrorCode::StorageError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

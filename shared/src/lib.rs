//! Shared types for the attribute engine
//!
//! Catalog data model (attributes, values, groups, import types) and the
//! unified error system used by every crate in the workspace.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};

//! Data models
//!
//! Shared between the attribute engine and its collaborators.
//! Attribute and value ids are `i64`; import job ids are opaque strings.

pub mod attribute;
pub mod attribute_group;
pub mod attribute_value;
pub mod import;

// Re-exports
pub use attribute::*;
pub use attribute_group::*;
pub use attribute_value::*;
pub use import::*;

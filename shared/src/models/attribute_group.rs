//! Attribute Group Model
//!
//! Canonical, display-ready shape. Upstream payloads are reconciled into
//! this structure before anything else looks at them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named, ordered collection of attribute values shown together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeGroup {
    pub id: i64,
    pub name: String,
    pub order: i32,
    pub items: Vec<AttributeGroupItem>,
}

/// One attribute entry inside a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeGroupItem {
    pub id: i64,
    /// Missing upstream ids resolve to 0
    pub attribute_id: i64,
    pub order: i32,
    /// Resolved display label
    pub label: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
}

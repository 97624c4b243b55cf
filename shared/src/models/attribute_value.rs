//! Attribute Value Model

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A concrete value of an attribute for one product
///
/// `(attribute_id, locale, channel)` identifies the value within a product.
/// `locale` is always `None` for non-localisable attributes and `channel`
/// for non-scopable ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub attribute_id: i64,
    /// Type-dependent structure (already normalized)
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
}

impl AttributeValue {
    pub fn new(attribute_id: i64, value: Value) -> Self {
        Self {
            id: None,
            attribute_id,
            value,
            locale: None,
            channel: None,
        }
    }

    pub fn with_scope(mut self, locale: Option<String>, channel: Option<String>) -> Self {
        self.locale = locale;
        self.channel = channel;
        self
    }
}

/// Structured `price` value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceValue {
    #[serde(default)]
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Structured `measurement` value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementValue {
    #[serde(default)]
    pub amount: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
}

/// Structured `media` value (reference to an uploaded asset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaValue {
    pub asset_id: i64,
}

/// Currency used when a price carries none
pub const DEFAULT_CURRENCY: &str = "USD";

/// Fixed measurement unit list; the first entry is the default unit
pub const MEASUREMENT_UNITS: [&str; 11] =
    ["kg", "g", "lb", "oz", "m", "cm", "mm", "in", "ft", "l", "ml"];

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_unit() -> String {
    MEASUREMENT_UNITS[0].to_string()
}

//! Attribute Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Data type of an attribute
///
/// Serialized as the snake_case tag used by the catalog service
/// (`"text"`, `"rich_text"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Text,
    Number,
    Boolean,
    Date,
    Price,
    Measurement,
    Url,
    Email,
    Phone,
    RichText,
    Media,
}

impl DataType {
    /// All data types, in declaration order
    pub const ALL: [DataType; 11] = [
        DataType::Text,
        DataType::Number,
        DataType::Boolean,
        DataType::Date,
        DataType::Price,
        DataType::Measurement,
        DataType::Url,
        DataType::Email,
        DataType::Phone,
        DataType::RichText,
        DataType::Media,
    ];

    /// Wire tag for this data type
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Price => "price",
            Self::Measurement => "measurement",
            Self::Url => "url",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::RichText => "rich_text",
            Self::Media => "media",
        }
    }

    /// Parse a wire tag (case-insensitive)
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(tag))
    }

    /// Whether the value travels as JSON-encoded text on the wire
    ///
    /// `rich_text` is transmitted as text too, but its content is opaque
    /// markup and is never decoded.
    pub const fn is_json_encoded(&self) -> bool {
        matches!(self, Self::Price | Self::Measurement | Self::Media)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute entity (administered outside this engine, read-only here)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: i64,
    pub code: String,
    pub label: String,
    pub data_type: DataType,
    /// Allows distinct values per locale
    #[serde(default)]
    pub is_localisable: bool,
    /// Allows distinct values per channel
    #[serde(default)]
    pub is_scopable: bool,
}

impl Attribute {
    pub fn new(id: i64, code: impl Into<String>, label: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id,
            code: code.into(),
            label: label.into(),
            data_type,
            is_localisable: false,
            is_scopable: false,
        }
    }

    pub fn localisable(mut self) -> Self {
        self.is_localisable = true;
        self
    }

    pub fn scopable(mut self) -> Self {
        self.is_scopable = true;
        self
    }
}

//! Bulk Import Models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source column header -> target field id
///
/// Keys are unique; insertion order is irrelevant, so an ordered map keeps
/// serialization deterministic. Serialized as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportMapping(pub BTreeMap<String, String>);

impl ImportMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, header: impl Into<String>, field_id: impl Into<String>) {
        self.0.insert(header.into(), field_id.into());
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.0.get(header).map(String::as_str)
    }

    /// Whether some header is mapped to `field_id`
    pub fn targets(&self, field_id: &str) -> bool {
        self.0.values().any(|v| v == field_id)
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ImportMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Target schema field for an import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportFieldSchemaEntry {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,
}

impl ImportFieldSchemaEntry {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            required: false,
            field_type: default_field_type(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = field_type.into();
        self
    }
}

fn default_field_type() -> String {
    "text".to_string()
}

/// Bulk-import file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportFileFormat {
    /// Comma / semicolon / tab separated text
    Delimited,
    /// Binary spreadsheet workbook
    Spreadsheet,
}

/// Header row plus the first data rows of an import file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportPreview {
    pub file_name: String,
    pub format: ImportFileFormat,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ImportPreview {
    /// Degraded preview for files that could not be parsed
    pub fn empty(file_name: impl Into<String>, format: ImportFileFormat) -> Self {
        Self {
            file_name: file_name.into(),
            format,
            headers: Vec::new(),
            rows: Vec::new(),
        }
    }
}

/// Import job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportJobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ImportJobStatus {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Bulk-import job as reported by the catalog service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportJob {
    pub id: String,
    pub status: ImportJobStatus,
    #[serde(default)]
    pub processed_rows: u64,
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub error_count: u64,
}

/// One failed row of a completed import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRowError {
    pub row: u64,
    #[serde(default)]
    pub column: Option<String>,
    pub message: String,
}

/// Error report for a completed import job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportErrorReport {
    pub job_id: String,
    #[serde(default)]
    pub errors: Vec<ImportRowError>,
}

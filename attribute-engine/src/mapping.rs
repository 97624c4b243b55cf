//! Import column mapping resolution
//!
//! Maps arbitrary source headers onto the import schema:
//!
//! 1. Reuse the saved template when enough of its headers are present
//! 2. Otherwise auto-match: exact id / label (case-insensitive), then synonyms
//! 3. Unmatched headers are left out ("do not import")

use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};
use shared::models::{ImportFieldSchemaEntry, ImportMapping};
use std::collections::HashSet;

/// Default share of template headers that must be present for reuse
pub const DEFAULT_TEMPLATE_THRESHOLD: f64 = 0.70;

/// Synonym rule: header keywords -> ids / labels the target field may carry
struct Synonym {
    keywords: &'static [&'static str],
    targets: &'static [&'static str],
}

const SYNONYMS: &[Synonym] = &[
    Synonym {
        keywords: &["barcode", "upc", "ean", "gtin"],
        targets: &["gtin", "ean", "upc", "barcode"],
    },
    Synonym {
        keywords: &["sku", "article", "item number", "reference"],
        targets: &["sku"],
    },
    Synonym {
        keywords: &["product name", "title"],
        targets: &["name", "title"],
    },
    Synonym {
        keywords: &["description", "desc"],
        targets: &["description"],
    },
    Synonym {
        keywords: &["price", "cost", "msrp"],
        targets: &["price"],
    },
    Synonym {
        keywords: &["qty", "quantity", "stock"],
        targets: &["quantity", "stock", "qty"],
    },
];

/// Result of resolving a mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingResolution {
    pub mapping: ImportMapping,
    /// Every required schema field is mapped
    pub is_valid: bool,
    /// The saved template was reused instead of auto-matching
    pub from_template: bool,
}

/// Resolves source headers against an import schema
#[derive(Debug, Clone)]
pub struct MappingResolver {
    threshold: f64,
}

impl Default for MappingResolver {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE_THRESHOLD)
    }
}

impl MappingResolver {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Resolve `headers` against `schema`, reusing `template` when it fits
    pub fn resolve(
        &self,
        headers: &[String],
        schema: &[ImportFieldSchemaEntry],
        template: Option<&ImportMapping>,
    ) -> MappingResolution {
        if let Some(mapping) = template.and_then(|t| self.reuse_template(headers, schema, t)) {
            tracing::debug!(mapped = mapping.len(), "Reusing saved import mapping template");
            return MappingResolution {
                is_valid: is_valid(&mapping, schema),
                mapping,
                from_template: true,
            };
        }

        let mapping = auto_match(headers, schema);
        tracing::debug!(
            headers = headers.len(),
            mapped = mapping.len(),
            "Auto-matched import columns"
        );
        MappingResolution {
            is_valid: is_valid(&mapping, schema),
            mapping,
            from_template: false,
        }
    }

    /// Template restricted to current headers and surviving field ids,
    /// if at least `threshold` of its headers are present
    fn reuse_template(
        &self,
        headers: &[String],
        schema: &[ImportFieldSchemaEntry],
        template: &ImportMapping,
    ) -> Option<ImportMapping> {
        if template.is_empty() {
            return None;
        }

        let present: HashSet<&str> = headers.iter().map(String::as_str).collect();
        let overlap = template.headers().filter(|h| present.contains(h)).count();
        let fraction = overlap as f64 / template.len() as f64;
        if fraction < self.threshold {
            tracing::debug!(
                fraction,
                threshold = self.threshold,
                "Template overlap too low, auto-matching instead"
            );
            return None;
        }

        let field_ids: HashSet<&str> = schema.iter().map(|f| f.id.as_str()).collect();
        Some(
            template
                .iter()
                .filter(|(header, field)| present.contains(header) && field_ids.contains(field))
                .collect(),
        )
    }
}

/// Lowercase words separated by single spaces: `"Product_SKU (EU)"` -> `"product sku eu"`
fn tokenize(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whole-word containment, so `"ean"` does not match `"Clean"`
fn contains_words(haystack: &str, needle: &str) -> bool {
    format!(" {haystack} ").contains(&format!(" {needle} "))
}

fn exact_match<'a>(header: &str, schema: &'a [ImportFieldSchemaEntry]) -> Option<&'a str> {
    let header = header.trim();
    schema
        .iter()
        .find(|f| f.id.eq_ignore_ascii_case(header) || f.label.trim().eq_ignore_ascii_case(header))
        .map(|f| f.id.as_str())
}

fn synonym_match<'a>(header: &str, schema: &'a [ImportFieldSchemaEntry]) -> Option<&'a str> {
    let header = tokenize(header);
    SYNONYMS
        .iter()
        .filter(|rule| rule.keywords.iter().any(|kw| contains_words(&header, kw)))
        .find_map(|rule| {
            schema
                .iter()
                .find(|f| {
                    rule.targets.iter().any(|t| {
                        f.id.eq_ignore_ascii_case(t) || tokenize(&f.label) == *t
                    })
                })
                .map(|f| f.id.as_str())
        })
}

/// Exact matches first, then synonyms; each field is claimed at most once
fn auto_match(headers: &[String], schema: &[ImportFieldSchemaEntry]) -> ImportMapping {
    let mut mapping = ImportMapping::new();
    let mut claimed: HashSet<&str> = HashSet::new();
    let mut unmatched: Vec<&String> = Vec::new();

    for header in headers {
        match exact_match(header, schema) {
            Some(field) if claimed.insert(field) => mapping.insert(header.clone(), field),
            _ => unmatched.push(header),
        }
    }

    for header in unmatched {
        if let Some(field) = synonym_match(header, schema)
            && claimed.insert(field)
        {
            mapping.insert(header.clone(), field);
        }
    }

    mapping
}

/// Labels of required fields no header is mapped to
pub fn missing_required(mapping: &ImportMapping, schema: &[ImportFieldSchemaEntry]) -> Vec<String> {
    schema
        .iter()
        .filter(|f| f.required && !mapping.targets(&f.id))
        .map(|f| f.label.clone())
        .collect()
}

/// Every required field id appears among the mapping's values
pub fn is_valid(mapping: &ImportMapping, schema: &[ImportFieldSchemaEntry]) -> bool {
    missing_required(mapping, schema).is_empty()
}

/// Schema check blocking progression to the next import step
pub fn check_required(mapping: &ImportMapping, schema: &[ImportFieldSchemaEntry]) -> AppResult<()> {
    let missing = missing_required(mapping, schema);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::schema_mismatch(missing))
    }
}

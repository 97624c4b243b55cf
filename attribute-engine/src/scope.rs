//! Scope key resolution
//!
//! A value is identified by `(attribute_id, locale, channel)`. The
//! localisable / scopable rules are enforced here and only here: a key built
//! through [`derive_key`] never carries a locale for a non-localisable
//! attribute nor a channel for a non-scopable one.

use serde::{Deserialize, Serialize};
use shared::models::{Attribute, AttributeValue};
use std::fmt;

/// Sentinel the locale / channel pickers send for "no selection"
pub const NO_SELECTION: &str = "__none__";

/// Placeholder used for an absent locale / channel in the canonical string
const ABSENT: &str = "-";

/// Canonical identity of one attribute value within a product
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeKey {
    pub attribute_id: i64,
    pub locale: Option<String>,
    pub channel: Option<String>,
}

impl ScopeKey {
    /// Canonical string form: `"{attribute_id}|{locale}|{channel}"`, `-` when absent
    pub fn canonical(&self) -> String {
        format!(
            "{}|{}|{}",
            self.attribute_id,
            self.locale.as_deref().unwrap_or(ABSENT),
            self.channel.as_deref().unwrap_or(ABSENT)
        )
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Effective scope component: trimmed, and `None` when disabled or unselected
fn effective(enabled: bool, raw: Option<&str>) -> Option<String> {
    if !enabled {
        return None;
    }
    let raw = raw?.trim();
    if raw.is_empty() || raw == NO_SELECTION {
        return None;
    }
    Some(raw.to_string())
}

/// Derive the canonical key for `attribute` at the given locale / channel
pub fn derive_key(attribute: &Attribute, locale: Option<&str>, channel: Option<&str>) -> ScopeKey {
    ScopeKey {
        attribute_id: attribute.id,
        locale: effective(attribute.is_localisable, locale),
        channel: effective(attribute.is_scopable, channel),
    }
}

/// Key for a value received from upstream
///
/// With the attribute at hand the flags are enforced; without it (unknown
/// attribute) the stored scope is kept after trimming.
pub fn key_for_value(value: &AttributeValue, attribute: Option<&Attribute>) -> ScopeKey {
    match attribute {
        Some(attr) => derive_key(attr, value.locale.as_deref(), value.channel.as_deref()),
        None => ScopeKey {
            attribute_id: value.attribute_id,
            locale: effective(true, value.locale.as_deref()),
            channel: effective(true, value.channel.as_deref()),
        },
    }
}

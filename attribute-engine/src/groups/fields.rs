//! Field-name fallbacks for upstream attribute payloads
//!
//! Every lookup here is total: a missing or mistyped field yields `None`
//! and the caller moves on to the next fallback.

use serde_json::{Map, Value};
use shared::util::is_blank;

pub(super) const UNNAMED: &str = "Unnamed";
pub(super) const UNCATEGORIZED: &str = "Uncategorized";

/// Label keys, in priority order
const LABEL_KEYS: [&str; 6] = [
    "attribute_label",
    "label",
    "attribute_code",
    "name",
    "attribute_name",
    "key",
];

/// Value keys, in priority order
const VALUE_KEYS: [&str; 2] = ["value", "display_value"];

/// Group name keys, in priority order
const GROUP_KEYS: [&str; 5] = ["group_name", "group", "attribute_group", "groupName", "category"];

/// Substring hints on `attribute_code` -> group name
const GROUP_HINTS: [(&str, &str); 9] = [
    ("seo", "SEO"),
    ("marketing", "Marketing"),
    ("dimension", "Dimensions"),
    ("shipping", "Shipping"),
    ("logistic", "Logistics"),
    ("price", "Pricing"),
    ("media", "Media"),
    ("technical", "Technical"),
    ("general", "General"),
];

/// Wrapper keys an upstream response may nest the list under
pub(super) const WRAPPER_KEYS: [&str; 5] = ["data", "groups", "attributes", "items", "results"];

/// Non-blank trimmed string at `key`
pub(super) fn text(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Integer at `key`, accepting numeric strings
pub(super) fn integer(map: &Map<String, Value>, key: &str) -> Option<i64> {
    match map.get(key) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Non-blank value at `key`
pub(super) fn usable_value(map: &Map<String, Value>, key: &str) -> Option<Value> {
    map.get(key).filter(|v| !is_blank(v)).cloned()
}

/// First label found through the priority keys
pub(super) fn flat_label(map: &Map<String, Value>) -> Option<String> {
    LABEL_KEYS.iter().find_map(|key| text(map, key))
}

/// Value under `value` / `display_value`, else under the resolved label itself
pub(super) fn flat_value(map: &Map<String, Value>, label: &str) -> Option<Value> {
    VALUE_KEYS
        .iter()
        .find_map(|key| usable_value(map, key))
        .or_else(|| usable_value(map, label))
}

/// Group name of a flat record; always resolves
pub(super) fn flat_group(map: &Map<String, Value>) -> String {
    GROUP_KEYS
        .iter()
        .find_map(|key| text(map, key))
        .or_else(|| text(map, "attribute_type").map(|t| title_case(&t)))
        .or_else(|| text(map, "attribute_code").and_then(|code| group_hint(&code)))
        .unwrap_or_else(|| UNCATEGORIZED.to_string())
}

fn group_hint(code: &str) -> Option<String> {
    let code = code.to_lowercase();
    GROUP_HINTS
        .iter()
        .find(|(hint, _)| code.contains(hint))
        .map(|(_, group)| group.to_string())
}

/// `"technical_specs"` -> `"Technical Specs"`
pub(super) fn title_case(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Label of a pre-grouped item: `attribute_label`, else `attribute` when it
/// is a string or an object carrying a label / name, else the flat keys
pub(super) fn grouped_label(map: &Map<String, Value>) -> Option<String> {
    text(map, "attribute_label")
        .or_else(|| match map.get("attribute") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Object(attr)) => text(attr, "label").or_else(|| text(attr, "name")),
            _ => None,
        })
        .or_else(|| flat_label(map))
}

/// Attribute id of an item: `attribute_id`, else `attribute` as id / object
pub(super) fn attribute_id(map: &Map<String, Value>) -> Option<i64> {
    integer(map, "attribute_id").or_else(|| match map.get("attribute") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::Object(attr)) => integer(attr, "id"),
        _ => None,
    })
}

//! JSON-encoded data types: price, measurement, media
//!
//! On the wire these travel as text holding serialized JSON. Decoding never
//! fails: a payload that is not a JSON object is kept verbatim (it may be an
//! already-decoded structure or malformed legacy data).

use serde_json::{Map, Number, Value, json};
use shared::models::{DEFAULT_CURRENCY, MEASUREMENT_UNITS, MeasurementValue, MediaValue, PriceValue};

use super::scalar::parse_number;

/// Decode the wire payload into an object, if it is one
fn decode_object(raw: &Value) -> Option<Map<String, Value>> {
    match raw {
        Value::Object(map) => Some(map.clone()),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) | Err(_) => {
                tracing::debug!(payload = %text, "Keeping non-object compound payload as-is");
                None
            }
        },
        _ => None,
    }
}

/// Numbers are kept untouched (so `5` stays `5`); numeric text is parsed.
/// Missing amounts default to 0, anything else is kept for validation.
fn amount_field(map: &Map<String, Value>) -> Value {
    match map.get("amount") {
        None | Some(Value::Null) => json!(0),
        Some(Value::Number(n)) => Value::Number(n.clone()),
        Some(Value::String(s)) => parse_number(s)
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(s.clone())),
        Some(other) => other.clone(),
    }
}

fn text_field(map: &Map<String, Value>, key: &str, default: &str) -> Value {
    match map.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Value::String(s.trim().to_string()),
        None | Some(Value::Null) | Some(Value::String(_)) => Value::String(default.to_string()),
        Some(other) => other.clone(),
    }
}

/// Serialize an in-memory structure to wire text; other values pass through
fn encode(value: &Value, normalize: fn(&Value) -> Value) -> Value {
    match value {
        Value::Object(_) => match serde_json::to_string(&normalize(value)) {
            Ok(text) => Value::String(text),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode compound value");
                value.clone()
            }
        },
        other => other.clone(),
    }
}

// ── price ───────────────────────────────────────────────────────────

pub(super) fn normalize_price(raw: &Value) -> Value {
    match decode_object(raw) {
        Some(map) => json!({
            "amount": amount_field(&map),
            "currency": text_field(&map, "currency", DEFAULT_CURRENCY),
        }),
        None => raw.clone(),
    }
}

pub(super) fn denormalize_price(value: &Value) -> Value {
    encode(value, normalize_price)
}

pub(super) fn validate_price(value: &Value) -> bool {
    match normalize_price(value) {
        Value::Null => true,
        value @ Value::Object(_) => serde_json::from_value::<PriceValue>(value)
            .is_ok_and(|p| p.amount.is_finite() && !p.currency.trim().is_empty()),
        _ => false,
    }
}

// ── measurement ─────────────────────────────────────────────────────

pub(super) fn normalize_measurement(raw: &Value) -> Value {
    match decode_object(raw) {
        Some(map) => json!({
            "amount": amount_field(&map),
            "unit": text_field(&map, "unit", MEASUREMENT_UNITS[0]),
        }),
        None => raw.clone(),
    }
}

pub(super) fn denormalize_measurement(value: &Value) -> Value {
    encode(value, normalize_measurement)
}

pub(super) fn validate_measurement(value: &Value) -> bool {
    match normalize_measurement(value) {
        Value::Null => true,
        value @ Value::Object(_) => serde_json::from_value::<MeasurementValue>(value)
            .is_ok_and(|m| m.amount.is_finite() && !m.unit.trim().is_empty()),
        _ => false,
    }
}

// ── media ───────────────────────────────────────────────────────────

fn asset_id_field(map: &Map<String, Value>) -> Value {
    match map.get("asset_id") {
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(s.clone())),
        Some(other) => other.clone(),
        None => Value::Null,
    }
}

pub(super) fn normalize_media(raw: &Value) -> Value {
    match decode_object(raw) {
        Some(map) => json!({ "asset_id": asset_id_field(&map) }),
        None => raw.clone(),
    }
}

pub(super) fn denormalize_media(value: &Value) -> Value {
    encode(value, normalize_media)
}

pub(super) fn validate_media(value: &Value) -> bool {
    match normalize_media(value) {
        Value::Null => true,
        value @ Value::Object(_) => serde_json::from_value::<MediaValue>(value).is_ok(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_defaults_applied() {
        assert_eq!(
            normalize_price(&json!("{}")),
            json!({"amount": 0, "currency": "USD"})
        );
        assert_eq!(
            normalize_price(&json!({"amount": "12.5"})),
            json!({"amount": 12.5, "currency": "USD"})
        );
    }

    #[test]
    fn test_price_keeps_invalid_json() {
        assert_eq!(normalize_price(&json!("{amount: 3")), json!("{amount: 3"));
        assert_eq!(normalize_price(&json!("[1,2]")), json!("[1,2]"));
        assert!(!validate_price(&json!("{amount: 3")));
    }

    #[test]
    fn test_price_validation() {
        assert!(validate_price(&json!({"amount": 10, "currency": "EUR"})));
        assert!(validate_price(&json!(r#"{"amount":"9.90"}"#)));
        assert!(!validate_price(&json!({"amount": "ten"})));
        assert!(!validate_price(&json!(12)));
    }

    #[test]
    fn test_measurement_default_unit() {
        assert_eq!(
            normalize_measurement(&json!(r#"{"amount":3}"#)),
            json!({"amount": 3, "unit": "kg"})
        );
        assert!(validate_measurement(&json!({"amount": 3, "unit": "cm"})));
        assert!(!validate_measurement(&json!({"amount": null, "unit": 5})));
    }

    #[test]
    fn test_media_asset_id() {
        assert_eq!(
            normalize_media(&json!(r#"{"asset_id":"17"}"#)),
            json!({"asset_id": 17})
        );
        assert!(validate_media(&json!({"asset_id": 17})));
        assert!(!validate_media(&json!({})));
        assert!(!validate_media(&json!({"asset_id": "abc"})));
    }

    #[test]
    fn test_denormalize_structures_to_text() {
        assert_eq!(
            denormalize_measurement(&json!({"amount": 1.5, "unit": "m"})),
            json!(r#"{"amount":1.5,"unit":"m"}"#)
        );
        assert_eq!(
            denormalize_media(&json!({"asset_id": 8})),
            json!(r#"{"asset_id":8}"#)
        );
        assert_eq!(denormalize_price(&Value::Null), Value::Null);
    }
}

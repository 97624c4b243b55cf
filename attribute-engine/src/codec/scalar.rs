//! Scalar data types: text-like, number, boolean, date

use chrono::{DateTime, NaiveDate};
use serde_json::{Number, Value};

/// ISO-8601 calendar date
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Minimum digit count of a phone number
const MIN_PHONE_DIGITS: usize = 5;

pub(super) fn identity(value: &Value) -> Value {
    value.clone()
}

pub(super) fn validate_text(value: &Value) -> bool {
    matches!(value, Value::Null | Value::String(_))
}

pub(super) fn validate_url(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return true;
            }
            let lower = s.to_ascii_lowercase();
            let rest = lower
                .strip_prefix("https://")
                .or_else(|| lower.strip_prefix("http://"));
            matches!(rest, Some(host) if !host.is_empty() && !host.contains(char::is_whitespace))
        }
        _ => false,
    }
}

pub(super) fn validate_email(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return true;
            }
            let mut parts = s.split('@');
            let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next())
            else {
                return false;
            };
            !local.is_empty()
                && !s.contains(char::is_whitespace)
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

pub(super) fn validate_phone(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return true;
            }
            let allowed = s
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' ' | '.'));
            let digits = s.chars().filter(char::is_ascii_digit).count();
            allowed && digits >= MIN_PHONE_DIGITS
        }
        _ => false,
    }
}

// ── number ──────────────────────────────────────────────────────────

/// Parse text as a finite f64
pub(super) fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Numbers stay as they are; numeric text becomes a number.
/// Anything else is kept so validation can reject it.
pub(super) fn normalize_number(raw: &Value) -> Value {
    match raw {
        Value::String(s) if s.trim().is_empty() => Value::Null,
        Value::String(s) => parse_number(s)
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| raw.clone()),
        other => other.clone(),
    }
}

pub(super) fn validate_number(value: &Value) -> bool {
    match normalize_number(value) {
        Value::Null => true,
        Value::Number(n) => n.as_f64().is_some_and(f64::is_finite),
        _ => false,
    }
}

// ── boolean ─────────────────────────────────────────────────────────

pub(super) fn normalize_boolean(raw: &Value) -> Value {
    match raw {
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "" => Value::Null,
            _ => raw.clone(),
        },
        other => other.clone(),
    }
}

pub(super) fn validate_boolean(value: &Value) -> bool {
    matches!(normalize_boolean(value), Value::Null | Value::Bool(_))
}

// ── date ────────────────────────────────────────────────────────────

/// Parse `yyyy-MM-dd`, or an RFC 3339 timestamp truncated to its date
pub(super) fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

/// Absent or unparseable input normalizes to `null`
pub(super) fn normalize_date(raw: &Value) -> Value {
    match raw {
        Value::String(s) => parse_date(s)
            .map(|d| Value::String(d.format(DATE_FORMAT).to_string()))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Cleared values are fine; non-empty text must be a date
pub(super) fn validate_date(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty() || parse_date(s).is_some(),
        _ => false,
    }
}

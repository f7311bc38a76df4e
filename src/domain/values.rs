//! Total accessors over loosely-typed exchange JSON.
//!
//! Every reader here degrades to `None` (or the supplied default) when a key is
//! absent, null, or of an unexpected type. Normalizers use these exclusively so
//! a missing field never aborts a parse; only structurally required elements
//! raise errors, and that is left to the caller.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;
use serde_json::value::Index;
use std::str::FromStr;

/// Extra request parameters. Keys the adapter does not consume are passed
/// through to the wire verbatim.
pub type Params = serde_json::Map<String, Value>;

/// Conversion from a JSON scalar into a typed value. Returns `None` on mismatch.
pub trait FromJson: Sized {
    fn from_json(value: &Value) -> Option<Self>;
}

impl FromJson for String {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl FromJson for Decimal {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => parse_decimal(s),
            // Go through the textual form so the value is never widened to f64
            Value::Number(n) => parse_decimal(&n.to_string()),
            _ => None,
        }
    }
}

impl FromJson for i64 {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(|f| f.trunc().to_i64())),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .ok()
                .or_else(|| parse_decimal(s).and_then(|d| d.trunc().to_i64())),
            _ => None,
        }
    }
}

impl FromJson for u32 {
    fn from_json(value: &Value) -> Option<Self> {
        i64::from_json(value).and_then(|v| u32::try_from(v).ok())
    }
}

impl FromJson for bool {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            Value::Number(n) => n.as_i64().map(|v| v != 0),
            _ => None,
        }
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

/// Typed accessor for object keys and array indices alike. Missing or
/// mistyped values are `None`.
pub fn get<T: FromJson, I: Index>(container: &Value, key: I) -> Option<T> {
    container.get(key).and_then(T::from_json)
}

/// Like [`get`] with an explicit fallback.
pub fn get_or<T: FromJson, I: Index>(container: &Value, key: I, default: T) -> T {
    get(container, key).unwrap_or(default)
}

/// Raw sub-value, treating JSON `null` as absent.
pub fn safe_value<'a, I: Index>(container: &'a Value, key: I) -> Option<&'a Value> {
    container.get(key).filter(|v| !v.is_null())
}

pub fn safe_string(container: &Value, key: &str) -> Option<String> {
    get(container, key)
}

/// First present of two keys.
pub fn safe_string_2(container: &Value, key1: &str, key2: &str) -> Option<String> {
    safe_string(container, key1).or_else(|| safe_string(container, key2))
}

pub fn safe_decimal(container: &Value, key: &str) -> Option<Decimal> {
    get(container, key)
}

pub fn safe_decimal_2(container: &Value, key1: &str, key2: &str) -> Option<Decimal> {
    safe_decimal(container, key1).or_else(|| safe_decimal(container, key2))
}

pub fn safe_integer(container: &Value, key: &str) -> Option<i64> {
    get(container, key)
}

/// Integer scaled by `factor` and truncated, e.g. microseconds × 0.001.
pub fn safe_integer_product(container: &Value, key: &str, factor: Decimal) -> Option<i64> {
    safe_decimal(container, key)
        .and_then(|v| v.checked_mul(factor))
        .and_then(|v| v.trunc().to_i64())
}

pub fn safe_bool(container: &Value, key: &str) -> Option<bool> {
    get(container, key)
}

/// Array under `key`, or an empty slice.
pub fn safe_array<'a>(container: &'a Value, key: &str) -> &'a [Value] {
    container
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Parses an ISO-8601 timestamp into epoch milliseconds. Absence or garbage
/// yields `None`, never zero or "now".
pub fn parse8601(value: Option<&str>) -> Option<i64> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    // Offsets without a colon, e.g. "+0000"
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.timestamp_millis());
    }
    // No offset at all: treat as UTC
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive).timestamp_millis())
}

/// Renders a parameter value the way it goes on a query string.
pub fn param_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Object fields of `value`; anything else yields an empty map.
pub fn into_params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}

/// `request` overlaid with the caller's `params`. Caller keys win.
pub fn extend(mut request: Params, params: Params) -> Params {
    for (key, value) in params {
        request.insert(key, value);
    }
    request
}

//! Textual decoding of flag values.

use crate::constants;
use crate::fs::{self, LocalFiles};
use crate::schema::Schema;
use serde_json::{Map, Number, Value};

/// Decodes `raw` into a value shaped by `schema`.
///
/// `current` is the value already held by the flag: array flags append a
/// single element to it and object flags merge `key=value` pairs into it.
/// A JSON array or object literal replaces the current value instead.
///
/// # Errors
///
/// Returns a human-readable reason if `raw` cannot be decoded.
pub fn decode(schema: &Schema, current: Option<Value>, raw: &str) -> Result<Value, String> {
    if let Some(path) = raw.strip_prefix(constants::VALUE_LOAD_JSON_FROM_FILE_PREFIX) {
        let content = read_file(path)?;
        return serde_json::from_str(&content)
            .map_err(|e| format!("file '{path}' does not contain valid JSON: {e}"));
    }
    if let Some(path) = raw.strip_prefix(constants::VALUE_LOAD_VERBATIM_FROM_FILE_PREFIX) {
        return read_file(path).map(Value::String);
    }

    match schema.schema_type.primary() {
        Some(constants::SCHEMA_TYPE_STRING) => Ok(Value::String(raw.to_string())),
        Some(constants::SCHEMA_TYPE_INTEGER) => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("expected integer, got '{raw}'")),
        Some(constants::SCHEMA_TYPE_NUMBER) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("expected number, got '{raw}'")),
        Some(constants::SCHEMA_TYPE_BOOLEAN) => parse_bool(raw)
            .map(Value::Bool)
            .ok_or_else(|| format!("expected boolean, got '{raw}'")),
        Some(constants::SCHEMA_TYPE_NULL) if raw.trim() == "null" => Ok(Value::Null),
        Some(constants::SCHEMA_TYPE_NULL) => Err(format!("expected null, got '{raw}'")),
        Some(constants::SCHEMA_TYPE_ARRAY) => decode_array(schema, current, raw),
        Some(constants::SCHEMA_TYPE_OBJECT) => decode_object(schema, current, raw),
        _ => Ok(parse_loose(raw)),
    }
}

fn decode_array(schema: &Schema, current: Option<Value>, raw: &str) -> Result<Value, String> {
    if raw.trim_start().starts_with('[') {
        return match serde_json::from_str(raw) {
            Ok(value @ Value::Array(_)) => Ok(value),
            Ok(_) | Err(_) => Err(format!("expected JSON array, got '{raw}'")),
        };
    }

    let element = match &schema.items {
        Some(items) => decode(items, None, raw)?,
        None => parse_loose(raw),
    };
    let mut items = match current {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    items.push(element);
    Ok(Value::Array(items))
}

fn decode_object(schema: &Schema, current: Option<Value>, raw: &str) -> Result<Value, String> {
    if raw.trim_start().starts_with('{') {
        return match serde_json::from_str(raw) {
            Ok(value @ Value::Object(_)) => Ok(value),
            Ok(_) | Err(_) => Err(format!("expected JSON object, got '{raw}'")),
        };
    }

    let (key, item) = split_key_value(raw)
        .ok_or_else(|| format!("expected JSON object or key=value, got '{raw}'"))?;
    let item = match schema.properties.get(&key) {
        Some(property) => decode(property, None, item)?,
        None => parse_loose(item),
    };
    let mut object = match current {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    object.insert(key, item);
    Ok(Value::Object(object))
}

/// Splits `key=value`, where the key may be a quoted JSON string so that it
/// can contain `=`.
fn split_key_value(raw: &str) -> Option<(String, &str)> {
    if raw.starts_with('"') {
        let mut escaped = false;
        for (i, c) in raw.char_indices().skip(1) {
            match c {
                '\\' if !escaped => escaped = true,
                '"' if !escaped => {
                    let key: String = serde_json::from_str(&raw[..=i]).ok()?;
                    let rest = raw[i + 1..].strip_prefix('=')?;
                    return Some((key, rest));
                }
                _ => escaped = false,
            }
        }
        return None;
    }
    let (key, value) = raw.split_once('=')?;
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" => Some(true),
        "false" | "f" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// JSON if it parses, the raw text otherwise.
fn parse_loose(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn read_file(path: &str) -> Result<String, String> {
    fs::read_value_file(&LocalFiles, path)
}

/// Renders a value the way a user would type it on the command line.
#[must_use]
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

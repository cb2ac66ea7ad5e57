//! JSON pointer (RFC 6901) writes that create missing containers.

use crate::error::Error;
use serde_json::{Map, Value};

/// A parsed pointer: its unescaped reference tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPointer {
    raw: String,
    tokens: Vec<String>,
}

impl JsonPointer {
    /// Parses `/a/b` or its URI-fragment form `#/a/b`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pointer does not start with `/` (after an
    /// optional `#`) or contains an invalid `~` escape.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let body = raw.strip_prefix('#').unwrap_or(raw);
        if body.is_empty() {
            return Ok(Self {
                raw: raw.to_string(),
                tokens: Vec::new(),
            });
        }
        let Some(rest) = body.strip_prefix('/') else {
            return Err(Error::malformed_json_pointer(raw));
        };
        let tokens = rest
            .split('/')
            .map(|token| unescape(token).ok_or_else(|| Error::malformed_json_pointer(raw)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            raw: raw.to_string(),
            tokens,
        })
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Writes `value` at this pointer inside `target`, creating intermediate
    /// objects as needed. The root pointer merges an object value into
    /// `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path runs through a scalar, indexes an array
    /// out of bounds, or writes a non-object at the root.
    pub fn set(&self, target: &mut Value, value: Value) -> Result<(), Error> {
        let Some((last, parents)) = self.tokens.split_last() else {
            return match (target, value) {
                (Value::Object(target), Value::Object(source)) => {
                    target.extend(source);
                    Ok(())
                }
                _ => Err(Error::json_pointer_apply_failed(
                    &self.raw,
                    "only an object can be written at the document root",
                )),
            };
        };

        let mut current = target;
        for token in parents {
            current = match current {
                Value::Object(map) => map
                    .entry(token.clone())
                    .or_insert_with(|| Value::Object(Map::new())),
                Value::Array(items) => {
                    let index = self.array_index(token, items.len())?;
                    if index == items.len() {
                        items.push(Value::Object(Map::new()));
                    }
                    &mut items[index]
                }
                other => {
                    return Err(Error::json_pointer_apply_failed(
                        &self.raw,
                        format!("cannot descend into {} at '{token}'", kind(other)),
                    ))
                }
            };
        }

        match current {
            Value::Object(map) => {
                map.insert(last.clone(), value);
                Ok(())
            }
            Value::Array(items) => {
                let index = self.array_index(last, items.len())?;
                if index == items.len() {
                    items.push(value);
                } else {
                    items[index] = value;
                }
                Ok(())
            }
            other => Err(Error::json_pointer_apply_failed(
                &self.raw,
                format!("cannot set '{last}' on {}", kind(other)),
            )),
        }
    }

    /// Index for `token` in an array of `len` items; `-` and `len` append.
    fn array_index(&self, token: &str, len: usize) -> Result<usize, Error> {
        if token == "-" {
            return Ok(len);
        }
        match token.parse::<usize>() {
            Ok(index) if index <= len => Ok(index),
            Ok(index) => Err(Error::json_pointer_apply_failed(
                &self.raw,
                format!("index {index} is out of bounds for an array of {len} items"),
            )),
            Err(_) => Err(Error::json_pointer_apply_failed(
                &self.raw,
                format!("'{token}' is not an array index"),
            )),
        }
    }
}

fn unescape(token: &str) -> Option<String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

//! The JSON-Schema subset operations are described with.
//!
//! Properties are kept in a `BTreeMap` so every externally observable
//! iteration (flag synthesis, completion, usage examples) is lexicographic.

use crate::constants;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The `type` keyword, which may be a single name or a list of names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSet(Vec<String>);

impl TypeSet {
    #[must_use]
    pub fn single(name: &str) -> Self {
        Self(vec![name.to_string()])
    }

    #[must_use]
    pub fn includes(&self, name: &str) -> bool {
        self.0.iter().any(|t| t == name)
    }

    /// The first non-null type name.
    #[must_use]
    pub fn primary(&self) -> Option<&str> {
        self.0
            .iter()
            .map(String::as_str)
            .find(|t| *t != constants::SCHEMA_TYPE_NULL)
            .or_else(|| self.0.first().map(String::as_str))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Serialize for TypeSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.as_slice() {
            [single] => serializer.serialize_str(single),
            many => many.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for TypeSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            One(String),
            Many(Vec<String>),
        }

        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(name) => Self(vec![name]),
            OneOrMany::Many(names) => Self(names),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type", default, skip_serializing_if = "TypeSet::is_empty")]
    pub schema_type: TypeSet,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Either a boolean or a schema; only `false` restricts anything here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    /// Vendor extensions (`x-...` keys).
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

impl Schema {
    fn of_type(name: &str) -> Self {
        Self {
            schema_type: TypeSet::single(name),
            ..Self::default()
        }
    }

    /// A closed object schema: properties outside `properties` are rejected.
    #[must_use]
    pub fn object<K: Into<String>>(
        properties: impl IntoIterator<Item = (K, Self)>,
        required: impl IntoIterator<Item = K>,
    ) -> Self {
        Self {
            properties: properties.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            required: required.into_iter().map(Into::into).collect(),
            additional_properties: Some(Value::Bool(false)),
            ..Self::of_type(constants::SCHEMA_TYPE_OBJECT)
        }
    }

    #[must_use]
    pub fn empty_object() -> Self {
        Self::object(Vec::<(String, Self)>::new(), Vec::<String>::new())
    }

    #[must_use]
    pub fn string() -> Self {
        Self::of_type(constants::SCHEMA_TYPE_STRING)
    }

    #[must_use]
    pub fn integer() -> Self {
        Self::of_type(constants::SCHEMA_TYPE_INTEGER)
    }

    #[must_use]
    pub fn number() -> Self {
        Self::of_type(constants::SCHEMA_TYPE_NUMBER)
    }

    #[must_use]
    pub fn boolean() -> Self {
        Self::of_type(constants::SCHEMA_TYPE_BOOLEAN)
    }

    #[must_use]
    pub fn null() -> Self {
        Self {
            nullable: true,
            ..Self::of_type(constants::SCHEMA_TYPE_NULL)
        }
    }

    #[must_use]
    pub fn array(items: Self) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of_type(constants::SCHEMA_TYPE_ARRAY)
        }
    }

    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    #[must_use]
    pub fn with_enum(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.enum_values = values.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    #[must_use]
    pub fn is_type(&self, name: &str) -> bool {
        self.schema_type.includes(name)
    }

    #[must_use]
    pub fn is_object(&self) -> bool {
        self.is_type(constants::SCHEMA_TYPE_OBJECT)
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        self.is_type(constants::SCHEMA_TYPE_ARRAY)
    }

    #[must_use]
    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|name| name == property)
    }

    #[must_use]
    pub fn allows_additional_properties(&self) -> bool {
        !matches!(self.additional_properties, Some(Value::Bool(false)))
    }

    /// Title, falling back to description.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.title
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.description.as_deref().filter(|s| !s.is_empty()))
    }

    /// Validates `value`, collecting every violation as `"<path>: <problem>"`.
    ///
    /// # Errors
    ///
    /// Returns the list of problems if the value does not conform.
    pub fn validate(&self, value: &Value) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();
        self.validate_at("", value, &mut problems);
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    fn validate_at(&self, path: &str, value: &Value, problems: &mut Vec<String>) {
        let location = if path.is_empty() { "/" } else { path };

        if value.is_null() {
            if !(self.schema_type.is_empty()
                || self.nullable
                || self.is_type(constants::SCHEMA_TYPE_NULL))
            {
                problems.push(format!("{location}: value must not be null"));
            }
            return;
        }

        if !self.schema_type.is_empty() && !self.schema_type.iter().any(|t| matches_type(t, value)) {
            let expected = self.schema_type.iter().collect::<Vec<_>>().join(" or ");
            problems.push(format!("{location}: expected {expected}, got {}", type_name(value)));
            return;
        }

        if !self.enum_values.is_empty() && !self.enum_values.contains(value) {
            let allowed = self
                .enum_values
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            problems.push(format!("{location}: value {value} is not one of [{allowed}]"));
        }

        match value {
            Value::Object(map) => {
                for name in &self.required {
                    if !map.contains_key(name) {
                        problems.push(format!("{location}: missing required property '{name}'"));
                    }
                }
                for (key, item) in map {
                    let child_path = format!("{path}/{}", escape_pointer_token(key));
                    match self.properties.get(key) {
                        Some(schema) => schema.validate_at(&child_path, item, problems),
                        None if !self.allows_additional_properties() => {
                            problems.push(format!("{child_path}: unexpected property"));
                        }
                        None => {}
                    }
                }
            }
            Value::Array(items) => {
                if let Some(item_schema) = &self.items {
                    for (i, item) in items.iter().enumerate() {
                        item_schema.validate_at(&format!("{path}/{i}"), item, problems);
                    }
                }
            }
            _ => {}
        }
    }
}

fn matches_type(type_name: &str, value: &Value) -> bool {
    match type_name {
        constants::SCHEMA_TYPE_STRING => value.is_string(),
        constants::SCHEMA_TYPE_INTEGER => {
            value.is_i64()
                || value.is_u64()
                || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        constants::SCHEMA_TYPE_NUMBER => value.is_number(),
        constants::SCHEMA_TYPE_BOOLEAN => value.is_boolean(),
        constants::SCHEMA_TYPE_ARRAY => value.is_array(),
        constants::SCHEMA_TYPE_OBJECT => value.is_object(),
        constants::SCHEMA_TYPE_NULL => value.is_null(),
        _ => true,
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => constants::SCHEMA_TYPE_NULL,
        Value::Bool(_) => constants::SCHEMA_TYPE_BOOLEAN,
        Value::Number(_) => constants::SCHEMA_TYPE_NUMBER,
        Value::String(_) => constants::SCHEMA_TYPE_STRING,
        Value::Array(_) => constants::SCHEMA_TYPE_ARRAY,
        Value::Object(_) => constants::SCHEMA_TYPE_OBJECT,
    }
}

/// Escapes a JSON pointer reference token (RFC 6901).
#[must_use]
pub fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn volume_schema() -> Schema {
        Schema::object(
            [
                ("name", Schema::string()),
                ("size", Schema::integer()),
                (
                    "type",
                    Schema::string().with_enum([json!("ssd"), json!("hdd")]),
                ),
                (
                    "tags",
                    Schema::array(Schema::string()),
                ),
            ],
            ["name"],
        )
    }

    #[test]
    fn deserializes_type_as_string_or_list() {
        let schema: Schema = serde_json::from_value(json!({"type": ["string", "null"]})).unwrap();
        assert!(schema.is_type("string"));
        assert!(schema.is_type("null"));
        assert_eq!(schema.schema_type.primary(), Some("string"));

        let schema: Schema = serde_json::from_value(json!({"type": "array", "items": {"type": "integer"}})).unwrap();
        assert!(schema.is_array());
        assert!(schema.items.unwrap().is_type("integer"));
    }

    #[test]
    fn keeps_vendor_extensions() {
        let schema: Schema =
            serde_json::from_value(json!({"type": "string", "x-relay-name": "zone"})).unwrap();
        assert_eq!(schema.extensions.get("x-relay-name"), Some(&json!("zone")));
    }

    #[test]
    fn accepts_valid_value() {
        let value = json!({"name": "data", "size": 10, "type": "ssd", "tags": ["a"]});
        assert!(volume_schema().validate(&value).is_ok());
    }

    #[test]
    fn collects_every_violation() {
        let value = json!({"size": "big", "type": "tape", "extra": 1, "tags": [1]});
        let problems = volume_schema().validate(&value).unwrap_err();
        assert_eq!(problems.len(), 5, "{problems:?}");
        assert!(problems.iter().any(|p| p.contains("missing required property 'name'")));
        assert!(problems.iter().any(|p| p.starts_with("/size: expected integer")));
        assert!(problems.iter().any(|p| p.starts_with("/type: value \"tape\"")));
        assert!(problems.iter().any(|p| p.starts_with("/extra: unexpected property")));
        assert!(problems.iter().any(|p| p.starts_with("/tags/0: expected string")));
    }

    #[test]
    fn integer_accepts_whole_floats() {
        assert!(Schema::integer().validate(&json!(3.0)).is_ok());
        assert!(Schema::integer().validate(&json!(3.5)).is_err());
    }

    #[test]
    fn null_requires_nullable() {
        assert!(Schema::string().validate(&Value::Null).is_err());
        let nullable = Schema {
            nullable: true,
            ..Schema::string()
        };
        assert!(nullable.validate(&Value::Null).is_ok());
        assert!(Schema::null().validate(&Value::Null).is_ok());
    }
}

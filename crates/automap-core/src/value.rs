//! Runtime value model
//!
//! Mapped data is carried in a dynamic [`Value`]: scalars, date-times, enum
//! cases, lists, generic maps and shaped objects. A generic dynamic object is
//! an [`Object`] whose shape is [`ShapeId::Dynamic`].
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

use crate::shape::ShapeId;
use crate::{Error, Result};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Longest rendering kept by [`Value::summary`]
const SUMMARY_LIMIT: usize = 64;

/// A case of a declared enumeration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// Name of the enum shape
    pub enum_id: String,
    /// Case name
    pub case: String,
}

impl EnumValue {
    pub fn new(enum_id: impl Into<String>, case: impl Into<String>) -> Self {
        Self {
            enum_id: enum_id.into(),
            case: case.into(),
        }
    }
}

/// An instance of a class or of the generic dynamic object
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub shape: ShapeId,
    pub fields: BTreeMap<String, Value>,
}

impl Object {
    pub fn new(shape: ShapeId) -> Self {
        Self {
            shape,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }
}

/// Dynamic runtime value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(DateTime<FixedOffset>),
    Enum(EnumValue),
    List(Vec<Value>),
    /// The generic associative map
    Map(BTreeMap<String, Value>),
    Object(Object),
}

impl Value {
    /// Build a class instance from field pairs
    pub fn object<K, I>(shape: impl Into<ShapeId>, fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(Object {
            shape: shape.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }

    /// Build a generic map from key/value pairs
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Name of the runtime kind, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::Enum(_) => "enum",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    /// Shape of a mappable value: objects carry theirs, maps are the generic map
    pub fn shape_id(&self) -> Result<ShapeId> {
        match self {
            Value::Object(object) => Ok(object.shape.clone()),
            Value::Map(_) => Ok(ShapeId::Map),
            other => Err(Error::UnsupportedSource {
                kind: other.kind().to_string(),
            }),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Read a field of an object or a key of a map
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(object) => object.fields.get(name),
            Value::Map(map) => map.get(name),
            _ => None,
        }
    }

    /// Mutable access to a field of an object or a key of a map
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
        match self {
            Value::Object(object) => object.fields.get_mut(name),
            Value::Map(map) => map.get_mut(name),
            _ => None,
        }
    }

    /// Write a field of an object or a key of a map; other values are left untouched
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) -> bool {
        match self {
            Value::Object(object) => {
                object.fields.insert(name.into(), value);
                true
            }
            Value::Map(map) => {
                map.insert(name.into(), value);
                true
            }
            _ => false,
        }
    }

    /// Short rendering for error messages
    pub fn summary(&self) -> String {
        let rendered = match self {
            Value::String(s) => format!("{:?}", s),
            Value::Object(object) => format!("{} {}", object.shape, self.to_json()),
            Value::Enum(e) => format!("{}::{}", e.enum_id, e.case),
            _ => self.to_json().to_string(),
        };
        if rendered.chars().count() > SUMMARY_LIMIT {
            let truncated: String = rendered.chars().take(SUMMARY_LIMIT).collect();
            format!("{}...", truncated)
        } else {
            rendered
        }
    }

    /// Convert from JSON. Objects become generic maps.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON. Shapes are dropped, date-times render as RFC 3339 and
    /// enum cases as their names. Non-finite floats become null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::DateTime(dt) => {
                serde_json::Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
            }
            Value::Enum(e) => serde_json::Value::String(e.case.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Object(object) => serde_json::Value::Object(
                object
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from_json)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<EnumValue> for Value {
    fn from(e: EnumValue) -> Self {
        Value::Enum(e)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_builds_generic_maps() {
        let value = Value::from_json(json!({"name": "John", "age": 28, "tags": ["a"], "score": 1.5}));
        assert_eq!(value.shape_id().unwrap(), ShapeId::Map);
        assert_eq!(value.field("name"), Some(&Value::from("John")));
        assert_eq!(value.field("age"), Some(&Value::Int(28)));
        assert_eq!(value.field("score"), Some(&Value::Float(1.5)));
        assert_eq!(value.field("tags"), Some(&Value::List(vec!["a".into()])));
    }

    #[test]
    fn test_scalars_have_no_shape() {
        let err = Value::Int(3).shape_id().unwrap_err();
        assert!(matches!(err, Error::UnsupportedSource { kind } if kind == "int"));
    }

    #[test]
    fn test_to_json_renders_rich_values() {
        let dt = DateTime::parse_from_rfc3339("2024-05-01T10:00:00+02:00").unwrap();
        let value = Value::object(
            "Event",
            [
                ("at", Value::DateTime(dt)),
                ("status", Value::Enum(EnumValue::new("Status", "Open"))),
                ("ratio", Value::Float(f64::NAN)),
            ],
        );
        assert_eq!(
            value.to_json(),
            json!({"at": "2024-05-01T10:00:00+02:00", "status": "Open", "ratio": null})
        );
    }

    #[test]
    fn test_summary_is_truncated() {
        let long = Value::String("x".repeat(200));
        let summary = long.summary();
        assert!(summary.ends_with("..."));
        assert!(summary.chars().count() <= SUMMARY_LIMIT + 3);
    }

    #[test]
    fn test_set_field_on_map_and_object() {
        let mut map = Value::map(Vec::<(String, Value)>::new());
        assert!(map.set_field("a", Value::Int(1)));
        let mut object = Value::Object(Object::new(ShapeId::Dynamic));
        assert!(object.set_field("a", Value::Int(1)));
        assert!(!Value::Null.set_field("a", Value::Int(1)));
        assert_eq!(map.field("a"), object.field("a"));
    }
}

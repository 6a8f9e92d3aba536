//! Type descriptors
//!
//! A [`TypeDescriptor`] is an immutable, structurally comparable description
//! of what a member may hold. Descriptors have a compact text form used by
//! shape documents:
//!
//! ```text
//! mixed bool int float string datetime map dynamic
//! enum:Status  User  list<User>  dict<string, int>  dict<int>  ?string  int|string
//! ```
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

use super::ShapeId;
use crate::{Error, Result, Value};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Scalar kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    String,
}

impl ScalarKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::String => "string",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Language-neutral description of a value's shape
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// Anything, including null
    Mixed,
    Scalar(ScalarKind),
    DateTime,
    /// A declared enumeration, by name
    Enum(String),
    /// A class, the generic map or the generic dynamic object
    Object(ShapeId),
    /// A list (`key == None`) or a keyed dictionary
    Collection {
        key: Option<Box<TypeDescriptor>>,
        value: Box<TypeDescriptor>,
    },
    Union(Vec<TypeDescriptor>),
    Nullable(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    pub fn bool() -> Self {
        Self::Scalar(ScalarKind::Bool)
    }

    pub fn int() -> Self {
        Self::Scalar(ScalarKind::Int)
    }

    pub fn float() -> Self {
        Self::Scalar(ScalarKind::Float)
    }

    pub fn string() -> Self {
        Self::Scalar(ScalarKind::String)
    }

    pub fn object(shape: impl Into<ShapeId>) -> Self {
        Self::Object(shape.into())
    }

    pub fn list(value: TypeDescriptor) -> Self {
        Self::Collection {
            key: None,
            value: Box::new(value),
        }
    }

    pub fn dict(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Collection {
            key: Some(Box::new(key)),
            value: Box::new(value),
        }
    }

    /// Wrap in a nullable. Already nullable descriptors are returned as-is.
    pub fn nullable(inner: TypeDescriptor) -> Self {
        match inner {
            Self::Nullable(_) | Self::Mixed => inner,
            other => Self::Nullable(Box::new(other)),
        }
    }

    /// Whether `null` is an acceptable value
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Mixed | Self::Nullable(_) => true,
            Self::Union(members) => members.iter().any(TypeDescriptor::is_nullable),
            _ => false,
        }
    }

    /// The descriptor without its nullable wrapper
    pub fn non_null(&self) -> TypeDescriptor {
        match self {
            Self::Nullable(inner) => inner.non_null(),
            Self::Union(members) => Self::Union(members.iter().map(|m| m.non_null()).collect()),
            other => other.clone(),
        }
    }

    /// Expand unions into their members, distributing nullability
    pub fn flatten(&self) -> Vec<TypeDescriptor> {
        match self {
            Self::Union(members) => members.iter().flat_map(|m| m.flatten()).collect(),
            Self::Nullable(inner) => match inner.as_ref() {
                Self::Union(_) => inner
                    .flatten()
                    .into_iter()
                    .map(TypeDescriptor::nullable)
                    .collect(),
                _ => vec![self.clone()],
            },
            other => vec![other.clone()],
        }
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, Self::Mixed)
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection { .. })
    }

    /// Object shape, if this is an object descriptor
    pub fn shape(&self) -> Option<&ShapeId> {
        match self {
            Self::Object(shape) => Some(shape),
            _ => None,
        }
    }

    /// Whether a runtime value is exactly of this descriptor's kind
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Mixed, _) => true,
            (Self::Nullable(_), Value::Null) => true,
            (Self::Nullable(inner), v) => inner.matches(v),
            (Self::Union(members), v) => members.iter().any(|m| m.matches(v)),
            (Self::Scalar(ScalarKind::Bool), Value::Bool(_)) => true,
            (Self::Scalar(ScalarKind::Int), Value::Int(_)) => true,
            (Self::Scalar(ScalarKind::Float), Value::Float(_)) => true,
            (Self::Scalar(ScalarKind::String), Value::String(_)) => true,
            (Self::DateTime, Value::DateTime(_)) => true,
            (Self::Enum(name), Value::Enum(e)) => &e.enum_id == name,
            (Self::Object(ShapeId::Map), Value::Map(_)) => true,
            (Self::Object(shape), Value::Object(object)) => &object.shape == shape,
            (Self::Collection { key: None, .. }, Value::List(_)) => true,
            (Self::Collection { key: Some(_), .. }, Value::Map(_)) => true,
            _ => false,
        }
    }

    /// Looser kind match: numbers match either numeric scalar, any class
    /// instance matches any class descriptor, any collection value matches any
    /// collection descriptor.
    pub fn matches_kind(&self, value: &Value) -> bool {
        if self.matches(value) {
            return true;
        }
        match (self.non_null(), value) {
            (Self::Scalar(ScalarKind::Int | ScalarKind::Float), Value::Int(_) | Value::Float(_)) => {
                true
            }
            (Self::Object(ShapeId::Class(_)), Value::Object(object)) => {
                !object.shape.is_generic()
            }
            (Self::Object(ShapeId::Dynamic | ShapeId::Map), Value::Map(_) | Value::Object(_)) => {
                true
            }
            (Self::Collection { .. }, Value::List(_) | Value::Map(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mixed => f.write_str("mixed"),
            Self::Scalar(kind) => write!(f, "{}", kind),
            Self::DateTime => f.write_str("datetime"),
            Self::Enum(name) => write!(f, "enum:{}", name),
            Self::Object(shape) => write!(f, "{}", shape),
            Self::Collection { key: None, value } => write!(f, "list<{}>", value),
            Self::Collection {
                key: Some(key),
                value,
            } => write!(f, "dict<{}, {}>", key, value),
            Self::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{}", member)?;
                }
                Ok(())
            }
            Self::Nullable(inner) => match inner.as_ref() {
                Self::Union(_) => write!(f, "?({})", inner),
                other => write!(f, "?{}", other),
            },
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = Parser { input: s, pos: 0 };
        let descriptor = parser.union()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(descriptor)
    }
}

impl Serialize for TypeDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Recursive-descent parser over the descriptor text form
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: &str) -> Error {
        Error::configuration(format!(
            "Invalid type descriptor '{}' at offset {}: {}",
            self.input, self.pos, message
        ))
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", expected)))
        }
    }

    fn union(&mut self) -> Result<TypeDescriptor> {
        let mut members = vec![self.item()?];
        while self.eat('|') {
            members.push(self.item()?);
        }
        Ok(if members.len() == 1 {
            members.remove(0)
        } else {
            TypeDescriptor::Union(members)
        })
    }

    fn item(&mut self) -> Result<TypeDescriptor> {
        if self.eat('?') {
            return Ok(TypeDescriptor::nullable(self.item()?));
        }
        if self.eat('(') {
            let inner = self.union()?;
            self.expect(')')?;
            return Ok(inner);
        }
        let name = self.name()?;
        match name {
            "mixed" => Ok(TypeDescriptor::Mixed),
            "bool" => Ok(TypeDescriptor::bool()),
            "int" => Ok(TypeDescriptor::int()),
            "float" => Ok(TypeDescriptor::float()),
            "string" => Ok(TypeDescriptor::string()),
            "datetime" => Ok(TypeDescriptor::DateTime),
            "map" => Ok(TypeDescriptor::Object(ShapeId::Map)),
            "dynamic" => Ok(TypeDescriptor::Object(ShapeId::Dynamic)),
            "list" => {
                self.expect('<')?;
                let value = self.union()?;
                self.expect('>')?;
                Ok(TypeDescriptor::list(value))
            }
            "dict" => {
                self.expect('<')?;
                let first = self.union()?;
                let descriptor = if self.eat(',') {
                    let value = self.union()?;
                    TypeDescriptor::dict(first, value)
                } else {
                    TypeDescriptor::dict(TypeDescriptor::string(), first)
                };
                self.expect('>')?;
                Ok(descriptor)
            }
            enum_name if enum_name.starts_with("enum:") => {
                let enum_name = &enum_name["enum:".len()..];
                if enum_name.is_empty() {
                    return Err(self.error("enum name is missing"));
                }
                Ok(TypeDescriptor::Enum(enum_name.to_string()))
            }
            class => Ok(TypeDescriptor::Object(ShapeId::Class(class.to_string()))),
        }
    }

    fn name(&mut self) -> Result<&'a str> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '.' | ':' | '\\' | '$' | '-') {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(self.error("expected a type name"));
        }
        Ok(&self.input[start..self.pos])
    }
}

//! Shapes: structural identities and the descriptors of their members
//!
//! A shape is either a named class/record, the generic map, or the generic
//! dynamic object. Shapes are identified by [`ShapeId`] and pairs of shapes by
//! [`ShapePair`], which is the cache key for mapping plans and mappers.
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

pub mod catalog;
pub mod descriptor;

pub use catalog::{
    ClassShape, ConstructorParam, Discriminator, EnumCase, EnumShape, MemberDecl, MethodFn,
    ReadAccess, ShapeCatalog, ShapeDocument, ShapeProvider, Visibility, WriteAccess,
};
pub use descriptor::{ScalarKind, TypeDescriptor};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Identity of a structural shape
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeId {
    /// The generic associative map
    Map,
    /// The generic dynamic object (fields without a declared class)
    Dynamic,
    /// A declared class or record
    Class(String),
}

impl ShapeId {
    /// Create a class shape identity
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }

    /// Whether the shape is untyped (generic map or dynamic object)
    pub fn is_generic(&self) -> bool {
        matches!(self, Self::Map | Self::Dynamic)
    }

    /// Class name for class shapes
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Self::Class(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeId::Map => write!(f, "map"),
            ShapeId::Dynamic => write!(f, "dynamic"),
            ShapeId::Class(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for ShapeId {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let s = s.trim();
        match s {
            "" => Err(crate::Error::configuration("Shape name cannot be empty")),
            "map" => Ok(ShapeId::Map),
            "dynamic" => Ok(ShapeId::Dynamic),
            name => Ok(ShapeId::Class(name.to_string())),
        }
    }
}

impl From<&str> for ShapeId {
    fn from(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| ShapeId::Class(s.to_string()))
    }
}

impl Serialize for ShapeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ShapeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A (source shape, target shape) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapePair {
    pub source: ShapeId,
    pub target: ShapeId,
}

impl ShapePair {
    pub fn new(source: ShapeId, target: ShapeId) -> Self {
        Self { source, target }
    }

    /// Deterministic, collision-free name of the mapper for this pair
    pub fn mapper_name(&self) -> String {
        mapper_name(&self.source, &self.target)
    }
}

impl fmt::Display for ShapePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// Build the stable identifier of the mapper for a shape pair.
///
/// Each side is escaped into `[A-Za-z0-9_]` and length-prefixed, so two
/// distinct pairs can never produce the same name. The result is usable as a
/// file name.
pub fn mapper_name(source: &ShapeId, target: &ShapeId) -> String {
    let source = escape_identifier(&source.to_string());
    let target = escape_identifier(&target.to_string());
    format!("Mapper_{}{}_{}{}", source.len(), source, target.len(), target)
}

fn escape_identifier(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' => escaped.push(c),
            '_' => escaped.push_str("__"),
            other => escaped.push_str(&format!("_u{:x}_", other as u32)),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_id_parsing() {
        assert_eq!("map".parse::<ShapeId>().unwrap(), ShapeId::Map);
        assert_eq!("dynamic".parse::<ShapeId>().unwrap(), ShapeId::Dynamic);
        assert_eq!(
            "App.User".parse::<ShapeId>().unwrap(),
            ShapeId::class("App.User")
        );
        assert!("  ".parse::<ShapeId>().is_err());
    }

    #[test]
    fn test_mapper_name_is_stable() {
        let name = mapper_name(&ShapeId::class("User"), &ShapeId::Map);
        assert_eq!(name, "Mapper_4User_3map");
        assert_eq!(name, mapper_name(&ShapeId::class("User"), &ShapeId::Map));
    }

    #[test]
    fn test_mapper_name_has_no_collisions() {
        let pairs = [
            (ShapeId::class("A_B"), ShapeId::class("C")),
            (ShapeId::class("A"), ShapeId::class("B_C")),
            (ShapeId::class("A.B"), ShapeId::class("C")),
            (ShapeId::class("A_u2e_B"), ShapeId::class("C")),
            (ShapeId::class("A1"), ShapeId::class("1C")),
            (ShapeId::class("A"), ShapeId::class("11C")),
        ];
        let names: std::collections::HashSet<String> =
            pairs.iter().map(|(s, t)| mapper_name(s, t)).collect();
        assert_eq!(names.len(), pairs.len());
        assert!(names
            .iter()
            .all(|n| n.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')));
    }

    #[test]
    fn test_shape_id_serde_uses_display_form() {
        let pair = ShapePair::new(ShapeId::class("User"), ShapeId::Dynamic);
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json, serde_json::json!({"source": "User", "target": "dynamic"}));
        let back: ShapePair = serde_json::from_value(json).unwrap();
        assert_eq!(back, pair);
    }
}

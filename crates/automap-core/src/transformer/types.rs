//! Transformer descriptions
//!
//! A [`Transformer`] is the resolved, serializable description of how one
//! member value is converted. Resolution produces transformers; a
//! [`MapperBackend`](crate::compiler::MapperBackend) turns them into callables.
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

use crate::shape::{mapper_name, ScalarKind, ShapeId, ShapePair, TypeDescriptor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A nested (source, target) mapper needed at execution time
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapperDependency {
    pub name: String,
    pub source: ShapeId,
    pub target: ShapeId,
}

impl MapperDependency {
    pub fn new(source: ShapeId, target: ShapeId) -> Self {
        Self {
            name: mapper_name(&source, &target),
            source,
            target,
        }
    }

    pub fn pair(&self) -> ShapePair {
        ShapePair::new(self.source.clone(), self.target.clone())
    }
}

/// What a custom transformer receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomScope {
    /// The whole source instance
    Member,
    /// The member value
    Value,
}

/// Output of a nullable wrapper for a null input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullOutput {
    Null,
    EmptyList,
    EmptyMap,
}

/// One branch of a runtime-dispatched transformer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub descriptor: TypeDescriptor,
    pub transformer: Transformer,
}

/// Resolved conversion of one value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transformer {
    /// Value is reused as-is
    Copy,
    /// Scalar coercion
    Cast { from: ScalarKind, to: ScalarKind },
    /// Render with a strftime format; `None` uses the call's format
    DateTimeToString { format: Option<String> },
    /// Parse with a strftime format; `None` uses the call's format
    StringToDateTime { format: Option<String> },
    DateTimeCopy,
    /// Null passes through without invoking `inner`
    Nullable {
        inner: Box<Transformer>,
        on_null: NullOutput,
    },
    /// Dispatch on the runtime kind of the value
    Multiple { branches: Vec<Branch> },
    /// Rebuild a list or dictionary element by element
    Collection {
        value: Box<Transformer>,
        key: Option<Box<Transformer>>,
        keyed: bool,
    },
    /// Delegate to the mapper of a nested shape pair
    Object { dependency: MapperDependency },
    /// Reshape between the generic map and the generic dynamic object
    Generic { to: ShapeId },
    EnumToEnum { source: String, target: String },
    EnumToScalar { source: String, to: ScalarKind },
    ScalarToEnum { target: String },
    /// A registered custom transformer, by id
    Custom { id: String, scope: CustomScope },
}

impl Transformer {
    /// Nested mappers this transformer calls into
    pub fn dependencies(&self) -> Vec<MapperDependency> {
        let mut dependencies = Vec::new();
        self.collect_dependencies(&mut dependencies);
        dependencies
    }

    fn collect_dependencies(&self, out: &mut Vec<MapperDependency>) {
        match self {
            Transformer::Object { dependency } => {
                if !out.contains(dependency) {
                    out.push(dependency.clone());
                }
            }
            Transformer::Nullable { inner, .. } => inner.collect_dependencies(out),
            Transformer::Multiple { branches } => {
                for branch in branches {
                    branch.transformer.collect_dependencies(out);
                }
            }
            Transformer::Collection { value, key, .. } => {
                value.collect_dependencies(out);
                if let Some(key) = key {
                    key.collect_dependencies(out);
                }
            }
            _ => {}
        }
    }

    /// Whether the result is a nested instance that can be populated in place
    pub fn assign_by_ref(&self) -> bool {
        match self {
            Transformer::Object { .. } => true,
            Transformer::Nullable { inner, .. } => inner.assign_by_ref(),
            _ => false,
        }
    }

    /// Target shape of a by-reference result
    pub fn object_target(&self) -> Option<&ShapeId> {
        match self {
            Transformer::Object { dependency } => Some(&dependency.target),
            Transformer::Nullable { inner, .. } => inner.object_target(),
            _ => None,
        }
    }
}

impl fmt::Display for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transformer::Copy => f.write_str("copy"),
            Transformer::Cast { from, to } => write!(f, "cast({} -> {})", from, to),
            Transformer::DateTimeToString { format } => {
                write!(f, "datetime->string({})", format.as_deref().unwrap_or("default"))
            }
            Transformer::StringToDateTime { format } => {
                write!(f, "string->datetime({})", format.as_deref().unwrap_or("default"))
            }
            Transformer::DateTimeCopy => f.write_str("datetime"),
            Transformer::Nullable { inner, .. } => write!(f, "nullable({})", inner),
            Transformer::Multiple { branches } => {
                f.write_str("match(")?;
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} => {}", branch.descriptor, branch.transformer)?;
                }
                f.write_str(")")
            }
            Transformer::Collection { value, key, keyed } => {
                let kind = if *keyed { "dict" } else { "list" };
                match key {
                    Some(key) => write!(f, "{}({}, {})", kind, key, value),
                    None => write!(f, "{}({})", kind, value),
                }
            }
            Transformer::Object { dependency } => {
                write!(f, "object({} -> {})", dependency.source, dependency.target)
            }
            Transformer::Generic { to } => write!(f, "reshape(-> {})", to),
            Transformer::EnumToEnum { source, target } => {
                write!(f, "enum({} -> {})", source, target)
            }
            Transformer::EnumToScalar { source, to } => write!(f, "enum({} -> {})", source, to),
            Transformer::ScalarToEnum { target } => write!(f, "enum(-> {})", target),
            Transformer::Custom { id, .. } => write!(f, "custom({})", id),
        }
    }
}

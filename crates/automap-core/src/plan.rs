//! Mapping plans
//!
//! A [`MappingPlan`] is the materialized result of member extraction for one
//! shape pair: ordered member mappings plus the facts about the target shape
//! the compiled mapper needs (constructor, prototype, discriminator).
//! Plans are immutable and serializable so a [`PlanStore`](crate::PlanStore)
//! can persist them.
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

use crate::extractor::{FromSourceExtractor, FromTargetExtractor, MappingExtractor, SourceTargetExtractor};
use crate::shape::{ConstructorParam, Discriminator, ShapeId, ShapePair, ShapeProvider};
use crate::transformer::{MapperDependency, ResolveContext, Transformer};
use crate::{Error, Result, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Where a member value is read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ReadPath {
    Property(String),
    MapKey(String),
    /// A registered method of the source class
    Method(String),
    /// The whole source instance (member-level custom transformers)
    WholeSource,
    /// No source member; only constructor defaults can supply a value
    Absent,
}

/// Where a member value is written to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WritePath {
    Property { name: String },
    /// Constructor argument; `readonly` members cannot be assigned afterwards
    Constructor { param: String, readonly: bool },
    MapKey { key: String },
}

impl WritePath {
    /// Field or key name written on the target
    pub fn key(&self) -> &str {
        match self {
            WritePath::Property { name } => name,
            WritePath::Constructor { param, .. } => param,
            WritePath::MapKey { key } => key,
        }
    }
}

impl fmt::Display for ReadPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadPath::Property(name) => write!(f, ".{}", name),
            ReadPath::MapKey(key) => write!(f, "[{}]", key),
            ReadPath::Method(method) => write!(f, "{}()", method),
            ReadPath::WholeSource => f.write_str("$"),
            ReadPath::Absent => f.write_str("-"),
        }
    }
}

impl fmt::Display for WritePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WritePath::Property { name } => write!(f, ".{}", name),
            WritePath::Constructor { param, readonly } => {
                write!(f, "new({}{})", param, if *readonly { ", readonly" } else { "" })
            }
            WritePath::MapKey { key } => write!(f, "[{}]", key),
        }
    }
}

/// One row per target member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberMapping {
    pub target_member: String,
    pub read: ReadPath,
    pub write: WritePath,
    pub transformer: Transformer,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub source_ignored: bool,
    #[serde(default)]
    pub target_ignored: bool,
}

impl MemberMapping {
    pub fn new(
        target_member: impl Into<String>,
        read: ReadPath,
        write: WritePath,
        transformer: Transformer,
    ) -> Self {
        Self {
            target_member: target_member.into(),
            read,
            write,
            transformer,
            source_groups: Vec::new(),
            target_groups: Vec::new(),
            max_depth: None,
            source_ignored: false,
            target_ignored: false,
        }
    }

    pub fn is_ignored(&self) -> bool {
        self.source_ignored || self.target_ignored
    }
}

/// The cacheable description of how one shape maps to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingPlan {
    pub source: ShapeId,
    pub target: ShapeId,
    pub mapper_name: String,
    /// Extractor that produced the members
    pub extractor: String,
    pub members: Vec<MemberMapping>,
    /// Target constructor parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constructor: Option<Vec<ConstructorParam>>,
    /// Field values new targets are cloned from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prototype: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,
    /// Discriminator value identifying the source class in its own hierarchy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_discriminator_value: Option<String>,
    /// Non-public target members are included
    #[serde(default)]
    pub map_non_public: bool,
    #[serde(default)]
    pub dependencies: Vec<MapperDependency>,
    /// Configuration and custom transformer set the plan was built under
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fingerprint: String,
}

impl MappingPlan {
    /// Build the plan of a shape pair.
    ///
    /// Fails with `NoMappingFound` for two generic shapes before any member
    /// work, and with `UnknownShape` for undeclared classes.
    pub fn build(pair: &ShapePair, ctx: &ResolveContext<'_>) -> Result<Self> {
        if pair.source.is_generic() && pair.target.is_generic() {
            return Err(Error::NoMappingFound {
                source_shape: pair.source.clone(),
                target_shape: pair.target.clone(),
                reason: "no convention applies between two generic shapes".to_string(),
            });
        }
        for shape in [&pair.source, &pair.target] {
            if let ShapeId::Class(name) = shape {
                if ctx.shapes.class(name).is_none() {
                    return Err(Error::UnknownShape { name: name.clone() });
                }
            }
        }

        let extractor: &dyn MappingExtractor = if pair.source.is_generic() {
            &FromTargetExtractor
        } else if pair.target.is_generic() {
            &FromSourceExtractor
        } else {
            &SourceTargetExtractor
        };
        let members = extractor.extract(pair, ctx)?;

        let target_class = pair.target.class_name().and_then(|n| ctx.shapes.class(n));
        let discriminator = target_class.and_then(|c| c.discriminator.clone());
        let source_discriminator_value = match (&discriminator, pair.source.class_name()) {
            (Some(d), Some(source)) => ctx
                .shapes
                .discriminator_value(source)
                .filter(|(property, _)| property == &d.property)
                .map(|(_, value)| value),
            _ => None,
        };

        let mut dependencies: Vec<MapperDependency> = Vec::new();
        for member in &members {
            for dependency in member.transformer.dependencies() {
                if !dependencies.contains(&dependency) {
                    dependencies.push(dependency);
                }
            }
        }
        if let Some(d) = &discriminator {
            for subtype in d.mapping.values() {
                let dependency =
                    MapperDependency::new(pair.source.clone(), ShapeId::class(subtype.as_str()));
                if dependency.target != pair.target && !dependencies.contains(&dependency) {
                    dependencies.push(dependency);
                }
            }
        }

        let plan = Self {
            source: pair.source.clone(),
            target: pair.target.clone(),
            mapper_name: pair.mapper_name(),
            extractor: extractor.name().to_string(),
            members,
            constructor: target_class.and_then(|c| c.constructor.clone()),
            prototype: target_class.and_then(|c| c.prototype.clone()),
            discriminator,
            source_discriminator_value,
            map_non_public: target_class
                .map(|c| c.map_private_members || ctx.config.map_private_members)
                .unwrap_or(false),
            dependencies,
            fingerprint: String::new(),
        };
        debug!(
            pair = %pair,
            extractor = extractor.name(),
            members = plan.members.len(),
            dependencies = plan.dependencies.len(),
            "Built mapping plan"
        );
        Ok(plan)
    }

    pub fn pair(&self) -> ShapePair {
        ShapePair::new(self.source.clone(), self.target.clone())
    }

    pub fn target_has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    pub fn is_cloneable(&self) -> bool {
        self.prototype.is_some()
    }

    /// A plan without members maps nothing but is still valid
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member(&self, target_member: &str) -> Option<&MemberMapping> {
        self.members.iter().find(|m| m.target_member == target_member)
    }
}

/// Whether a member passes the visibility rules of its class
pub(crate) fn is_visible(
    shapes: &dyn ShapeProvider,
    class: &str,
    public: bool,
    global_opt_in: bool,
) -> bool {
    public
        || global_opt_in
        || shapes
            .class(class)
            .map(|c| c.map_private_members)
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapperConfig;
    use crate::shape::{ClassShape, MemberDecl, ShapeCatalog, TypeDescriptor};
    use crate::transformer::{CustomTransformers, TransformerChain};

    fn catalog() -> ShapeCatalog {
        ShapeCatalog::new()
            .with_class(
                ClassShape::new("User")
                    .member(MemberDecl::new("name", TypeDescriptor::string()))
                    .member(MemberDecl::new("manager", TypeDescriptor::nullable(TypeDescriptor::object("User")))),
            )
            .unwrap()
            .with_class(
                ClassShape::new("UserDto")
                    .member(MemberDecl::new("name", TypeDescriptor::string()))
                    .member(MemberDecl::new("manager", TypeDescriptor::nullable(TypeDescriptor::object("UserDto"))))
                    .constructor(vec![ConstructorParam::required("name")]),
            )
            .unwrap()
    }

    fn build(shapes: &ShapeCatalog, source: ShapeId, target: ShapeId) -> Result<MappingPlan> {
        let chain = TransformerChain::default();
        let customs = CustomTransformers::new();
        let config = MapperConfig::default();
        let ctx = ResolveContext::new(&chain, shapes, &customs, &config);
        MappingPlan::build(&ShapePair::new(source, target), &ctx)
    }

    #[test]
    fn test_generic_pairs_fail_before_extraction() {
        let err = build(&ShapeCatalog::new(), ShapeId::Map, ShapeId::Map).unwrap_err();
        assert!(matches!(err, Error::NoMappingFound { .. }));
        let err = build(&ShapeCatalog::new(), ShapeId::Map, ShapeId::Dynamic).unwrap_err();
        assert!(matches!(err, Error::NoMappingFound { .. }));
    }

    #[test]
    fn test_unknown_classes_are_reported() {
        let err = build(&catalog(), ShapeId::class("User"), ShapeId::class("Ghost")).unwrap_err();
        assert!(matches!(err, Error::UnknownShape { name } if name == "Ghost"));
    }

    #[test]
    fn test_plan_records_shape_facts_and_dependencies() {
        let plan = build(&catalog(), ShapeId::class("User"), ShapeId::class("UserDto")).unwrap();
        assert_eq!(plan.extractor, "source_target");
        assert_eq!(plan.mapper_name, "Mapper_4User_7UserDto");
        assert!(plan.target_has_constructor());
        assert!(!plan.is_cloneable());
        assert_eq!(
            plan.member("name").unwrap().write,
            WritePath::Constructor {
                param: "name".into(),
                readonly: false
            }
        );
        assert_eq!(
            plan.dependencies,
            vec![MapperDependency::new(ShapeId::class("User"), ShapeId::class("UserDto"))]
        );
    }

    #[test]
    fn test_plan_serialization_round_trip() {
        let plan = build(&catalog(), ShapeId::class("User"), ShapeId::Map).unwrap();
        let json = serde_json::to_string(&plan).unwrap();
        let back: MappingPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
    }
}

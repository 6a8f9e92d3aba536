//! Compiled mappers
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

use super::emit::{emit, TransformFn};
use super::CompileEnv;
use crate::context::MapContext;
use crate::plan::{MappingPlan, ReadPath, WritePath};
use crate::shape::{ConstructorParam, Discriminator, MethodFn, ShapeId, ShapePair};
use crate::value::Object;
use crate::{Error, Result, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::trace;

/// How a member value is obtained from the source
enum MemberRead {
    Property(String),
    Method { name: String, method: MethodFn },
    WholeSource,
    Absent,
}

/// One executable member row
pub struct CompiledMember {
    name: String,
    read: MemberRead,
    write: WritePath,
    transform: TransformFn,
    source_groups: Vec<String>,
    target_groups: Vec<String>,
    max_depth: Option<usize>,
    depth_key: String,
    ignored: bool,
    nests: bool,
    object_target: Option<ShapeId>,
}

impl CompiledMember {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn write(&self) -> &WritePath {
        &self.write
    }
}

/// What a mapper produces when it creates a new target
#[derive(Debug, Clone)]
pub enum TargetKind {
    Class {
        shape: ShapeId,
        constructor: Option<Vec<ConstructorParam>>,
        prototype: Option<BTreeMap<String, Value>>,
    },
    Map,
    Dynamic,
}

/// Executable mapper for one shape pair
pub struct CompiledMapper {
    pair: ShapePair,
    name: String,
    target: TargetKind,
    members: Vec<CompiledMember>,
    discriminator: Option<Discriminator>,
    source_discriminator_value: Option<String>,
}

impl fmt::Debug for CompiledMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledMapper")
            .field("pair", &self.pair)
            .field("name", &self.name)
            .field("target", &self.target)
            .field("members", &self.member_names())
            .field("discriminator", &self.discriminator)
            .finish()
    }
}

impl CompiledMapper {
    /// Compile a plan with the closure emitter
    pub fn from_plan(plan: &MappingPlan, env: &CompileEnv<'_>) -> Result<Self> {
        let target = match &plan.target {
            ShapeId::Map => TargetKind::Map,
            ShapeId::Dynamic => TargetKind::Dynamic,
            class => TargetKind::Class {
                shape: class.clone(),
                constructor: plan.constructor.clone(),
                prototype: plan.prototype.clone(),
            },
        };

        let mut members = Vec::with_capacity(plan.members.len());
        for row in &plan.members {
            let read = match &row.read {
                ReadPath::Property(name) | ReadPath::MapKey(name) => MemberRead::Property(name.clone()),
                ReadPath::Method(name) => {
                    let method = plan
                        .source
                        .class_name()
                        .and_then(|class| env.shapes.method(class, name))
                        .ok_or_else(|| {
                            Error::configuration(format!(
                                "Method '{}' of '{}' is not registered",
                                name, plan.source
                            ))
                        })?;
                    MemberRead::Method {
                        name: name.clone(),
                        method,
                    }
                }
                ReadPath::WholeSource => MemberRead::WholeSource,
                ReadPath::Absent => MemberRead::Absent,
            };
            members.push(CompiledMember {
                name: row.target_member.clone(),
                read,
                write: row.write.clone(),
                transform: emit(&row.transformer, env)?,
                source_groups: row.source_groups.clone(),
                target_groups: row.target_groups.clone(),
                max_depth: row.max_depth,
                depth_key: format!("{}::{}", plan.target, row.target_member),
                ignored: row.is_ignored(),
                nests: !row.transformer.dependencies().is_empty(),
                object_target: row.transformer.object_target().cloned(),
            });
        }

        trace!(mapper = %plan.mapper_name, members = members.len(), "Compiled mapper");
        Ok(Self {
            pair: plan.pair(),
            name: plan.mapper_name.clone(),
            target,
            members,
            discriminator: plan.discriminator.clone(),
            source_discriminator_value: plan.source_discriminator_value.clone(),
        })
    }

    pub fn pair(&self) -> &ShapePair {
        &self.pair
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &TargetKind {
        &self.target
    }

    pub fn members(&self) -> &[CompiledMember] {
        &self.members
    }

    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name.as_str()).collect()
    }

    /// Map `source` into a new target, or into `existing` when one is supplied
    pub fn map(
        &self,
        source: &Value,
        existing: Option<Value>,
        ctx: &mut MapContext<'_>,
    ) -> Result<Value> {
        if existing.is_none() {
            if let Some(subtype) = self.select_subtype(source, ctx)? {
                let pair = ShapePair::new(self.pair.source.clone(), subtype);
                trace!(from = %self.pair, to = %pair, "Discriminator selected subtype");
                let mapper = ctx.registry().get_mapper(&pair)?;
                return mapper.map(source, None, ctx);
            }
        }

        let populating = existing.is_some();
        let mut constructor_args: BTreeMap<String, Value> = BTreeMap::new();
        let mut assignments: Vec<(String, Value)> = Vec::new();

        for member in &self.members {
            if member.ignored || !ctx.in_groups(&member.source_groups, &member.target_groups) {
                continue;
            }
            if member.nests && ctx.nesting_exhausted() {
                continue;
            }

            let method_result;
            let input = match &member.read {
                MemberRead::Property(name) => match source.field(name) {
                    Some(value) => value,
                    None => continue,
                },
                MemberRead::Method { name, method } => {
                    method_result = method(source).map_err(|err| Error::Internal {
                        message: format!("Method '{}' failed at {}", name, ctx.path()),
                        source: err,
                    })?;
                    &method_result
                }
                MemberRead::WholeSource => source,
                MemberRead::Absent => continue,
            };

            ctx.push_field(&member.name);
            let depth_entered = match member.max_depth {
                Some(max) => {
                    if !ctx.enter_depth(&member.depth_key, max) {
                        ctx.pop();
                        continue;
                    }
                    true
                }
                None => false,
            };
            let result = self.transform_member(member, input, existing.as_ref(), ctx);
            if depth_entered {
                ctx.leave_depth(&member.depth_key);
            }
            ctx.pop();
            let mut value = result?;

            if let Some(callback) = ctx.options().callbacks.get(&member.name) {
                value = callback(source, value);
            }
            if value.is_null() && ctx.options().skip_null_values {
                continue;
            }

            match &member.write {
                WritePath::Constructor { param, readonly } => {
                    if !populating {
                        constructor_args.insert(param.clone(), value);
                    } else if !readonly {
                        assignments.push((param.clone(), value));
                    }
                }
                WritePath::Property { name } | WritePath::MapKey { key: name } => {
                    assignments.push((name.clone(), value));
                }
            }
        }

        let mut target = match existing {
            Some(target) => target,
            None => self.instantiate(constructor_args, ctx)?,
        };
        for (name, value) in assignments {
            target.set_field(name, value);
        }
        Ok(target)
    }

    fn transform_member(
        &self,
        member: &CompiledMember,
        input: &Value,
        existing: Option<&Value>,
        ctx: &mut MapContext<'_>,
    ) -> Result<Value> {
        if let Some(object_target) = &member.object_target {
            if ctx.options().deep_target_to_populate && !input.is_null() {
                let nested = existing
                    .and_then(|target| target.field(member.write.key()))
                    .filter(|nested| matches!(nested, Value::Object(_) | Value::Map(_)))
                    .cloned();
                if let Some(nested) = nested {
                    return ctx.map_nested(input, object_target, Some(nested));
                }
            }
        }
        (member.transform)(input, ctx)
    }

    /// Subclass the new target must be built as, if the discriminator picks one
    fn select_subtype(&self, source: &Value, ctx: &MapContext<'_>) -> Result<Option<ShapeId>> {
        let Some(discriminator) = &self.discriminator else {
            return Ok(None);
        };
        let value = match source.field(&discriminator.property) {
            None | Some(Value::Null) => self.source_discriminator_value.clone(),
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Enum(e)) => Some(e.case.clone()),
            Some(other) => Some(other.to_string()),
        };
        let Some(value) = value else {
            return Ok(None);
        };
        match discriminator.mapping.get(&value) {
            Some(class) if self.pair.target.class_name() == Some(class.as_str()) => Ok(None),
            Some(class) => Ok(Some(ShapeId::class(class.as_str()))),
            None => Err(Error::DiscriminatorMismatch {
                target_shape: self.pair.target.clone(),
                property: discriminator.property.clone(),
                value,
                path: ctx.path(),
            }),
        }
    }

    fn instantiate(
        &self,
        mut constructor_args: BTreeMap<String, Value>,
        ctx: &MapContext<'_>,
    ) -> Result<Value> {
        match &self.target {
            TargetKind::Map => Ok(Value::Map(BTreeMap::new())),
            TargetKind::Dynamic => Ok(Value::Object(Object::new(ShapeId::Dynamic))),
            TargetKind::Class {
                shape,
                constructor,
                prototype,
            } => {
                let mut fields = prototype.clone().unwrap_or_default();
                for param in constructor.iter().flatten() {
                    let value = match (constructor_args.remove(&param.name), &param.default) {
                        (Some(value), _) => value,
                        (None, Some(default)) => default.clone(),
                        (None, None) if !param.required => Value::Null,
                        (None, None) => {
                            return Err(Error::RequiredMemberMissing {
                                target_shape: shape.clone(),
                                member: param.name.clone(),
                                path: ctx.path(),
                            })
                        }
                    };
                    fields.insert(param.name.clone(), value);
                }
                Ok(Value::Object(Object {
                    shape: shape.clone(),
                    fields,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{ClosureBackend, MapperBackend};
    use crate::config::MapperConfig;
    use crate::plan::MemberMapping;
    use crate::shape::ShapeCatalog;
    use crate::transformer::{CustomScope, CustomTransformers, Transformer};

    fn plan(members: Vec<MemberMapping>) -> MappingPlan {
        MappingPlan {
            source: ShapeId::Map,
            target: ShapeId::class("Point"),
            mapper_name: "Mapper_3map_5Point".to_string(),
            extractor: "from_target".to_string(),
            members,
            constructor: Some(vec![ConstructorParam::required("x")]),
            prototype: Some(BTreeMap::from([("label".to_string(), Value::from("origin"))])),
            discriminator: None,
            source_discriminator_value: None,
            map_non_public: false,
            dependencies: Vec::new(),
            fingerprint: String::new(),
        }
    }

    fn x_row() -> MemberMapping {
        MemberMapping::new(
            "x",
            ReadPath::MapKey("x".into()),
            WritePath::Constructor {
                param: "x".into(),
                readonly: true,
            },
            Transformer::Copy,
        )
    }

    #[test]
    fn test_compile_plan() {
        let shapes = ShapeCatalog::new();
        let customs = CustomTransformers::new();
        let config = MapperConfig::default();
        let env = CompileEnv::new(&shapes, &customs, &config);
        let mapper = ClosureBackend.compile(&plan(vec![x_row()]), &env).unwrap();
        assert_eq!(mapper.name(), "Mapper_3map_5Point");
        assert_eq!(mapper.member_names(), vec!["x"]);
        assert_eq!(mapper.members()[0].depth_key, "Point::x");
        assert!(matches!(mapper.target(), TargetKind::Class { .. }));
    }

    #[test]
    fn test_unregistered_custom_fails_compilation() {
        let shapes = ShapeCatalog::new();
        let customs = CustomTransformers::new();
        let config = MapperConfig::default();
        let env = CompileEnv::new(&shapes, &customs, &config);
        let row = MemberMapping::new(
            "x",
            ReadPath::WholeSource,
            WritePath::Property { name: "x".into() },
            Transformer::Custom {
                id: "gone".into(),
                scope: CustomScope::Member,
            },
        );
        let err = ClosureBackend.compile(&plan(vec![row]), &env).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_instantiate_uses_prototype_and_defaults() {
        let shapes = ShapeCatalog::new();
        let customs = CustomTransformers::new();
        let config = MapperConfig::default();
        let env = CompileEnv::new(&shapes, &customs, &config);
        let mut with_defaults = plan(Vec::new());
        with_defaults.constructor = Some(vec![
            ConstructorParam::optional("x", Some(Value::Int(0))),
            ConstructorParam::optional("y", None),
        ]);
        let mapper = CompiledMapper::from_plan(&with_defaults, &env).unwrap();

        let automapper = crate::AutoMapper::new(ShapeCatalog::new());
        let options = crate::MapOptions::new();
        let ctx = MapContext::new(automapper.registry(), &options);
        let point = mapper.instantiate(BTreeMap::new(), &ctx).unwrap();
        assert_eq!(point.field("label"), Some(&Value::from("origin")));
        assert_eq!(point.field("x"), Some(&Value::Int(0)));
        assert_eq!(point.field("y"), Some(&Value::Null));

        let strict = CompiledMapper::from_plan(&plan(Vec::new()), &env).unwrap();
        let err = strict.instantiate(BTreeMap::new(), &ctx).unwrap_err();
        assert!(matches!(err, Error::RequiredMemberMissing { member, .. } if member == "x"));
    }
}

//! Member mapping extraction
//!
//! Three extractors produce the member rows of a plan:
//!
//! - [`SourceTargetExtractor`]: both shapes are classes; target members are
//!   matched to same-named (or `map_from`) source members.
//! - [`FromSourceExtractor`]: class to generic shape; source members are
//!   projected into map keys or dynamic fields.
//! - [`FromTargetExtractor`]: generic shape to class; source descriptors are
//!   synthesized by degrading the target's own member types.
//!
//! Members that cannot be resolved are dropped from the plan, never emitted
//! as failing rows.
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

mod from_source;
mod from_target;
mod source_target;

pub use from_source::FromSourceExtractor;
pub use from_target::FromTargetExtractor;
pub use source_target::SourceTargetExtractor;

use crate::plan::{is_visible, MemberMapping, ReadPath, WritePath};
use crate::shape::{ClassShape, MemberDecl, ReadAccess, ShapeId, ShapePair, TypeDescriptor, WriteAccess};
use crate::transformer::{CustomScope, ResolveContext, Transformer};
use crate::{Error, Result};
use tracing::debug;

/// Produces the member mappings of a shape pair
pub trait MappingExtractor {
    fn name(&self) -> &'static str;

    fn extract(&self, pair: &ShapePair, ctx: &ResolveContext<'_>) -> Result<Vec<MemberMapping>>;
}

/// Degrade a declared type into what a generic shape can carry:
/// objects become the generic shape itself, date-times and enums become strings.
pub fn degrade(descriptor: &TypeDescriptor, generic: &ShapeId) -> TypeDescriptor {
    match descriptor {
        TypeDescriptor::Object(ShapeId::Class(_)) => TypeDescriptor::Object(generic.clone()),
        TypeDescriptor::DateTime | TypeDescriptor::Enum(_) => TypeDescriptor::string(),
        TypeDescriptor::Collection { key, value } => TypeDescriptor::Collection {
            key: key.as_ref().map(|k| Box::new(degrade(k, generic))),
            value: Box::new(degrade(value, generic)),
        },
        TypeDescriptor::Union(members) => {
            TypeDescriptor::Union(members.iter().map(|m| degrade(m, generic)).collect())
        }
        TypeDescriptor::Nullable(inner) => TypeDescriptor::nullable(degrade(inner, generic)),
        other => other.clone(),
    }
}

/// Look up the class of a pair side, rejecting generic shapes
fn class_of<'a>(
    shape: &ShapeId,
    ctx: &ResolveContext<'a>,
    extractor: &str,
) -> Result<&'a ClassShape> {
    match shape {
        ShapeId::Class(name) => ctx
            .shapes
            .class(name)
            .ok_or_else(|| Error::UnknownShape { name: name.clone() }),
        generic => Err(Error::InvalidShape {
            extractor: extractor.to_string(),
            shape: generic.clone(),
            message: "a declared class is required".to_string(),
        }),
    }
}

/// Write path of a target member, if it can be written at all
fn target_write(class: &ClassShape, member: &MemberDecl) -> Option<WritePath> {
    if class.constructor_param(&member.name).is_some() {
        return Some(WritePath::Constructor {
            param: member.name.clone(),
            readonly: member.write != WriteAccess::Property,
        });
    }
    match member.write {
        WriteAccess::Property => Some(WritePath::Property {
            name: member.name.clone(),
        }),
        WriteAccess::Constructor | WriteAccess::None => None,
    }
}

/// Read path of a source member, if it can be read at all
fn source_read(
    class: &ClassShape,
    member: &MemberDecl,
    ctx: &ResolveContext<'_>,
) -> Option<ReadPath> {
    match &member.read {
        ReadAccess::Property => Some(ReadPath::Property(member.name.clone())),
        ReadAccess::Method(method) => {
            if ctx.shapes.method(&class.name, method).is_some() {
                Some(ReadPath::Method(method.clone()))
            } else {
                debug!(
                    class = %class.name,
                    member = %member.name,
                    method = %method,
                    "Method is not registered, member is not readable"
                );
                None
            }
        }
        ReadAccess::None => None,
    }
}

fn member_visible(class: &ClassShape, member: &MemberDecl, ctx: &ResolveContext<'_>) -> bool {
    is_visible(
        ctx.shapes,
        &class.name,
        member.is_public(),
        ctx.config.map_private_members,
    )
}

/// Row for a member-level custom transformer registered on the pair
fn custom_member_row(
    pair: &ShapePair,
    member: &str,
    write: &WritePath,
    ctx: &ResolveContext<'_>,
) -> Option<MemberMapping> {
    let id = ctx.customs.find_member(&pair.source, &pair.target, member)?;
    Some(MemberMapping::new(
        member,
        ReadPath::WholeSource,
        write.clone(),
        Transformer::Custom {
            id: id.to_string(),
            scope: CustomScope::Member,
        },
    ))
}

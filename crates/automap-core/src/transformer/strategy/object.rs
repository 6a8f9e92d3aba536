//! Nested objects

use super::{single, TransformerStrategy};
use crate::shape::{ShapeId, TypeDescriptor};
use crate::transformer::{MapperDependency, ResolveContext, Transformer};

/// Object members delegate to the mapper of their shape pair
pub struct ObjectStrategy;

impl ObjectStrategy {
    fn is_known(shape: &ShapeId, ctx: &ResolveContext<'_>) -> bool {
        match shape {
            ShapeId::Class(name) => ctx.shapes.class(name).is_some(),
            _ => true,
        }
    }
}

impl TransformerStrategy for ObjectStrategy {
    fn name(&self) -> &'static str {
        "object"
    }

    fn priority(&self) -> i32 {
        2
    }

    fn try_resolve(
        &self,
        sources: &[TypeDescriptor],
        targets: &[TypeDescriptor],
        ctx: &ResolveContext<'_>,
    ) -> Option<Transformer> {
        let (TypeDescriptor::Object(source), TypeDescriptor::Object(target)) =
            single(sources, targets)?
        else {
            return None;
        };

        if source.is_generic() && target.is_generic() {
            // no mapper exists between generic shapes
            return Some(if source == target {
                Transformer::Copy
            } else {
                Transformer::Generic { to: target.clone() }
            });
        }
        if !Self::is_known(source, ctx) || !Self::is_known(target, ctx) {
            return None;
        }
        Some(Transformer::Object {
            dependency: MapperDependency::new(source.clone(), target.clone()),
        })
    }
}

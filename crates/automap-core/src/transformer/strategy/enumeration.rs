//! Enumerations

use super::{single, TransformerStrategy};
use crate::shape::{EnumShape, ScalarKind, TypeDescriptor};
use crate::transformer::{ResolveContext, Transformer};

/// Enum to enum by case name or backing value; enum to and from scalars
pub struct EnumStrategy;

impl EnumStrategy {
    fn overlaps(source: &EnumShape, target: &EnumShape) -> bool {
        source.cases.iter().any(|case| {
            target.case_by_name(&case.name).is_some()
                || case
                    .value
                    .as_ref()
                    .is_some_and(|value| target.case_by_value(value).is_some())
        })
    }
}

impl TransformerStrategy for EnumStrategy {
    fn name(&self) -> &'static str {
        "enum"
    }

    fn priority(&self) -> i32 {
        1
    }

    fn try_resolve(
        &self,
        sources: &[TypeDescriptor],
        targets: &[TypeDescriptor],
        ctx: &ResolveContext<'_>,
    ) -> Option<Transformer> {
        match single(sources, targets)? {
            (TypeDescriptor::Enum(source), TypeDescriptor::Enum(target)) => {
                if source == target {
                    return Some(Transformer::Copy);
                }
                let source_shape = ctx.shapes.enumeration(source)?;
                let target_shape = ctx.shapes.enumeration(target)?;
                Self::overlaps(source_shape, target_shape).then(|| Transformer::EnumToEnum {
                    source: source.clone(),
                    target: target.clone(),
                })
            }
            (TypeDescriptor::Enum(source), TypeDescriptor::Scalar(to)) => {
                let shape = ctx.shapes.enumeration(source)?;
                (*to == ScalarKind::String || shape.is_backed()).then(|| {
                    Transformer::EnumToScalar {
                        source: source.clone(),
                        to: *to,
                    }
                })
            }
            (TypeDescriptor::Scalar(from), TypeDescriptor::Enum(target)) => {
                let shape = ctx.shapes.enumeration(target)?;
                (*from == ScalarKind::String || shape.is_backed()).then(|| {
                    Transformer::ScalarToEnum {
                        target: target.clone(),
                    }
                })
            }
            _ => None,
        }
    }
}

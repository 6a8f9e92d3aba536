//! Mixed values and scalar coercions

use super::{single, TransformerStrategy};
use crate::shape::TypeDescriptor;
use crate::transformer::{ResolveContext, Transformer};

/// `mixed` on either side copies; scalar pairs cast
pub struct BuiltinStrategy;

impl TransformerStrategy for BuiltinStrategy {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn priority(&self) -> i32 {
        8
    }

    fn try_resolve(
        &self,
        sources: &[TypeDescriptor],
        targets: &[TypeDescriptor],
        _ctx: &ResolveContext<'_>,
    ) -> Option<Transformer> {
        match single(sources, targets)? {
            (TypeDescriptor::Mixed, _) | (_, TypeDescriptor::Mixed) => Some(Transformer::Copy),
            (TypeDescriptor::Scalar(from), TypeDescriptor::Scalar(to)) if from == to => {
                Some(Transformer::Copy)
            }
            (TypeDescriptor::Scalar(from), TypeDescriptor::Scalar(to)) => Some(Transformer::Cast {
                from: *from,
                to: *to,
            }),
            _ => None,
        }
    }
}

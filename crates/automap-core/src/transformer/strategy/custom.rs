//! Registered value-level custom transformers
//!
//! Member-level custom transformers are bound by the member extractor, which
//! knows the shape pair and member name.

use super::TransformerStrategy;
use crate::shape::TypeDescriptor;
use crate::transformer::{CustomScope, ResolveContext, Transformer};

pub struct CustomStrategy;

impl TransformerStrategy for CustomStrategy {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn priority(&self) -> i32 {
        256
    }

    fn try_resolve(
        &self,
        sources: &[TypeDescriptor],
        targets: &[TypeDescriptor],
        ctx: &ResolveContext<'_>,
    ) -> Option<Transformer> {
        ctx.customs
            .find_value(sources, targets)
            .map(|id| Transformer::Custom {
                id: id.to_string(),
                scope: CustomScope::Value,
            })
    }
}

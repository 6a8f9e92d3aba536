//! Nullable sources and targets

use super::TransformerStrategy;
use crate::shape::TypeDescriptor;
use crate::transformer::{NullOutput, ResolveContext, Transformer};

/// Resolve for the non-null descriptors; wrap when the source may be null
pub struct NullableStrategy;

impl TransformerStrategy for NullableStrategy {
    fn name(&self) -> &'static str {
        "nullable"
    }

    fn priority(&self) -> i32 {
        64
    }

    fn try_resolve(
        &self,
        sources: &[TypeDescriptor],
        targets: &[TypeDescriptor],
        ctx: &ResolveContext<'_>,
    ) -> Option<Transformer> {
        let [source] = sources else {
            return None;
        };
        let source_nullable = matches!(source, TypeDescriptor::Nullable(_));
        let target_nullable = targets.iter().any(TypeDescriptor::is_nullable);
        let target_wrapped = targets
            .iter()
            .any(|t| matches!(t, TypeDescriptor::Nullable(_)));
        if !source_nullable && !target_wrapped {
            return None;
        }

        let inner_source = source.non_null();
        let inner_targets: Vec<TypeDescriptor> =
            targets.iter().map(TypeDescriptor::non_null).collect();
        let inner = ctx.resolve(std::slice::from_ref(&inner_source), &inner_targets)?;
        if !source_nullable {
            return Some(inner);
        }

        let on_null = if target_nullable {
            NullOutput::Null
        } else {
            match inner_targets.as_slice() {
                [TypeDescriptor::Collection { key: None, .. }] => NullOutput::EmptyList,
                [TypeDescriptor::Collection { key: Some(_), .. }] => NullOutput::EmptyMap,
                _ => NullOutput::Null,
            }
        };
        Some(Transformer::Nullable {
            inner: Box::new(inner),
            on_null,
        })
    }
}

//! Lists and dictionaries

use super::{single, TransformerStrategy};
use crate::shape::TypeDescriptor;
use crate::transformer::{ResolveContext, Transformer};

/// Element-wise rebuild of a collection
pub struct CollectionStrategy;

impl TransformerStrategy for CollectionStrategy {
    fn name(&self) -> &'static str {
        "collection"
    }

    fn priority(&self) -> i32 {
        4
    }

    fn try_resolve(
        &self,
        sources: &[TypeDescriptor],
        targets: &[TypeDescriptor],
        ctx: &ResolveContext<'_>,
    ) -> Option<Transformer> {
        let (
            TypeDescriptor::Collection {
                key: source_key,
                value: source_value,
            },
            TypeDescriptor::Collection {
                key: target_key,
                value: target_value,
            },
        ) = single(sources, targets)?
        else {
            return None;
        };

        let value = ctx.resolve(
            std::slice::from_ref(&**source_value),
            std::slice::from_ref(&**target_value),
        )?;
        let key = match target_key {
            Some(target_key) => {
                // list indices are ints
                let source_key = source_key
                    .as_deref()
                    .cloned()
                    .unwrap_or_else(TypeDescriptor::int);
                let key = ctx.resolve(
                    std::slice::from_ref(&source_key),
                    std::slice::from_ref(&**target_key),
                )?;
                Some(Box::new(key))
            }
            None => None,
        };
        Some(Transformer::Collection {
            value: Box::new(value),
            keyed: key.is_some(),
            key,
        })
    }
}

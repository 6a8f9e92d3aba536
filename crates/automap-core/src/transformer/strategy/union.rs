//! Strategies collapsing multi-descriptor inputs

use super::TransformerStrategy;
use crate::shape::TypeDescriptor;
use crate::transformer::{Branch, ResolveContext, Transformer};

/// Resolve each source branch of a union independently and dispatch at runtime
pub struct MultipleSourceStrategy;

impl TransformerStrategy for MultipleSourceStrategy {
    fn name(&self) -> &'static str {
        "multiple"
    }

    fn priority(&self) -> i32 {
        128
    }

    fn try_resolve(
        &self,
        sources: &[TypeDescriptor],
        targets: &[TypeDescriptor],
        ctx: &ResolveContext<'_>,
    ) -> Option<Transformer> {
        if sources.len() < 2 {
            return None;
        }
        let mut branches: Vec<Branch> = sources
            .iter()
            .filter_map(|source| {
                ctx.resolve(std::slice::from_ref(source), targets)
                    .map(|transformer| Branch {
                        descriptor: source.clone(),
                        transformer,
                    })
            })
            .collect();
        match branches.len() {
            0 => None,
            1 => branches.pop().map(|branch| branch.transformer),
            _ => Some(Transformer::Multiple { branches }),
        }
    }
}

/// Pick one target out of several for a single source
pub struct UniqueTypeStrategy;

impl TransformerStrategy for UniqueTypeStrategy {
    fn name(&self) -> &'static str {
        "unique_type"
    }

    fn priority(&self) -> i32 {
        32
    }

    fn try_resolve(
        &self,
        sources: &[TypeDescriptor],
        targets: &[TypeDescriptor],
        ctx: &ResolveContext<'_>,
    ) -> Option<Transformer> {
        if sources.len() != 1 || targets.len() < 2 {
            return None;
        }
        let source = &sources[0];
        // exact type first
        if let Some(same) = targets.iter().find(|t| *t == source) {
            if let Some(transformer) = ctx.resolve(sources, std::slice::from_ref(same)) {
                return Some(transformer);
            }
        }
        targets
            .iter()
            .find_map(|target| ctx.resolve(sources, std::slice::from_ref(target)))
    }
}

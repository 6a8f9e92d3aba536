//! Transformer strategies
//!
//! Each strategy answers one question: can it convert values matching the
//! source descriptors into the target descriptors, and how. Strategies only
//! see normalized inputs (unions expanded, never empty).
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

mod builtin;
mod collection;
mod custom;
mod datetime;
mod enumeration;
mod nullable;
mod object;
mod union;

pub use builtin::BuiltinStrategy;
pub use collection::CollectionStrategy;
pub use custom::CustomStrategy;
pub use datetime::DateTimeStrategy;
pub use enumeration::EnumStrategy;
pub use nullable::NullableStrategy;
pub use object::ObjectStrategy;
pub use union::{MultipleSourceStrategy, UniqueTypeStrategy};

use super::chain::ResolveContext;
use super::Transformer;
use crate::shape::TypeDescriptor;

/// One unit of transformer resolution
pub trait TransformerStrategy: Send + Sync {
    /// Name used in traces
    fn name(&self) -> &'static str;

    /// Higher priorities are tried first
    fn priority(&self) -> i32;

    /// Resolve a transformer, or `None` when this strategy does not apply
    fn try_resolve(
        &self,
        sources: &[TypeDescriptor],
        targets: &[TypeDescriptor],
        ctx: &ResolveContext<'_>,
    ) -> Option<Transformer>;
}

/// The built-in strategies, highest priority first
pub fn default_strategies() -> Vec<Box<dyn TransformerStrategy>> {
    vec![
        Box::new(CustomStrategy),
        Box::new(MultipleSourceStrategy),
        Box::new(NullableStrategy),
        Box::new(UniqueTypeStrategy),
        Box::new(DateTimeStrategy),
        Box::new(BuiltinStrategy),
        Box::new(CollectionStrategy),
        Box::new(ObjectStrategy),
        Box::new(EnumStrategy),
    ]
}

/// The sole source and target descriptors, when both sides have exactly one
fn single<'a>(
    sources: &'a [TypeDescriptor],
    targets: &'a [TypeDescriptor],
) -> Option<(&'a TypeDescriptor, &'a TypeDescriptor)> {
    match (sources, targets) {
        ([source], [target]) => Some((source, target)),
        _ => None,
    }
}

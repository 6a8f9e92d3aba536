//! Transformer resolution
//!
//! This module selects, for one member, how a value declared with the
//! source descriptors becomes a value declared with the target descriptors.
//! Selection runs a prioritized chain of strategies:
//!
//! | priority | strategy | applies to |
//! |---------:|----------|------------|
//! | 256 | custom | registered value-level transformers |
//! | 128 | multiple | union sources, dispatched at runtime |
//! | 64 | nullable | nullable source or target |
//! | 32 | unique_type | one source, several targets |
//! | 16 | datetime | date-time and string |
//! | 8 | builtin | `mixed` and scalar coercions |
//! | 4 | collection | lists and dictionaries |
//! | 2 | object | nested objects and generic reshaping |
//! | 1 | enum | enumerations |
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

pub mod chain;
pub mod custom;
pub mod strategy;
pub mod types;

#[cfg(test)]
mod tests;

pub use chain::{ResolveContext, TransformerChain};
pub use custom::{
    CustomMemberTransformer, CustomTransformer, CustomTransformers, CustomValueTransformer,
};
pub use strategy::{default_strategies, TransformerStrategy};
pub use types::{Branch, CustomScope, MapperDependency, NullOutput, Transformer};

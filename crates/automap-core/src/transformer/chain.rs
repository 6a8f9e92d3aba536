//! Transformer resolution chain
//!
//! Strategies are tried in descending priority and the first one that
//! resolves wins. Strategies recurse through [`ResolveContext::resolve`], so
//! the chain is re-entrant; it memoizes nothing.
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

use super::custom::CustomTransformers;
use super::strategy::{default_strategies, TransformerStrategy};
use super::Transformer;
use crate::config::MapperConfig;
use crate::shape::{ShapeProvider, TypeDescriptor};
use std::fmt;
use tracing::trace;

/// Everything a strategy may consult while resolving
pub struct ResolveContext<'a> {
    pub chain: &'a TransformerChain,
    pub shapes: &'a dyn ShapeProvider,
    pub customs: &'a CustomTransformers,
    pub config: &'a MapperConfig,
}

impl<'a> ResolveContext<'a> {
    pub fn new(
        chain: &'a TransformerChain,
        shapes: &'a dyn ShapeProvider,
        customs: &'a CustomTransformers,
        config: &'a MapperConfig,
    ) -> Self {
        Self {
            chain,
            shapes,
            customs,
            config,
        }
    }

    /// Resolve through the whole chain
    pub fn resolve(
        &self,
        sources: &[TypeDescriptor],
        targets: &[TypeDescriptor],
    ) -> Option<Transformer> {
        self.chain.resolve(sources, targets, self)
    }
}

/// Ordered list of strategies
pub struct TransformerChain {
    strategies: Vec<Box<dyn TransformerStrategy>>,
}

impl fmt::Debug for TransformerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.strategies.iter().map(|s| (s.name(), s.priority())))
            .finish()
    }
}

impl Default for TransformerChain {
    fn default() -> Self {
        Self::new().with_strategies(default_strategies())
    }
}

impl TransformerChain {
    /// An empty chain
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Add a strategy
    pub fn with_strategy(mut self, strategy: Box<dyn TransformerStrategy>) -> Self {
        self.strategies.push(strategy);
        // Sort by priority (highest first)
        self.strategies.sort_by(|a, b| b.priority().cmp(&a.priority()));
        self
    }

    /// Add multiple strategies
    pub fn with_strategies<I>(mut self, strategies: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn TransformerStrategy>>,
    {
        self.strategies.extend(strategies);
        self.strategies.sort_by(|a, b| b.priority().cmp(&a.priority()));
        self
    }

    /// Strategy names in resolution order
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolve a transformer from source descriptors to target descriptors.
    ///
    /// Unions are expanded and an empty list stands for `mixed`.
    pub fn resolve(
        &self,
        sources: &[TypeDescriptor],
        targets: &[TypeDescriptor],
        ctx: &ResolveContext<'_>,
    ) -> Option<Transformer> {
        let sources = normalize(sources);
        let targets = normalize(targets);
        for strategy in &self.strategies {
            if let Some(transformer) = strategy.try_resolve(&sources, &targets, ctx) {
                trace!(
                    strategy = strategy.name(),
                    sources = %display_list(&sources),
                    targets = %display_list(&targets),
                    transformer = %transformer,
                    "Resolved transformer"
                );
                return Some(transformer);
            }
        }
        trace!(
            sources = %display_list(&sources),
            targets = %display_list(&targets),
            "No strategy resolved"
        );
        None
    }
}

fn normalize(descriptors: &[TypeDescriptor]) -> Vec<TypeDescriptor> {
    let mut normalized: Vec<TypeDescriptor> = Vec::new();
    for descriptor in descriptors.iter().flat_map(TypeDescriptor::flatten) {
        if !normalized.contains(&descriptor) {
            normalized.push(descriptor);
        }
    }
    if normalized.is_empty() {
        normalized.push(TypeDescriptor::Mixed);
    }
    normalized
}

fn display_list(descriptors: &[TypeDescriptor]) -> String {
    descriptors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("|")
}

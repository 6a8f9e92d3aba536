//! The mapping facade
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

use crate::compiler::{ClosureBackend, CompiledMapper, MapperBackend};
use crate::config::MapperConfig;
use crate::context::{MapContext, MapOptions};
use crate::plan::MappingPlan;
use crate::registry::MapperRegistry;
use crate::shape::{ShapeCatalog, ShapeId, ShapePair, ShapeProvider};
use crate::store::PlanStore;
use crate::transformer::{CustomTransformer, CustomTransformers, TransformerChain, TransformerStrategy};
use crate::{Result, Value};
use std::sync::Arc;
use tracing::debug;

/// What a `map` call produces
#[derive(Debug, Clone, PartialEq)]
pub enum TargetSpec {
    /// Create a new value of this shape
    Shape(ShapeId),
    /// Populate this value in place and return it
    Instance(Value),
}

impl From<ShapeId> for TargetSpec {
    fn from(shape: ShapeId) -> Self {
        TargetSpec::Shape(shape)
    }
}

impl From<&ShapeId> for TargetSpec {
    fn from(shape: &ShapeId) -> Self {
        TargetSpec::Shape(shape.clone())
    }
}

impl From<&str> for TargetSpec {
    fn from(shape: &str) -> Self {
        TargetSpec::Shape(ShapeId::from(shape))
    }
}

impl From<Value> for TargetSpec {
    fn from(instance: Value) -> Self {
        TargetSpec::Instance(instance)
    }
}

/// Convention-based object mapper
///
/// ```
/// use automap_core::{AutoMapper, ClassShape, MapOptions, MemberDecl, ShapeCatalog, TypeDescriptor, Value};
///
/// let shapes = ShapeCatalog::new()
///     .with_class(ClassShape::new("User").member(MemberDecl::new("name", TypeDescriptor::string())))
///     .unwrap();
/// let mapper = AutoMapper::new(shapes);
/// let user = mapper
///     .map(&Value::map([("name", Value::from("Ada"))]), "User", &MapOptions::default())
///     .unwrap();
/// assert_eq!(user.field("name"), Some(&Value::from("Ada")));
/// ```
#[derive(Debug)]
pub struct AutoMapper {
    registry: MapperRegistry,
}

impl AutoMapper {
    /// A mapper with the default configuration, chain and backend
    pub fn new(shapes: impl ShapeProvider + 'static) -> Self {
        Self {
            registry: MapperRegistry::new(
                Arc::new(shapes),
                TransformerChain::default(),
                CustomTransformers::new(),
                MapperConfig::default(),
                Box::new(ClosureBackend),
                None,
            ),
        }
    }

    pub fn builder() -> AutoMapperBuilder {
        AutoMapperBuilder::default()
    }

    /// Map `source` into a new value of a shape, or into an existing instance
    pub fn map(
        &self,
        source: &Value,
        target: impl Into<TargetSpec>,
        options: &MapOptions,
    ) -> Result<Value> {
        options.validate()?;
        let (target, existing) = match target.into() {
            TargetSpec::Shape(shape) => (shape, None),
            TargetSpec::Instance(instance) => (instance.shape_id()?, Some(instance)),
        };
        debug!(
            source = source.kind(),
            target = %target,
            populate = existing.is_some(),
            "Mapping value"
        );
        let mut ctx = MapContext::new(&self.registry, options);
        self.registry.map_in_context(source, &target, existing, &mut ctx)
    }

    /// Whether a mapper for the pair has been built
    pub fn has_mapper(&self, source: &ShapeId, target: &ShapeId) -> bool {
        self.registry
            .has_mapper(&ShapePair::new(source.clone(), target.clone()))
    }

    /// The compiled mapper of a pair, building it on first use
    pub fn get_mapper(&self, source: &ShapeId, target: &ShapeId) -> Result<Arc<CompiledMapper>> {
        self.registry
            .get_mapper(&ShapePair::new(source.clone(), target.clone()))
    }

    /// The plan of a pair, building it on first use
    pub fn plan(&self, source: &ShapeId, target: &ShapeId) -> Result<Arc<MappingPlan>> {
        self.registry
            .plan(&ShapePair::new(source.clone(), target.clone()))
    }

    /// Register a custom transformer and return its id.
    ///
    /// Reusing an id replaces the earlier transformer. Every mapper built so
    /// far is dropped so later calls see the new transformer.
    pub fn register_custom_transformer(
        &mut self,
        transformer: CustomTransformer,
        id: Option<&str>,
    ) -> String {
        self.registry.register_custom(transformer, id)
    }

    pub fn custom_transformer_ids(&self) -> Vec<String> {
        self.registry.customs().ids()
    }

    /// Drop every built mapper and plan
    pub fn reset(&self) {
        self.registry.reset();
    }

    pub fn config(&self) -> &MapperConfig {
        self.registry.config()
    }

    pub fn registry(&self) -> &MapperRegistry {
        &self.registry
    }
}

/// Builder for [`AutoMapper`]
#[derive(Default)]
pub struct AutoMapperBuilder {
    shapes: Option<Arc<dyn ShapeProvider>>,
    config: MapperConfig,
    strategies: Vec<Box<dyn TransformerStrategy>>,
    customs: CustomTransformers,
    store: Option<Box<dyn PlanStore>>,
    backend: Option<Box<dyn MapperBackend>>,
}

impl AutoMapperBuilder {
    pub fn shapes(mut self, shapes: impl ShapeProvider + 'static) -> Self {
        self.shapes = Some(Arc::new(shapes));
        self
    }

    pub fn shared_shapes(mut self, shapes: Arc<dyn ShapeProvider>) -> Self {
        self.shapes = Some(shapes);
        self
    }

    pub fn config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a strategy to the default chain
    pub fn strategy(mut self, strategy: Box<dyn TransformerStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn custom_transformer(mut self, transformer: CustomTransformer, id: Option<&str>) -> Self {
        self.customs.register(transformer, id);
        self
    }

    pub fn store(mut self, store: impl PlanStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn backend(mut self, backend: impl MapperBackend + 'static) -> Self {
        self.backend = Some(Box::new(backend));
        self
    }

    /// Validate the configuration and build the mapper
    pub fn build(self) -> Result<AutoMapper> {
        self.config.validate()?;
        let shapes = self
            .shapes
            .unwrap_or_else(|| Arc::new(ShapeCatalog::new()));
        let chain = TransformerChain::default().with_strategies(self.strategies);
        let backend = self
            .backend
            .unwrap_or_else(|| Box::new(ClosureBackend));
        Ok(AutoMapper {
            registry: MapperRegistry::new(
                shapes,
                chain,
                self.customs,
                self.config,
                backend,
                self.store,
            ),
        })
    }
}

//! Mapper registry
//!
//! The registry owns every compiled mapper, keyed by shape pair. Building a
//! mapper walks its plan's dependencies with an explicit worklist; each
//! mapper is registered as soon as it compiles, before any of its
//! dependencies, so recursive shape graphs terminate. Object members look
//! their mapper up at run time through [`MapperRegistry::map_in_context`].
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

use crate::compiler::{CompileEnv, CompiledMapper, MapperBackend};
use crate::config::MapperConfig;
use crate::context::MapContext;
use crate::plan::MappingPlan;
use crate::shape::{ShapeId, ShapePair, ShapeProvider};
use crate::store::PlanStore;
use crate::transformer::{CustomTransformer, CustomTransformers, ResolveContext, TransformerChain};
use crate::{Error, Result, Value};
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::{Hash, Hasher};
use std::fmt;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

#[derive(Default)]
struct RegistryState {
    mappers: HashMap<ShapePair, Arc<CompiledMapper>>,
    plans: HashMap<ShapePair, Arc<MappingPlan>>,
    /// Plan failures that fail identically on every retry
    failures: HashMap<ShapePair, Error>,
}

/// Registry of compiled mappers
pub struct MapperRegistry {
    shapes: Arc<dyn ShapeProvider>,
    chain: TransformerChain,
    customs: CustomTransformers,
    config: MapperConfig,
    backend: Box<dyn MapperBackend>,
    store: Option<Box<dyn PlanStore>>,
    /// Stored plans with another fingerprint are rebuilt
    fingerprint: String,
    state: RwLock<RegistryState>,
    build_lock: Mutex<()>,
}

impl fmt::Debug for MapperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperRegistry")
            .field("chain", &self.chain)
            .field("customs", &self.customs)
            .field("config", &self.config)
            .field("backend", &self.backend.name())
            .field("store", &self.store.is_some())
            .field("mappers", &self.mapper_pairs())
            .finish()
    }
}

impl MapperRegistry {
    pub fn new(
        shapes: Arc<dyn ShapeProvider>,
        chain: TransformerChain,
        customs: CustomTransformers,
        config: MapperConfig,
        backend: Box<dyn MapperBackend>,
        store: Option<Box<dyn PlanStore>>,
    ) -> Self {
        let fingerprint = fingerprint(&config, &customs);
        Self {
            shapes,
            chain,
            customs,
            config,
            backend,
            store,
            fingerprint,
            state: RwLock::new(RegistryState::default()),
            build_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn shapes(&self) -> &dyn ShapeProvider {
        self.shapes.as_ref()
    }

    pub fn chain(&self) -> &TransformerChain {
        &self.chain
    }

    pub fn customs(&self) -> &CustomTransformers {
        &self.customs
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Fingerprint stamped on every plan this registry builds
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, RegistryState>> {
        self.state.read().map_err(|_| Error::Internal {
            message: "Mapper registry lock poisoned".to_string(),
            source: anyhow::anyhow!("poisoned lock"),
        })
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, RegistryState>> {
        self.state.write().map_err(|_| Error::Internal {
            message: "Mapper registry lock poisoned".to_string(),
            source: anyhow::anyhow!("poisoned lock"),
        })
    }

    /// Cached mapper or cached failure of a pair
    fn lookup(&self, pair: &ShapePair) -> Result<Option<Arc<CompiledMapper>>> {
        let state = self.read_state()?;
        if let Some(mapper) = state.mappers.get(pair) {
            return Ok(Some(mapper.clone()));
        }
        if let Some(failure) = state.failures.get(pair) {
            return Err(failure
                .cached_copy()
                .unwrap_or_else(|| Error::configuration(failure.to_string())));
        }
        Ok(None)
    }

    /// Whether a mapper for the pair is compiled and registered
    pub fn has_mapper(&self, pair: &ShapePair) -> bool {
        self.read_state()
            .map(|state| state.mappers.contains_key(pair))
            .unwrap_or(false)
    }

    /// Pairs with a registered mapper, sorted
    pub fn mapper_pairs(&self) -> Vec<ShapePair> {
        let mut pairs: Vec<ShapePair> = self
            .read_state()
            .map(|state| state.mappers.keys().cloned().collect())
            .unwrap_or_default();
        pairs.sort();
        pairs
    }

    /// Get the mapper of a pair, building it and its dependencies on first use
    pub fn get_mapper(&self, pair: &ShapePair) -> Result<Arc<CompiledMapper>> {
        if let Some(mapper) = self.lookup(pair)? {
            return Ok(mapper);
        }

        let _guard = self.build_lock.lock().map_err(|_| Error::Internal {
            message: "Mapper build lock poisoned".to_string(),
            source: anyhow::anyhow!("poisoned lock"),
        })?;
        // another caller may have built it while we waited
        if let Some(mapper) = self.lookup(pair)? {
            return Ok(mapper);
        }
        self.build(pair)
    }

    /// Plan of a pair; builds the mapper when needed
    pub fn plan(&self, pair: &ShapePair) -> Result<Arc<MappingPlan>> {
        self.get_mapper(pair)?;
        self.read_state()?
            .plans
            .get(pair)
            .cloned()
            .ok_or_else(|| Error::Internal {
                message: format!("Plan of {} missing after build", pair),
                source: anyhow::anyhow!("registry out of sync"),
            })
    }

    fn build(&self, root: &ShapePair) -> Result<Arc<CompiledMapper>> {
        let mut queue = VecDeque::from([root.clone()]);
        let mut seen = HashSet::from([root.clone()]);
        let mut built = None;

        while let Some(pair) = queue.pop_front() {
            match self.build_one(&pair) {
                Ok((mapper, plan)) => {
                    {
                        let state = self.read_state()?;
                        for dependency in &plan.dependencies {
                            let next = dependency.pair();
                            let known = state.mappers.contains_key(&next)
                                || state.failures.contains_key(&next);
                            if !known && seen.insert(next.clone()) {
                                queue.push_back(next);
                            }
                        }
                    }
                    let mut state = self.write_state()?;
                    state.mappers.insert(pair.clone(), mapper.clone());
                    state.plans.insert(pair.clone(), plan);
                    debug!(pair = %pair, mapper = mapper.name(), "Registered mapper");
                    if &pair == root {
                        built = Some(mapper);
                    }
                }
                Err(err) => {
                    if let Some(copy) = err.cached_copy() {
                        self.write_state()?.failures.insert(pair.clone(), copy);
                    }
                    if &pair == root {
                        return Err(err);
                    }
                    warn!(pair = %pair, root = %root, error = %err, "Dependency mapper failed to build");
                }
            }
        }

        built.ok_or_else(|| Error::Internal {
            message: format!("Mapper for {} was not built", root),
            source: anyhow::anyhow!("worklist ended without root"),
        })
    }

    fn build_one(&self, pair: &ShapePair) -> Result<(Arc<CompiledMapper>, Arc<MappingPlan>)> {
        let env = CompileEnv::new(self.shapes.as_ref(), &self.customs, &self.config);
        if let Some(plan) = self.load_stored_plan(pair) {
            match self.backend.compile(&plan, &env) {
                Ok(mapper) => return Ok((Arc::new(mapper), Arc::new(plan))),
                Err(err) => warn!(
                    mapper = %plan.mapper_name,
                    error = %err,
                    "Stored plan failed to compile, rebuilding"
                ),
            }
        }

        let plan = self.build_plan(pair)?;
        let mapper = self.backend.compile(&plan, &env)?;
        Ok((Arc::new(mapper), Arc::new(plan)))
    }

    /// Stored plan of the pair, if one was built under the current fingerprint
    fn load_stored_plan(&self, pair: &ShapePair) -> Option<MappingPlan> {
        let store = self.store.as_ref()?;
        let name = pair.mapper_name();
        match store.load(&name) {
            Ok(Some(plan)) if plan.pair() != *pair => {
                warn!(mapper = %name, "Stored plan belongs to another pair, rebuilding");
                None
            }
            Ok(Some(plan)) if plan.fingerprint != self.fingerprint => {
                debug!(mapper = %name, "Stored plan is stale, rebuilding");
                None
            }
            Ok(plan) => plan,
            Err(err) => {
                warn!(mapper = %name, error = %err, "Plan store load failed, rebuilding");
                None
            }
        }
    }

    fn build_plan(&self, pair: &ShapePair) -> Result<MappingPlan> {
        let ctx = ResolveContext::new(&self.chain, self.shapes.as_ref(), &self.customs, &self.config);
        let mut plan = MappingPlan::build(pair, &ctx)?;
        plan.fingerprint = self.fingerprint.clone();

        if let Some(store) = &self.store {
            if let Err(err) = store.save(&plan) {
                warn!(mapper = %plan.mapper_name, error = %err, "Plan store save failed");
            }
        }
        Ok(plan)
    }

    /// Map a value with the mapper chosen by its runtime shape.
    ///
    /// With an existing target, the target shape is the existing value's own.
    pub fn map_in_context(
        &self,
        value: &Value,
        target: &ShapeId,
        existing: Option<Value>,
        ctx: &mut MapContext<'_>,
    ) -> Result<Value> {
        let source = value.shape_id()?;
        let target = match &existing {
            Some(existing) => existing.shape_id()?,
            None => target.clone(),
        };
        let pair = ShapePair::new(source, target);
        let mapper = self.get_mapper(&pair)?;

        ctx.enter_mapper(pair);
        let result = mapper.map(value, existing, ctx);
        ctx.leave_mapper();
        result
    }

    /// Register a custom transformer and drop everything built so far
    pub fn register_custom(&mut self, transformer: CustomTransformer, id: Option<&str>) -> String {
        let id = self.customs.register(transformer, id);
        self.fingerprint = fingerprint(&self.config, &self.customs);
        self.reset();
        id
    }

    /// Drop every compiled mapper, plan and cached failure, and clear the store
    pub fn reset(&self) {
        if let Ok(mut state) = self.state.write() {
            *state = RegistryState::default();
        }
        if let Some(store) = &self.store {
            if let Err(err) = store.clear() {
                warn!(error = %err, "Plan store clear failed");
            }
        }
        info!("Mapper registry reset");
    }
}

/// Hash of the configuration and custom transformer ids plans depend on
fn fingerprint(config: &MapperConfig, customs: &CustomTransformers) -> String {
    let mut hasher = DefaultHasher::new();
    format!("{:?}", config).hash(&mut hasher);
    customs.ids().hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ClosureBackend;
    use crate::shape::{ClassShape, MemberDecl, ShapeCatalog, TypeDescriptor};
    use crate::store::MemoryPlanStore;
    use crate::transformer::{CustomScope, Transformer};

    fn registry(store: Option<Box<dyn PlanStore>>) -> MapperRegistry {
        let shapes = ShapeCatalog::new()
            .with_class(
                ClassShape::new("Node")
                    .member(MemberDecl::new("label", TypeDescriptor::string()))
                    .member(MemberDecl::new(
                        "next",
                        TypeDescriptor::nullable(TypeDescriptor::object("Node")),
                    )),
            )
            .unwrap()
            .with_class(
                ClassShape::new("NodeDto")
                    .member(MemberDecl::new("label", TypeDescriptor::string()))
                    .member(MemberDecl::new(
                        "next",
                        TypeDescriptor::nullable(TypeDescriptor::object("NodeDto")),
                    )),
            )
            .unwrap();
        MapperRegistry::new(
            Arc::new(shapes),
            TransformerChain::default(),
            CustomTransformers::new(),
            MapperConfig::default(),
            Box::new(ClosureBackend),
            store,
        )
    }

    fn pair(source: &str, target: &str) -> ShapePair {
        ShapePair::new(ShapeId::from(source), ShapeId::from(target))
    }

    #[test]
    fn test_self_referencing_pair_builds_once() {
        let registry = registry(None);
        let first = registry.get_mapper(&pair("Node", "NodeDto")).unwrap();
        let second = registry.get_mapper(&pair("Node", "NodeDto")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.mapper_pairs(), vec![pair("Node", "NodeDto")]);
    }

    #[test]
    fn test_dependencies_are_registered() {
        let registry = registry(None);
        registry.get_mapper(&pair("Node", "map")).unwrap();
        assert!(registry.has_mapper(&pair("Node", "map")));
        assert!(!registry.has_mapper(&pair("map", "Node")));
    }

    #[test]
    fn test_failures_are_cached() {
        let registry = registry(None);
        let err = registry.get_mapper(&pair("map", "dynamic")).unwrap_err();
        assert!(matches!(err, Error::NoMappingFound { .. }));
        let again = registry.get_mapper(&pair("map", "dynamic")).unwrap_err();
        assert_eq!(err.to_string(), again.to_string());

        registry.reset();
        assert!(registry.read_state().unwrap().failures.is_empty());
    }

    #[test]
    fn test_plans_are_saved_to_store() {
        let registry = registry(Some(Box::new(MemoryPlanStore::new())));
        let plan = registry.plan(&pair("Node", "NodeDto")).unwrap();
        let stored = registry
            .store
            .as_ref()
            .unwrap()
            .load(&plan.mapper_name)
            .unwrap()
            .unwrap();
        assert_eq!(&stored, plan.as_ref());
    }

    #[test]
    fn test_stored_plan_is_reused() {
        let store = MemoryPlanStore::new();
        let mut plan = registry(None).plan(&pair("Node", "NodeDto")).unwrap().as_ref().clone();
        plan.members.retain(|m| m.target_member == "label");
        store.save(&plan).unwrap();

        let registry = registry(Some(Box::new(store)));
        let loaded = registry.plan(&pair("Node", "NodeDto")).unwrap();
        assert_eq!(loaded.members.len(), 1);
    }

    #[test]
    fn test_stale_stored_plan_is_rebuilt() {
        let store = MemoryPlanStore::new();
        let mut plan = registry(None).plan(&pair("Node", "NodeDto")).unwrap().as_ref().clone();
        plan.members.retain(|m| m.target_member == "label");
        plan.fingerprint = "built-under-another-config".to_string();
        store.save(&plan).unwrap();

        let registry = registry(Some(Box::new(store)));
        let rebuilt = registry.plan(&pair("Node", "NodeDto")).unwrap();
        assert_eq!(rebuilt.members.len(), 2);
        assert_eq!(rebuilt.fingerprint, registry.fingerprint());
    }

    #[test]
    fn test_uncompilable_stored_plan_is_rebuilt_not_cached() {
        let store = MemoryPlanStore::new();
        let mut plan = registry(None).plan(&pair("Node", "NodeDto")).unwrap().as_ref().clone();
        for member in &mut plan.members {
            member.transformer = Transformer::Custom {
                id: "gone".to_string(),
                scope: CustomScope::Member,
            };
        }
        store.save(&plan).unwrap();

        let registry = registry(Some(Box::new(store)));
        let mapper = registry.get_mapper(&pair("Node", "NodeDto")).unwrap();
        assert_eq!(mapper.member_names().len(), 2);
        assert!(registry.read_state().unwrap().failures.is_empty());

        let saved = registry
            .store
            .as_ref()
            .unwrap()
            .load(&plan.mapper_name)
            .unwrap()
            .unwrap();
        assert!(saved
            .members
            .iter()
            .all(|m| !matches!(m.transformer, Transformer::Custom { .. })));
    }

    #[test]
    fn test_fingerprint_tracks_custom_transformers() {
        let mut registry = registry(None);
        let before = registry.fingerprint().to_string();
        registry.register_custom(
            crate::transformer::CustomTransformer::member("Node", "NodeDto", "label", |v| {
                Ok(v.clone())
            }),
            None,
        );
        assert_ne!(registry.fingerprint(), before);
    }

    #[test]
    fn test_concurrent_callers_share_one_mapper() {
        let registry = registry(None);
        let mappers: Vec<Arc<CompiledMapper>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| registry.get_mapper(&pair("Node", "NodeDto")).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(mappers.len(), 8);
        assert!(mappers.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(registry.mapper_pairs(), vec![pair("Node", "NodeDto")]);
    }
}

//! Mapper compilation
//!
//! A [`MapperBackend`] turns a [`MappingPlan`] into an executable
//! [`CompiledMapper`]. The default [`ClosureBackend`] emits one closure per
//! member transformer; object members call back into the registry at run
//! time, so mappers for recursive shapes never reference each other directly.
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

pub mod emit;
pub mod mapper;

pub use emit::{emit, transform, TransformFn};
pub use mapper::{CompiledMapper, CompiledMember, TargetKind};

use crate::config::MapperConfig;
use crate::plan::MappingPlan;
use crate::shape::ShapeProvider;
use crate::transformer::CustomTransformers;
use crate::Result;

/// What a backend can see while compiling
pub struct CompileEnv<'a> {
    pub shapes: &'a dyn ShapeProvider,
    pub customs: &'a CustomTransformers,
    pub config: &'a MapperConfig,
}

impl<'a> CompileEnv<'a> {
    pub fn new(
        shapes: &'a dyn ShapeProvider,
        customs: &'a CustomTransformers,
        config: &'a MapperConfig,
    ) -> Self {
        Self {
            shapes,
            customs,
            config,
        }
    }
}

/// Turns plans into executable mappers
pub trait MapperBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn compile(&self, plan: &MappingPlan, env: &CompileEnv<'_>) -> Result<CompiledMapper>;
}

/// Compiles plans into closure trees
#[derive(Debug, Default, Clone, Copy)]
pub struct ClosureBackend;

impl MapperBackend for ClosureBackend {
    fn name(&self) -> &'static str {
        "closure"
    }

    fn compile(&self, plan: &MappingPlan, env: &CompileEnv<'_>) -> Result<CompiledMapper> {
        CompiledMapper::from_plan(plan, env)
    }
}

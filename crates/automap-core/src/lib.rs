//! Automap Core - Convention-based, type-directed object mapping
//!
//! This crate maps values between shapes (declared classes, the generic map
//! and the generic dynamic object) by matching members by name and picking a
//! value transformer for each member from their declared types.
//!
//! # Main Components
//!
//! - **Shapes**: Type descriptors and the catalog of classes and enumerations
//! - **Transformers**: A prioritized chain of strategies selecting per-member conversions
//! - **Extractors**: Source-Target, From-Source and From-Target member matching
//! - **Plans**: Serializable per-pair mapping plans, optionally persisted in a store
//! - **Registry**: Compiled mappers with late binding for recursive shapes
//! - **Execution**: Groups, depth limits, discriminators, callbacks and populate mode
//!
//! # Example
//!
//! ```
//! use automap_core::{AutoMapper, ClassShape, MapOptions, MemberDecl, ShapeCatalog, ShapeId, TypeDescriptor, Value};
//!
//! fn example() -> automap_core::Result<()> {
//!     let shapes = ShapeCatalog::new().with_class(
//!         ClassShape::new("User")
//!             .member(MemberDecl::new("firstName", TypeDescriptor::string()))
//!             .member(MemberDecl::new("age", TypeDescriptor::int())),
//!     )?;
//!     let mapper = AutoMapper::new(shapes);
//!
//!     let source = Value::map([("firstName", Value::from("John")), ("age", Value::from(42))]);
//!     let user = mapper.map(&source, "User", &MapOptions::default())?;
//!     assert_eq!(user.field("age"), Some(&Value::Int(42)));
//!
//!     let back = mapper.map(&user, ShapeId::Map, &MapOptions::default())?;
//!     assert_eq!(back.field("firstName"), Some(&Value::from("John")));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod automapper;
pub mod compiler;
pub mod config;
pub mod context;
pub mod error;
pub mod extractor;
pub mod plan;
pub mod registry;
pub mod shape;
pub mod store;
pub mod transformer;
pub mod value;

#[cfg(test)]
mod proptest_strategies;

// Re-export main types for convenience
pub use automapper::{AutoMapper, AutoMapperBuilder, TargetSpec};
pub use compiler::{ClosureBackend, CompileEnv, CompiledMapper, MapperBackend};
pub use config::{MapperConfig, NameConvention, DEFAULT_DATETIME_FORMAT};
pub use context::{MapContext, MapOptions, MemberCallback};
pub use error::{Error, Result};
pub use plan::{MappingPlan, MemberMapping, ReadPath, WritePath};
pub use registry::MapperRegistry;
pub use shape::{
    // Shape identity
    ShapeId, ShapePair,

    // Type descriptors
    ScalarKind, TypeDescriptor,

    // Declarations
    ClassShape, ConstructorParam, Discriminator, EnumCase, EnumShape, MemberDecl,
    ReadAccess, Visibility, WriteAccess,

    // Catalog
    ShapeCatalog, ShapeDocument, ShapeProvider,
};
pub use store::{FilePlanStore, MemoryPlanStore, PlanStore};
pub use transformer::{
    CustomMemberTransformer, CustomTransformer, CustomValueTransformer, Transformer,
    TransformerChain, TransformerStrategy,
};
pub use value::{EnumValue, Object, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

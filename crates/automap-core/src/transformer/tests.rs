//! Tests for transformer resolution

use super::*;
use crate::config::MapperConfig;
use crate::proptest_strategies::descriptor_strategy;
use crate::shape::{ClassShape, EnumShape, ScalarKind, ShapeCatalog, ShapeId, TypeDescriptor};
use crate::Value;
use proptest::prelude::*;

struct Fixture {
    chain: TransformerChain,
    shapes: ShapeCatalog,
    customs: CustomTransformers,
    config: MapperConfig,
}

impl Fixture {
    fn new() -> Self {
        let shapes = ShapeCatalog::new()
            .with_class(ClassShape::new("User"))
            .unwrap()
            .with_class(ClassShape::new("UserDto"))
            .unwrap()
            .with_enum(EnumShape::new("Color").case("Red").case("Green"))
            .unwrap()
            .with_enum(EnumShape::new("Paint").case("Green").case("Blue"))
            .unwrap()
            .with_enum(EnumShape::new("Size").case("Small").case("Large"))
            .unwrap()
            .with_enum(
                EnumShape::new("Level")
                    .backed_case("Low", 1)
                    .backed_case("High", 2),
            )
            .unwrap();
        Self {
            chain: TransformerChain::default(),
            shapes,
            customs: CustomTransformers::new(),
            config: MapperConfig::default(),
        }
    }

    fn resolve(&self, source: &str, target: &str) -> Option<Transformer> {
        let ctx = ResolveContext::new(&self.chain, &self.shapes, &self.customs, &self.config);
        ctx.resolve(&[parse(source)], &[parse(target)])
    }
}

fn parse(s: &str) -> TypeDescriptor {
    s.parse().unwrap()
}

#[test]
fn test_strategies_are_sorted_by_priority() {
    let chain = TransformerChain::default();
    assert_eq!(
        chain.strategy_names(),
        vec![
            "custom",
            "multiple",
            "nullable",
            "unique_type",
            "datetime",
            "builtin",
            "collection",
            "object",
            "enum"
        ]
    );
}

#[test]
fn test_scalar_resolution() {
    let fixture = Fixture::new();
    assert_eq!(fixture.resolve("string", "string"), Some(Transformer::Copy));
    assert_eq!(
        fixture.resolve("int", "string"),
        Some(Transformer::Cast {
            from: ScalarKind::Int,
            to: ScalarKind::String
        })
    );
    assert_eq!(fixture.resolve("mixed", "User"), Some(Transformer::Copy));
    assert_eq!(fixture.resolve("int", "User"), None);
}

#[test]
fn test_undeclared_types_copy() {
    let fixture = Fixture::new();
    let ctx = ResolveContext::new(
        &fixture.chain,
        &fixture.shapes,
        &fixture.customs,
        &fixture.config,
    );
    assert_eq!(ctx.resolve(&[], &[parse("int")]), Some(Transformer::Copy));
}

#[test]
fn test_nullable_wraps_only_nullable_sources() {
    let fixture = Fixture::new();
    assert_eq!(
        fixture.resolve("?int", "?string"),
        Some(Transformer::Nullable {
            inner: Box::new(Transformer::Cast {
                from: ScalarKind::Int,
                to: ScalarKind::String
            }),
            on_null: NullOutput::Null,
        })
    );
    assert_eq!(fixture.resolve("int", "?int"), Some(Transformer::Copy));
    assert!(matches!(
        fixture.resolve("?list<int>", "list<int>"),
        Some(Transformer::Nullable {
            on_null: NullOutput::EmptyList,
            ..
        })
    ));
}

#[test]
fn test_union_source_dispatches() {
    let fixture = Fixture::new();
    let transformer = fixture.resolve("int|datetime", "string").unwrap();
    match transformer {
        Transformer::Multiple { branches } => {
            assert_eq!(branches.len(), 2);
            assert_eq!(branches[0].descriptor, parse("int"));
            assert_eq!(
                branches[1].transformer,
                Transformer::DateTimeToString { format: None }
            );
        }
        other => panic!("expected dispatch, got {}", other),
    }
}

#[test]
fn test_union_with_single_resolvable_branch_unwraps() {
    let fixture = Fixture::new();
    // list<int> cannot become a string
    assert_eq!(
        fixture.resolve("int|list<int>", "string"),
        Some(Transformer::Cast {
            from: ScalarKind::Int,
            to: ScalarKind::String
        })
    );
}

#[test]
fn test_union_target_prefers_exact_type() {
    let fixture = Fixture::new();
    assert_eq!(fixture.resolve("string", "int|string"), Some(Transformer::Copy));
    assert_eq!(
        fixture.resolve("float", "User|int"),
        Some(Transformer::Cast {
            from: ScalarKind::Float,
            to: ScalarKind::Int
        })
    );
}

#[test]
fn test_collections_resolve_elements_and_keys() {
    let fixture = Fixture::new();
    assert_eq!(
        fixture.resolve("list<User>", "list<UserDto>"),
        Some(Transformer::Collection {
            value: Box::new(Transformer::Object {
                dependency: MapperDependency::new(
                    ShapeId::class("User"),
                    ShapeId::class("UserDto")
                )
            }),
            key: None,
            keyed: false,
        })
    );
    let keyed = fixture.resolve("list<int>", "dict<string, int>").unwrap();
    assert!(matches!(keyed, Transformer::Collection { keyed: true, .. }));
    assert_eq!(fixture.resolve("list<int>", "list<User>"), None);
}

#[test]
fn test_object_dependencies_and_generic_shapes() {
    let fixture = Fixture::new();
    let transformer = fixture.resolve("?User", "?UserDto").unwrap();
    assert!(transformer.assign_by_ref());
    assert_eq!(
        transformer.dependencies(),
        vec![MapperDependency::new(
            ShapeId::class("User"),
            ShapeId::class("UserDto")
        )]
    );
    assert_eq!(fixture.resolve("map", "map"), Some(Transformer::Copy));
    assert_eq!(
        fixture.resolve("map", "dynamic"),
        Some(Transformer::Generic {
            to: ShapeId::Dynamic
        })
    );
    assert_eq!(fixture.resolve("User", "Unknown"), None);
}

#[test]
fn test_enum_resolution() {
    let fixture = Fixture::new();
    assert_eq!(fixture.resolve("enum:Color", "enum:Color"), Some(Transformer::Copy));
    assert!(matches!(
        fixture.resolve("enum:Color", "enum:Paint"),
        Some(Transformer::EnumToEnum { .. })
    ));
    // no case in common
    assert_eq!(fixture.resolve("enum:Color", "enum:Size"), None);
    assert!(matches!(
        fixture.resolve("enum:Level", "int"),
        Some(Transformer::EnumToScalar {
            to: ScalarKind::Int,
            ..
        })
    ));
    assert_eq!(fixture.resolve("enum:Color", "int"), None);
    assert!(matches!(
        fixture.resolve("string", "enum:Color"),
        Some(Transformer::ScalarToEnum { .. })
    ));
}

#[test]
fn test_custom_value_transformer_takes_precedence() {
    let mut fixture = Fixture::new();
    fixture.customs.register(
        CustomTransformer::value(TypeDescriptor::int(), TypeDescriptor::string(), |v| {
            Ok(Value::from(format!("#{}", v)))
        }),
        Some("hash"),
    );
    assert_eq!(
        fixture.resolve("int", "string"),
        Some(Transformer::Custom {
            id: "hash".to_string(),
            scope: CustomScope::Value
        })
    );
    // applies inside collections too
    assert!(matches!(
        fixture.resolve("list<int>", "list<string>"),
        Some(Transformer::Collection { value, .. }) if matches!(*value, Transformer::Custom { .. })
    ));
}

#[test]
fn test_transformer_serializes_with_type_tag() {
    let transformer = Transformer::Nullable {
        inner: Box::new(Transformer::Cast {
            from: ScalarKind::Int,
            to: ScalarKind::String,
        }),
        on_null: NullOutput::Null,
    };
    let json = serde_json::to_value(&transformer).unwrap();
    assert_eq!(json["type"], "nullable");
    assert_eq!(json["inner"]["type"], "cast");
    assert_eq!(json["inner"]["to"], "string");
    let back: Transformer = serde_json::from_value(json).unwrap();
    assert_eq!(back, transformer);
}

proptest! {
    #[test]
    fn prop_same_descriptor_always_resolves(descriptor in descriptor_strategy()) {
        let fixture = Fixture::new();
        let ctx = ResolveContext::new(&fixture.chain, &fixture.shapes, &fixture.customs, &fixture.config);
        let resolved = ctx.resolve(std::slice::from_ref(&descriptor), std::slice::from_ref(&descriptor));
        prop_assert!(resolved.is_some(), "no transformer for {}", descriptor);
    }

    #[test]
    fn prop_descriptor_text_round_trips(descriptor in descriptor_strategy()) {
        let text = descriptor.to_string();
        let parsed: TypeDescriptor = text.parse().unwrap();
        prop_assert_eq!(parsed, descriptor);
    }
}

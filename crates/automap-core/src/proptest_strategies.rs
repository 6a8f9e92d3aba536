//! Property-based testing strategies for generating test data
//!
//! Generated descriptors only reference the shapes registered by the
//! transformer test fixture: class `User` and enum `Color`.

#![cfg(test)]

use crate::shape::{ScalarKind, ShapeId, TypeDescriptor};
use crate::Value;
use proptest::prelude::*;

/// Strategy for generating scalar kinds
pub fn scalar_kind_strategy() -> impl Strategy<Value = ScalarKind> {
    prop_oneof![
        Just(ScalarKind::Bool),
        Just(ScalarKind::Int),
        Just(ScalarKind::Float),
        Just(ScalarKind::String),
    ]
}

fn leaf_descriptor_strategy() -> impl Strategy<Value = TypeDescriptor> {
    prop_oneof![
        Just(TypeDescriptor::Mixed),
        scalar_kind_strategy().prop_map(TypeDescriptor::Scalar),
        Just(TypeDescriptor::DateTime),
        Just(TypeDescriptor::Enum("Color".to_string())),
        Just(TypeDescriptor::Object(ShapeId::class("User"))),
        Just(TypeDescriptor::Object(ShapeId::Map)),
        Just(TypeDescriptor::Object(ShapeId::Dynamic)),
    ]
}

/// Strategy for generating well-formed descriptors
pub fn descriptor_strategy() -> impl Strategy<Value = TypeDescriptor> {
    leaf_descriptor_strategy().prop_recursive(3, 16, 3, |inner| {
        let non_union = inner
            .clone()
            .prop_filter("nested unions are flattened", |d| {
                !matches!(d, TypeDescriptor::Union(_))
            });
        prop_oneof![
            inner.clone().prop_map(TypeDescriptor::list),
            (
                prop_oneof![Just(TypeDescriptor::string()), Just(TypeDescriptor::int())],
                inner.clone()
            )
                .prop_map(|(key, value)| TypeDescriptor::dict(key, value)),
            inner.prop_map(TypeDescriptor::nullable),
            proptest::collection::vec(non_union, 2..4).prop_map(TypeDescriptor::Union),
        ]
    })
}

/// Strategy for generating a value of a scalar kind
pub fn scalar_value_strategy(kind: ScalarKind) -> BoxedStrategy<Value> {
    match kind {
        ScalarKind::Bool => any::<bool>().prop_map(Value::Bool).boxed(),
        ScalarKind::Int => any::<i64>().prop_map(Value::Int).boxed(),
        ScalarKind::Float => (-1.0e12f64..1.0e12).prop_map(Value::Float).boxed(),
        ScalarKind::String => "[a-zA-Z0-9 ._-]{0,24}".prop_map(Value::String).boxed(),
    }
}

//! User supplied transformers
//!
//! Custom transformers bypass convention. Member-level ones are bound to one
//! target member of a shape pair and receive the whole source instance;
//! value-level ones are matched on descriptors and receive the member value.
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

use crate::shape::{ShapeId, TypeDescriptor};
use crate::Value;
use std::fmt;
use std::sync::Arc;

/// Transformer bound to a single target member
pub trait CustomMemberTransformer: Send + Sync {
    /// Whether this transformer produces `member` when mapping `source` to `target`
    fn supports(&self, source: &ShapeId, target: &ShapeId, member: &str) -> bool;

    /// Produce the member value from the whole source instance
    fn transform(&self, source: &Value) -> anyhow::Result<Value>;
}

/// Transformer matched on declared member descriptors
pub trait CustomValueTransformer: Send + Sync {
    fn supports(&self, sources: &[TypeDescriptor], targets: &[TypeDescriptor]) -> bool;

    fn transform(&self, value: &Value) -> anyhow::Result<Value>;
}

/// A registered custom transformer
#[derive(Clone)]
pub enum CustomTransformer {
    Member(Arc<dyn CustomMemberTransformer>),
    Value(Arc<dyn CustomValueTransformer>),
}

impl fmt::Debug for CustomTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomTransformer::Member(_) => f.write_str("CustomTransformer::Member"),
            CustomTransformer::Value(_) => f.write_str("CustomTransformer::Value"),
        }
    }
}

impl CustomTransformer {
    /// Member-level transformer from a closure
    pub fn member<F>(
        source: impl Into<ShapeId>,
        target: impl Into<ShapeId>,
        member: impl Into<String>,
        f: F,
    ) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        CustomTransformer::Member(Arc::new(MemberFn {
            source: source.into(),
            target: target.into(),
            member: member.into(),
            f,
        }))
    }

    /// Value-level transformer for one exact (source, target) descriptor pair
    pub fn value<F>(source: TypeDescriptor, target: TypeDescriptor, f: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        CustomTransformer::Value(Arc::new(ValueFn { source, target, f }))
    }

    /// Apply to the input the scope of this transformer expects
    pub fn apply(&self, input: &Value) -> anyhow::Result<Value> {
        match self {
            CustomTransformer::Member(t) => t.transform(input),
            CustomTransformer::Value(t) => t.transform(input),
        }
    }
}

struct MemberFn<F> {
    source: ShapeId,
    target: ShapeId,
    member: String,
    f: F,
}

impl<F> CustomMemberTransformer for MemberFn<F>
where
    F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync,
{
    fn supports(&self, source: &ShapeId, target: &ShapeId, member: &str) -> bool {
        &self.source == source && &self.target == target && self.member == member
    }

    fn transform(&self, source: &Value) -> anyhow::Result<Value> {
        (self.f)(source)
    }
}

struct ValueFn<F> {
    source: TypeDescriptor,
    target: TypeDescriptor,
    f: F,
}

impl<F> CustomValueTransformer for ValueFn<F>
where
    F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync,
{
    fn supports(&self, sources: &[TypeDescriptor], targets: &[TypeDescriptor]) -> bool {
        sources == std::slice::from_ref(&self.source) && targets.contains(&self.target)
    }

    fn transform(&self, value: &Value) -> anyhow::Result<Value> {
        (self.f)(value)
    }
}

/// Registry of custom transformers. Later registrations take precedence.
#[derive(Debug, Clone, Default)]
pub struct CustomTransformers {
    entries: Vec<(String, CustomTransformer)>,
    next_id: usize,
}

impl CustomTransformers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transformer, replacing any previous one with the same id
    pub fn register(&mut self, transformer: CustomTransformer, id: Option<&str>) -> String {
        let id = match id {
            Some(id) => id.to_string(),
            None => {
                self.next_id += 1;
                format!("custom_{}", self.next_id)
            }
        };
        self.entries.retain(|(existing, _)| existing != &id);
        self.entries.push((id.clone(), transformer));
        id
    }

    pub fn get(&self, id: &str) -> Option<&CustomTransformer> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, t)| t)
    }

    /// Registered ids, in registration order
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Member-level transformer for a target member, if any
    pub fn find_member(&self, source: &ShapeId, target: &ShapeId, member: &str) -> Option<&str> {
        self.entries.iter().rev().find_map(|(id, t)| match t {
            CustomTransformer::Member(m) if m.supports(source, target, member) => Some(id.as_str()),
            _ => None,
        })
    }

    /// Value-level transformer for a descriptor pair, if any
    pub fn find_value(&self, sources: &[TypeDescriptor], targets: &[TypeDescriptor]) -> Option<&str> {
        self.entries.iter().rev().find_map(|(id, t)| match t {
            CustomTransformer::Value(v) if v.supports(sources, targets) => Some(id.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_and_explicit_ids() {
        let mut customs = CustomTransformers::new();
        let first = customs.register(
            CustomTransformer::value(TypeDescriptor::int(), TypeDescriptor::string(), |v| {
                Ok(Value::from(format!("#{}", v)))
            }),
            None,
        );
        let named = customs.register(
            CustomTransformer::member("User", "UserDto", "name", |_| Ok(Value::Null)),
            Some("name"),
        );
        assert_eq!(first, "custom_1");
        assert_eq!(named, "name");
        assert_eq!(customs.ids(), vec!["custom_1".to_string(), "name".to_string()]);
    }

    #[test]
    fn test_member_lookup_matches_pair_and_member() {
        let mut customs = CustomTransformers::new();
        customs.register(
            CustomTransformer::member("User", "UserDto", "birthDate", |_| Ok(Value::Null)),
            Some("birth"),
        );
        let user = ShapeId::class("User");
        let dto = ShapeId::class("UserDto");
        assert_eq!(customs.find_member(&user, &dto, "birthDate"), Some("birth"));
        assert_eq!(customs.find_member(&dto, &user, "birthDate"), None);
        assert_eq!(customs.find_member(&user, &dto, "name"), None);
    }

    #[test]
    fn test_later_registration_wins() {
        let mut customs = CustomTransformers::new();
        customs.register(
            CustomTransformer::value(TypeDescriptor::int(), TypeDescriptor::string(), |_| {
                Ok(Value::from("first"))
            }),
            Some("a"),
        );
        customs.register(
            CustomTransformer::value(TypeDescriptor::int(), TypeDescriptor::string(), |_| {
                Ok(Value::from("second"))
            }),
            Some("b"),
        );
        let id = customs
            .find_value(&[TypeDescriptor::int()], &[TypeDescriptor::string()])
            .unwrap();
        assert_eq!(id, "b");
        assert_eq!(
            customs.get(id).unwrap().apply(&Value::Int(1)).unwrap(),
            Value::from("second")
        );
    }

    #[test]
    fn test_replacing_an_id() {
        let mut customs = CustomTransformers::new();
        customs.register(
            CustomTransformer::value(TypeDescriptor::int(), TypeDescriptor::string(), |_| {
                Ok(Value::Null)
            }),
            Some("x"),
        );
        customs.register(
            CustomTransformer::value(TypeDescriptor::float(), TypeDescriptor::string(), |_| {
                Ok(Value::Null)
            }),
            Some("x"),
        );
        assert_eq!(customs.ids().len(), 1);
        assert!(customs
            .find_value(&[TypeDescriptor::int()], &[TypeDescriptor::string()])
            .is_none());
    }
}

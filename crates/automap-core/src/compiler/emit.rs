//! Transformer emission
//!
//! Turns a resolved [`Transformer`] into a callable. Every emitted callable
//! passes `null` through unless its transformer states otherwise (collections
//! rebuild `null` as an empty collection).
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

use super::CompileEnv;
use crate::context::MapContext;
use crate::shape::{EnumShape, ScalarKind, ShapeId, TypeDescriptor};
use crate::transformer::{NullOutput, Transformer};
use crate::value::{EnumValue, Object};
use crate::{Error, Result, Value};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;

/// An emitted transformer
pub type TransformFn = Arc<dyn Fn(&Value, &mut MapContext<'_>) -> Result<Value> + Send + Sync>;

/// Box a closure as a [`TransformFn`]
pub fn transform<F>(f: F) -> TransformFn
where
    F: Fn(&Value, &mut MapContext<'_>) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Emit the callable of a transformer
pub fn emit(transformer: &Transformer, env: &CompileEnv<'_>) -> Result<TransformFn> {
    let emitted: TransformFn = match transformer {
        Transformer::Copy | Transformer::DateTimeCopy => transform(|value, _| Ok(value.clone())),
        Transformer::Cast { to, .. } => {
            let to = *to;
            transform(move |value, ctx| cast(value, to, &ctx.path()))
        }
        Transformer::DateTimeToString { format } => {
            let format = format.clone();
            transform(move |value, ctx| {
                let format = format.as_deref().unwrap_or(ctx.datetime_format());
                datetime_to_string(value, format, &ctx.path())
            })
        }
        Transformer::StringToDateTime { format } => {
            let format = format.clone();
            transform(move |value, ctx| {
                let format = format.as_deref().unwrap_or(ctx.datetime_format());
                string_to_datetime(value, format, &ctx.path())
            })
        }
        Transformer::Nullable { inner, on_null } => {
            let inner = emit(inner, env)?;
            let on_null = *on_null;
            transform(move |value, ctx| match value {
                Value::Null => Ok(null_output(on_null)),
                other => inner(other, ctx),
            })
        }
        Transformer::Multiple { branches } => {
            let branches = branches
                .iter()
                .map(|b| Ok((b.descriptor.clone(), emit(&b.transformer, env)?)))
                .collect::<Result<Vec<(TypeDescriptor, TransformFn)>>>()?;
            transform(move |value, ctx| {
                let branch = branches
                    .iter()
                    .find(|(descriptor, _)| descriptor.matches(value))
                    .or_else(|| {
                        branches
                            .iter()
                            .find(|(descriptor, _)| descriptor.matches_kind(value))
                    });
                match branch {
                    Some((_, branch_fn)) => branch_fn(value, ctx),
                    None => Err(Error::conversion(
                        value.kind(),
                        branches
                            .iter()
                            .map(|(d, _)| d.to_string())
                            .collect::<Vec<_>>()
                            .join("|"),
                        value,
                        ctx.path(),
                    )),
                }
            })
        }
        Transformer::Collection { value, key, keyed } => {
            let value_fn = emit(value, env)?;
            let key_fn = key.as_deref().map(|k| emit(k, env)).transpose()?;
            let keyed = *keyed;
            transform(move |input, ctx| {
                map_collection(input, keyed, &value_fn, key_fn.as_ref(), ctx)
            })
        }
        Transformer::Object { dependency } => {
            let target = dependency.target.clone();
            transform(move |value, ctx| match value {
                Value::Null => Ok(Value::Null),
                other => ctx.map_nested(other, &target, None),
            })
        }
        Transformer::Generic { to } => {
            let to = to.clone();
            transform(move |value, ctx| reshape(value, &to, &ctx.path()))
        }
        Transformer::EnumToEnum { source, target } => {
            let source = enumeration(env, source)?;
            let target = enumeration(env, target)?;
            transform(move |value, ctx| enum_to_enum(value, &source, &target, &ctx.path()))
        }
        Transformer::EnumToScalar { source, to } => {
            let source = enumeration(env, source)?;
            let to = *to;
            transform(move |value, ctx| enum_to_scalar(value, &source, to, &ctx.path()))
        }
        Transformer::ScalarToEnum { target } => {
            let target = enumeration(env, target)?;
            transform(move |value, ctx| scalar_to_enum(value, &target, &ctx.path()))
        }
        Transformer::Custom { id, .. } => {
            let custom = env.customs.get(id).cloned().ok_or_else(|| {
                Error::configuration(format!("Custom transformer '{}' is not registered", id))
            })?;
            let id = id.clone();
            transform(move |value, ctx| {
                custom.apply(value).map_err(|err| Error::CustomTransformer {
                    id: id.clone(),
                    path: ctx.path(),
                    message: format!("{:#}", err),
                })
            })
        }
    };
    Ok(emitted)
}

fn enumeration(env: &CompileEnv<'_>, name: &str) -> Result<EnumShape> {
    env.shapes
        .enumeration(name)
        .cloned()
        .ok_or_else(|| Error::UnknownShape {
            name: name.to_string(),
        })
}

fn null_output(on_null: NullOutput) -> Value {
    match on_null {
        NullOutput::Null => Value::Null,
        NullOutput::EmptyList => Value::List(Vec::new()),
        NullOutput::EmptyMap => Value::Map(BTreeMap::new()),
    }
}

fn map_collection(
    input: &Value,
    keyed: bool,
    value_fn: &TransformFn,
    key_fn: Option<&TransformFn>,
    ctx: &mut MapContext<'_>,
) -> Result<Value> {
    let entries: Vec<(Value, &Value)> = match input {
        Value::Null => {
            return Ok(null_output(if keyed {
                NullOutput::EmptyMap
            } else {
                NullOutput::EmptyList
            }))
        }
        Value::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| (Value::Int(i as i64), item))
            .collect(),
        Value::Map(map) => map
            .iter()
            .map(|(k, item)| (Value::String(k.clone()), item))
            .collect(),
        other => {
            return Err(Error::conversion(
                other.kind(),
                if keyed { "dict" } else { "list" },
                other,
                ctx.path(),
            ))
        }
    };

    if keyed {
        let mut out = BTreeMap::new();
        for (key, item) in entries {
            match &key {
                Value::Int(i) => ctx.push_index(*i as usize),
                other => ctx.push_key(other.as_str().unwrap_or_default()),
            }
            let result = convert_entry(&key, item, value_fn, key_fn, ctx);
            ctx.pop();
            let (key, item) = result?;
            out.insert(key, item);
        }
        Ok(Value::Map(out))
    } else {
        let mut out = Vec::with_capacity(entries.len());
        for (index, (key, item)) in entries.into_iter().enumerate() {
            match &key {
                Value::String(k) => ctx.push_key(k),
                _ => ctx.push_index(index),
            }
            let result = value_fn(item, ctx);
            ctx.pop();
            out.push(result?);
        }
        Ok(Value::List(out))
    }
}

fn convert_entry(
    key: &Value,
    item: &Value,
    value_fn: &TransformFn,
    key_fn: Option<&TransformFn>,
    ctx: &mut MapContext<'_>,
) -> Result<(String, Value)> {
    let key = match key_fn {
        Some(key_fn) => key_fn(key, ctx)?,
        None => key.clone(),
    };
    let key = match key {
        Value::String(s) => s,
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Enum(e) => e.case,
        other => return Err(Error::conversion(other.kind(), "key", &other, ctx.path())),
    };
    Ok((key, value_fn(item, ctx)?))
}

/// Scalar coercion from the runtime kind of `value`
pub(crate) fn cast(value: &Value, to: ScalarKind, path: &str) -> Result<Value> {
    let fail = || Error::conversion(value.kind(), to.name(), value, path);
    let cast = match (value, to) {
        (Value::Null, _) => Value::Null,
        (Value::Bool(_), ScalarKind::Bool)
        | (Value::Int(_), ScalarKind::Int)
        | (Value::Float(_), ScalarKind::Float)
        | (Value::String(_), ScalarKind::String) => value.clone(),

        (Value::Bool(b), ScalarKind::Int) => Value::Int(i64::from(*b)),
        (Value::Bool(b), ScalarKind::Float) => Value::Float(if *b { 1.0 } else { 0.0 }),
        (Value::Bool(b), ScalarKind::String) => Value::String(b.to_string()),

        (Value::Int(i), ScalarKind::Bool) => Value::Bool(*i != 0),
        (Value::Int(i), ScalarKind::Float) => Value::Float(*i as f64),
        (Value::Int(i), ScalarKind::String) => Value::String(i.to_string()),

        (Value::Float(f), ScalarKind::Bool) => Value::Bool(*f != 0.0),
        (Value::Float(f), ScalarKind::Int) => Value::Int(float_to_int(*f).ok_or_else(fail)?),
        (Value::Float(f), ScalarKind::String) => Value::String(f.to_string()),

        (Value::String(s), ScalarKind::Bool) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Value::Bool(true),
            "false" | "no" | "0" | "off" => Value::Bool(false),
            _ => return Err(fail()),
        },
        (Value::String(s), ScalarKind::Int) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => Value::Int(i),
                Err(_) => s
                    .parse::<f64>()
                    .ok()
                    .and_then(float_to_int)
                    .map(Value::Int)
                    .ok_or_else(fail)?,
            }
        }
        (Value::String(s), ScalarKind::Float) => {
            Value::Float(s.trim().parse::<f64>().map_err(|_| fail())?)
        }

        (Value::Enum(e), ScalarKind::String) => Value::String(e.case.clone()),
        _ => return Err(fail()),
    };
    Ok(cast)
}

/// Truncate toward zero; `None` for NaN, infinities and out-of-range values
fn float_to_int(f: f64) -> Option<i64> {
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f.trunc() as i64)
    } else {
        None
    }
}

fn datetime_to_string(value: &Value, format: &str, path: &str) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::DateTime(dt) => {
            let mut rendered = String::new();
            write!(rendered, "{}", dt.format(format))
                .map_err(|_| Error::conversion("datetime", "string", value, path))?;
            Ok(Value::String(rendered))
        }
        Value::String(_) => Ok(value.clone()),
        other => Err(Error::conversion(other.kind(), "string", other, path)),
    }
}

fn string_to_datetime(value: &Value, format: &str, path: &str) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::DateTime(_) => Ok(value.clone()),
        Value::String(s) => parse_datetime(s.trim(), format)
            .map(Value::DateTime)
            .ok_or_else(|| Error::conversion("string", "datetime", value, path)),
        other => Err(Error::conversion(other.kind(), "datetime", other, path)),
    }
}

/// Parse with the format, then RFC 3339; formats without an offset read as UTC
pub(crate) fn parse_datetime(s: &str, format: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_str(s, format) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    let utc = FixedOffset::east_opt(0)?;
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
        return Some(utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, format) {
        return Some(utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

fn reshape(value: &Value, to: &ShapeId, path: &str) -> Result<Value> {
    match (value, to) {
        (Value::Null, _) => Ok(Value::Null),
        (Value::Map(_), ShapeId::Map) => Ok(value.clone()),
        (Value::Map(fields), ShapeId::Dynamic) => Ok(Value::Object(Object {
            shape: ShapeId::Dynamic,
            fields: fields.clone(),
        })),
        (Value::Object(object), ShapeId::Map) => Ok(Value::Map(object.fields.clone())),
        (Value::Object(object), ShapeId::Dynamic) => Ok(Value::Object(Object {
            shape: ShapeId::Dynamic,
            fields: object.fields.clone(),
        })),
        (other, to) => Err(Error::conversion(other.kind(), to.to_string(), other, path)),
    }
}

/// Text form of a scalar, used to compare against enum backing values
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Int(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn find_case<'e>(shape: &'e EnumShape, value: &Value) -> Option<&'e str> {
    if let Value::Enum(e) = value {
        return shape.case_by_name(&e.case).map(|c| c.name.as_str());
    }
    if let Some(case) = value.as_str().and_then(|s| shape.case_by_name(s)) {
        return Some(case.name.as_str());
    }
    if let Some(case) = shape.case_by_value(value) {
        return Some(case.name.as_str());
    }
    let text = scalar_text(value)?;
    shape
        .cases
        .iter()
        .find(|c| c.value.as_ref().and_then(scalar_text).as_deref() == Some(text.as_str()))
        .map(|c| c.name.as_str())
}

fn enum_to_enum(value: &Value, source: &EnumShape, target: &EnumShape, path: &str) -> Result<Value> {
    let Value::Enum(e) = value else {
        return match value {
            Value::Null => Ok(Value::Null),
            other => Err(Error::conversion(other.kind(), &target.name, other, path)),
        };
    };
    let by_name = target.case_by_name(&e.case);
    let by_value = || {
        source
            .case_by_name(&e.case)
            .and_then(|c| c.value.as_ref())
            .and_then(|v| target.case_by_value(v))
    };
    match by_name.or_else(by_value) {
        Some(case) => Ok(Value::Enum(EnumValue::new(&target.name, &case.name))),
        None => Err(Error::conversion(&source.name, &target.name, value, path)),
    }
}

fn enum_to_scalar(value: &Value, source: &EnumShape, to: ScalarKind, path: &str) -> Result<Value> {
    let Value::Enum(e) = value else {
        return match value {
            Value::Null => Ok(Value::Null),
            // already degraded
            other => cast(other, to, path),
        };
    };
    let case = source
        .case_by_name(&e.case)
        .ok_or_else(|| Error::conversion(&source.name, to.name(), value, path))?;
    match &case.value {
        Some(backing) => cast(backing, to, path),
        None if to == ScalarKind::String => Ok(Value::String(case.name.clone())),
        None => Err(Error::conversion(&source.name, to.name(), value, path)),
    }
}

fn scalar_to_enum(value: &Value, target: &EnumShape, path: &str) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match find_case(target, value) {
        Some(case) => Ok(Value::Enum(EnumValue::new(&target.name, case))),
        None => Err(Error::conversion(value.kind(), &target.name, value, path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proptest_strategies::scalar_value_strategy;
    use proptest::prelude::*;

    #[test]
    fn test_cast_policy() {
        let p = "$.x";
        assert_eq!(cast(&Value::Bool(true), ScalarKind::String, p).unwrap(), Value::from("true"));
        assert_eq!(cast(&Value::from(" yes "), ScalarKind::Bool, p).unwrap(), Value::Bool(true));
        assert_eq!(cast(&Value::from("Off"), ScalarKind::Bool, p).unwrap(), Value::Bool(false));
        assert!(cast(&Value::from("maybe"), ScalarKind::Bool, p).is_err());
        assert_eq!(cast(&Value::Int(3), ScalarKind::Float, p).unwrap(), Value::Float(3.0));
        assert_eq!(cast(&Value::Float(-2.7), ScalarKind::Int, p).unwrap(), Value::Int(-2));
        assert!(cast(&Value::Float(f64::NAN), ScalarKind::Int, p).is_err());
        assert!(cast(&Value::Float(f64::INFINITY), ScalarKind::Int, p).is_err());
        assert_eq!(cast(&Value::Float(2.0), ScalarKind::String, p).unwrap(), Value::from("2"));
        assert_eq!(cast(&Value::Float(2.5), ScalarKind::String, p).unwrap(), Value::from("2.5"));
        assert_eq!(cast(&Value::from(" 42 "), ScalarKind::Int, p).unwrap(), Value::Int(42));
        assert_eq!(cast(&Value::from("4.9"), ScalarKind::Int, p).unwrap(), Value::Int(4));
        assert!(cast(&Value::from("abc"), ScalarKind::Float, p).is_err());
        assert_eq!(cast(&Value::Null, ScalarKind::Int, p).unwrap(), Value::Null);
    }

    #[test]
    fn test_cast_error_carries_path() {
        let err = cast(&Value::from("abc"), ScalarKind::Int, "$.age").unwrap_err();
        match err {
            Error::Conversion { from, to, path, .. } => {
                assert_eq!(from, "string");
                assert_eq!(to, "int");
                assert_eq!(path, "$.age");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_datetime_formatting_and_parsing() {
        let dt = DateTime::parse_from_rfc3339("2024-03-01T08:30:00+01:00").unwrap();
        let rendered = datetime_to_string(&Value::DateTime(dt), "%Y-%m-%d %H:%M", "$").unwrap();
        assert_eq!(rendered, Value::from("2024-03-01 08:30"));

        let parsed = parse_datetime("2024-03-01T08:30:00+01:00", "%Y-%m-%dT%H:%M:%S%:z").unwrap();
        assert_eq!(parsed, dt);
        let naive = parse_datetime("2024-03-01 08:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(naive.offset().local_minus_utc(), 0);
        let date = parse_datetime("2024-03-01", "%Y-%m-%d").unwrap();
        assert_eq!(date.format("%H").to_string(), "00");
        assert!(string_to_datetime(&Value::from("soon"), "%Y", "$").is_err());

        let err = datetime_to_string(&Value::DateTime(dt), "%Q", "$.at").unwrap_err();
        assert!(matches!(err, Error::Conversion { path, .. } if path == "$.at"));
    }

    #[test]
    fn test_reshape_generic_values() {
        let map = Value::map([("a", Value::Int(1))]);
        let dynamic = reshape(&map, &ShapeId::Dynamic, "$").unwrap();
        assert_eq!(dynamic.shape_id().unwrap(), ShapeId::Dynamic);
        assert_eq!(reshape(&dynamic, &ShapeId::Map, "$").unwrap(), map);
        assert!(reshape(&Value::Int(1), &ShapeId::Map, "$").is_err());
    }

    #[test]
    fn test_enum_conversions() {
        let color = EnumShape::new("Color").case("Red").case("Green");
        let paint = EnumShape::new("Paint").case("Green").case("Blue");
        let level = EnumShape::new("Level").backed_case("Low", 1).backed_case("High", 2);
        let tier = EnumShape::new("Tier").backed_case("Bronze", 1).backed_case("Gold", 2);

        let green = Value::Enum(EnumValue::new("Color", "Green"));
        assert_eq!(
            enum_to_enum(&green, &color, &paint, "$").unwrap(),
            Value::Enum(EnumValue::new("Paint", "Green"))
        );
        let red = Value::Enum(EnumValue::new("Color", "Red"));
        assert!(enum_to_enum(&red, &color, &paint, "$").is_err());

        let high = Value::Enum(EnumValue::new("Level", "High"));
        assert_eq!(
            enum_to_enum(&high, &level, &tier, "$").unwrap(),
            Value::Enum(EnumValue::new("Tier", "Gold"))
        );
        assert_eq!(enum_to_scalar(&high, &level, ScalarKind::Int, "$").unwrap(), Value::Int(2));
        assert_eq!(enum_to_scalar(&high, &level, ScalarKind::String, "$").unwrap(), Value::from("2"));
        assert_eq!(enum_to_scalar(&red, &color, ScalarKind::String, "$").unwrap(), Value::from("Red"));

        assert_eq!(scalar_to_enum(&Value::from("2"), &level, "$").unwrap(), high);
        assert_eq!(scalar_to_enum(&Value::Int(2), &level, "$").unwrap(), high);
        assert_eq!(scalar_to_enum(&Value::from("High"), &level, "$").unwrap(), high);
        assert!(scalar_to_enum(&Value::from("Purple"), &color, "$").is_err());
    }

    proptest! {
        #[test]
        fn prop_cast_to_own_kind_is_identity(
            (kind, value) in prop_oneof![
                Just(ScalarKind::Bool),
                Just(ScalarKind::Int),
                Just(ScalarKind::Float),
                Just(ScalarKind::String),
            ].prop_flat_map(|kind| (Just(kind), scalar_value_strategy(kind)))
        ) {
            prop_assert_eq!(cast(&value, kind, "$").unwrap(), value);
        }

        #[test]
        fn prop_int_string_round_trip(i in any::<i64>()) {
            let text = cast(&Value::Int(i), ScalarKind::String, "$").unwrap();
            prop_assert_eq!(cast(&text, ScalarKind::Int, "$").unwrap(), Value::Int(i));
        }
    }
}

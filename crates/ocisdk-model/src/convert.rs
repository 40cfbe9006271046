//! Schema-driven conversion of decoded JSON into declared shapes.
//!
//! [`convert`] walks a decoded value alongside its [`TypeDescriptor`]:
//!
//! - primitives are checked (and numeric/boolean strings coerced),
//! - arrays and maps are converted element by element,
//! - model objects are normalised onto their camelCase wire names, accepting
//!   the snake_case logical names as aliases,
//! - `null` is accepted for every type.
//!
//! Unknown object keys are kept as they are.

use chrono::DateTime;
use serde_json::{Map, Value};

use crate::descriptor::TypeDescriptor;
use crate::error::{ModelError, ModelResult};
use crate::schema::{ModelRegistry, ModelSchema};

/// Convert `value` into the shape declared by `descriptor`.
///
/// # Examples
///
/// ```
/// use ocisdk_model::{ModelRegistry, TypeDescriptor, convert};
/// use serde_json::json;
///
/// let registry = ModelRegistry::new();
/// let value = convert(json!(["1", 2]), &TypeDescriptor::array(TypeDescriptor::Integer), &registry).unwrap();
/// assert_eq!(value, json!([1, 2]));
/// ```
pub fn convert(
    value: Value,
    descriptor: &TypeDescriptor,
    registry: &ModelRegistry,
) -> ModelResult<Value> {
    convert_at(value, descriptor, registry, "$")
}

/// Normalise a model object onto its wire names.
pub fn normalize_model(
    value: Value,
    schema: &ModelSchema,
    registry: &ModelRegistry,
) -> ModelResult<Value> {
    normalize_at(value, schema, registry, "$")
}

fn convert_at(
    value: Value,
    descriptor: &TypeDescriptor,
    registry: &ModelRegistry,
    path: &str,
) -> ModelResult<Value> {
    if value.is_null() {
        return Ok(value);
    }

    match descriptor {
        TypeDescriptor::Object | TypeDescriptor::RawStream => Ok(value),
        TypeDescriptor::String => match value {
            Value::String(_) => Ok(value),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            other => Err(mismatch(path, descriptor, &other)),
        },
        TypeDescriptor::Integer => match value {
            Value::Number(ref n) if n.is_i64() || n.is_u64() => Ok(value),
            Value::String(ref s) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| mismatch(path, descriptor, &value)),
            other => Err(mismatch(path, descriptor, &other)),
        },
        TypeDescriptor::Float => match value {
            Value::Number(_) => Ok(value),
            Value::String(ref s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| mismatch(path, descriptor, &value)),
            other => Err(mismatch(path, descriptor, &other)),
        },
        TypeDescriptor::Boolean => match value {
            Value::Bool(_) => Ok(value),
            Value::String(ref s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::String(ref s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            other => Err(mismatch(path, descriptor, &other)),
        },
        TypeDescriptor::DateTime => match value {
            Value::String(ref s) if DateTime::parse_from_rfc3339(s).is_ok() => Ok(value),
            other => Err(mismatch(path, descriptor, &other)),
        },
        TypeDescriptor::Array(inner) => match value {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| convert_at(item, inner, registry, &format!("{path}[{i}]")))
                .collect::<ModelResult<Vec<_>>>()
                .map(Value::Array),
            other => Err(mismatch(path, descriptor, &other)),
        },
        TypeDescriptor::Map(inner) => match value {
            Value::Object(entries) => entries
                .into_iter()
                .map(|(k, v)| {
                    let v = convert_at(v, inner, registry, &format!("{path}.{k}"))?;
                    Ok((k, v))
                })
                .collect::<ModelResult<Map<_, _>>>()
                .map(Value::Object),
            other => Err(mismatch(path, descriptor, &other)),
        },
        TypeDescriptor::Model(name) => {
            let schema = registry
                .get(name)
                .ok_or_else(|| ModelError::UnknownModel(name.clone()))?;
            normalize_at(value, schema, registry, path)
        }
    }
}

fn normalize_at(
    value: Value,
    schema: &ModelSchema,
    registry: &ModelRegistry,
    path: &str,
) -> ModelResult<Value> {
    let Value::Object(mut input) = value else {
        return Err(ModelError::TypeMismatch {
            path: path.to_owned(),
            expected: schema.name.to_owned(),
            found: kind(&value),
        });
    };

    let mut output = Map::with_capacity(input.len());
    for field in &schema.fields {
        let wire = input.remove(field.wire_name);
        let alias = if field.name == field.wire_name {
            None
        } else {
            input.remove(field.name)
        };

        let raw = match (wire, alias) {
            (Some(_), Some(_)) => {
                return Err(ModelError::DuplicateAlias {
                    model: schema.name.to_owned(),
                    wire_name: field.wire_name,
                    alias: field.name,
                });
            }
            (Some(v), None) | (None, Some(v)) => v,
            (None, None) => continue,
        };

        let converted = convert_at(
            raw,
            &field.descriptor,
            registry,
            &format!("{path}.{}", field.wire_name),
        )?;
        output.insert(field.wire_name.to_owned(), converted);
    }

    output.extend(input);
    Ok(Value::Object(output))
}

fn mismatch(path: &str, expected: &TypeDescriptor, found: &Value) -> ModelError {
    ModelError::TypeMismatch {
        path: path.to_owned(),
        expected: expected.to_string(),
        found: kind(found),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

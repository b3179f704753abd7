//! Permissive readers for operator-entered JSON.
//!
//! Settings blobs and per-page overrides are typed by hand in an admin UI (or
//! produced by a form serializer that encodes `{"0": x}` as `[x]`), so every
//! field here degrades to a documented default instead of failing the parse.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::model::{PositionValue, SlotPositions, TargetingMap, TargetingValue};

/// Loose truthiness: `true`, non-zero numbers, non-empty collections and any
/// string other than `""`, `"0"`, `"false"`, `"off"` and `"no"`.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "" | "0" | "false" | "off" | "no"
        ),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Scalar to string. Collections and null have no string form.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Key/value view over an object, or over an array keyed by index.
pub fn entries(value: &Value) -> Vec<(String, &Value)> {
    match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}

pub fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_string).collect(),
        Value::Object(map) => map.values().filter_map(scalar_string).collect(),
        other => scalar_string(other)
            .filter(|s| !s.is_empty())
            .into_iter()
            .collect(),
    }
}

pub fn positions(value: &Value) -> SlotPositions {
    match value {
        Value::Array(items) => {
            SlotPositions::Listed(items.iter().filter_map(scalar_string).collect())
        }
        // Form submissions post `positions[<id>] = "on"`.
        Value::Object(map) => SlotPositions::Listed(
            map.iter()
                .filter(|(_, v)| truthy(v))
                .map(|(k, _)| k.clone())
                .collect(),
        ),
        other if truthy(other) => SlotPositions::Single,
        _ => SlotPositions::Inactive,
    }
}

pub fn size_mapping(value: &Value) -> PositionValue<String> {
    match value {
        Value::String(name) => PositionValue::Flat(name.clone()),
        Value::Object(_) | Value::Array(_) => PositionValue::ByPosition(
            entries(value)
                .into_iter()
                .filter_map(|(pos, v)| scalar_string(v).map(|name| (pos, name)))
                .collect(),
        ),
        _ => PositionValue::default(),
    }
}

pub fn lazy_load(value: &Value) -> PositionValue<bool> {
    match value {
        Value::Object(_) | Value::Array(_) => PositionValue::ByPosition(
            entries(value)
                .into_iter()
                .map(|(pos, v)| (pos, truthy(v)))
                .collect(),
        ),
        Value::Null => PositionValue::default(),
        scalar => PositionValue::Flat(truthy(scalar)),
    }
}

pub fn targeting_value(value: &Value) -> Option<TargetingValue> {
    match value {
        Value::Array(items) => Some(TargetingValue::Multi(
            items.iter().filter_map(scalar_string).collect(),
        )),
        other => scalar_string(other).map(TargetingValue::Single),
    }
}

pub fn targeting_map(value: &Value) -> TargetingMap {
    entries(value)
        .into_iter()
        .filter_map(|(key, v)| targeting_value(v).map(|tv| (key, tv)))
        .collect()
}

/// Nested objects mean per-position targeting, scalars mean one flat map.
pub fn custom_targeting(value: &Value) -> PositionValue<TargetingMap> {
    let pairs = entries(value);
    let nested = pairs.iter().any(|(_, v)| v.is_object());
    if nested {
        PositionValue::ByPosition(
            pairs
                .into_iter()
                .filter(|(_, v)| v.is_object())
                .map(|(pos, v)| (pos, targeting_map(v)))
                .collect(),
        )
    } else if value.is_object() {
        PositionValue::Flat(targeting_map(value))
    } else {
        PositionValue::default()
    }
}

/// A settings blob may be stored as a JSON-encoded string or inline.
pub fn decode_blob(value: &Value) -> serde_json::Result<Option<Value>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => serde_json::from_str::<Value>(s).map(|v| match v {
            Value::Null => None,
            other => Some(other),
        }),
        other => Ok(Some(other.clone())),
    }
}

pub fn object_entries(value: &Value) -> IndexMap<String, Value> {
    match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        _ => IndexMap::new(),
    }
}

pub fn de_truthy<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Value::deserialize(d).map(|v| truthy(&v))
}

pub fn de_positions<'de, D: Deserializer<'de>>(d: D) -> Result<SlotPositions, D::Error> {
    Value::deserialize(d).map(|v| positions(&v))
}

pub fn de_size_mapping<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<PositionValue<String>, D::Error> {
    Value::deserialize(d).map(|v| size_mapping(&v))
}

pub fn de_lazy_load<'de, D: Deserializer<'de>>(d: D) -> Result<PositionValue<bool>, D::Error> {
    Value::deserialize(d).map(|v| lazy_load(&v))
}

pub fn de_custom_targeting<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<PositionValue<TargetingMap>, D::Error> {
    Value::deserialize(d).map(|v| custom_targeting(&v))
}

pub fn de_string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Value::deserialize(d).map(|v| string_list(&v))
}

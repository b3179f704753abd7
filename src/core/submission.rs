//! Turns the per-page override form into the stored override document.

use crate::domain::lenient;
use crate::domain::model::{PositionValue, ResolvedAdConfiguration, SlotOverride, SlotPositions};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// One unit's fields as posted by the override form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubmittedUnit {
    /// Map of checked positions, or `"on"` for a position-less unit.
    #[serde(default)]
    pub positions: Value,
    #[serde(default)]
    pub size_mapping: Value,
    #[serde(default)]
    pub out_of_page: Value,
    #[serde(default)]
    pub lazy_load: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OverrideSubmission {
    #[serde(default, deserialize_with = "de_units")]
    pub units: IndexMap<String, SubmittedUnit>,
}

impl OverrideSubmission {
    pub fn from_value(value: &Value) -> Self {
        Self {
            units: units_from_value(value),
        }
    }

    /// Build the stored override. Units without checked positions are left
    /// out; `size_mapping_definitions` lists every mapping in use.
    pub fn normalize(&self, disable_ads: bool) -> ResolvedAdConfiguration {
        let mut size_mapping_definitions: Vec<String> = Vec::new();
        let mut ad_slots = IndexMap::new();

        for (unit_id, unit) in &self.units {
            if !lenient::truthy(&unit.positions) {
                continue;
            }

            let positions = match &unit.positions {
                Value::Object(map) => SlotPositions::Listed(map.keys().cloned().collect()),
                Value::Array(items) => {
                    SlotPositions::Listed(items.iter().filter_map(lenient::scalar_string).collect())
                }
                _ => SlotPositions::Single,
            };

            let size_mapping = match &unit.size_mapping {
                Value::Object(_) | Value::Array(_) => PositionValue::ByPosition(
                    lenient::entries(&unit.size_mapping)
                        .into_iter()
                        .filter_map(|(pos, v)| lenient::scalar_string(v).map(|name| (pos, name)))
                        .filter(|(_, name)| !name.is_empty())
                        .collect(),
                ),
                other => match lenient::scalar_string(other).filter(|s| !s.is_empty()) {
                    Some(name) => PositionValue::Flat(name),
                    None => PositionValue::default(),
                },
            };
            let names: Vec<&String> = match &size_mapping {
                PositionValue::Flat(name) => vec![name],
                PositionValue::ByPosition(map) => map.values().collect(),
            };
            for name in names {
                if !size_mapping_definitions.contains(name) {
                    size_mapping_definitions.push(name.clone());
                }
            }

            // Only checked boxes are posted, so every entry present is on.
            let lazy_load = match &unit.lazy_load {
                Value::Object(_) | Value::Array(_) => PositionValue::ByPosition(
                    lenient::entries(&unit.lazy_load)
                        .into_iter()
                        .filter(|(_, v)| lenient::truthy(v))
                        .map(|(pos, _)| (pos, true))
                        .collect(),
                ),
                other if lenient::truthy(other) => PositionValue::Flat(true),
                _ => PositionValue::default(),
            };

            ad_slots.insert(
                unit_id.clone(),
                SlotOverride {
                    positions,
                    size_mapping,
                    out_of_page: lenient::truthy(&unit.out_of_page),
                    custom_targeting: PositionValue::default(),
                    lazy_load,
                },
            );
        }

        tracing::debug!("Normalized override with {} ad units", ad_slots.len());
        ResolvedAdConfiguration {
            size_mapping_definitions,
            ad_slots,
            disable_ads,
        }
    }
}

fn units_from_value(value: &Value) -> IndexMap<String, SubmittedUnit> {
    lenient::object_entries(value)
        .into_iter()
        .filter_map(|(unit, raw)| match SubmittedUnit::deserialize(raw) {
            Ok(data) => Some((unit, data)),
            Err(e) => {
                tracing::debug!("Ignoring unreadable form entry '{}': {}", unit, e);
                None
            }
        })
        .collect()
}

fn de_units<'de, D: serde::Deserializer<'de>>(d: D) -> Result<IndexMap<String, SubmittedUnit>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(units_from_value(&value))
}

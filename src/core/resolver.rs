use crate::core::catalog::AdTaxonomy;
use crate::domain::lenient;
use crate::domain::model::{PositionValue, ResolvedAdConfiguration, SlotOverride, SlotPositions};
use indexmap::IndexMap;
use serde_json::Value;

/// Merges a page's stored override with the taxonomy (or falls back to the
/// template default) to produce the configuration the generator consumes.
#[derive(Debug, Clone)]
pub struct AdConfigurationResolver<'a> {
    taxonomy: &'a AdTaxonomy,
}

impl<'a> AdConfigurationResolver<'a> {
    pub fn new(taxonomy: &'a AdTaxonomy) -> Self {
        Self { taxonomy }
    }

    /// Resolve a raw override. Absent, blank, unparseable or empty overrides
    /// yield `default_config` unchanged.
    pub fn resolve(
        &self,
        raw_override: Option<&str>,
        default_config: &ResolvedAdConfiguration,
    ) -> ResolvedAdConfiguration {
        let Some(raw) = raw_override.map(str::trim).filter(|r| !r.is_empty()) else {
            return default_config.clone();
        };

        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Stored ad configuration is not valid JSON, using default: {}", e);
                return default_config.clone();
            }
        };
        self.resolve_value(&value, default_config)
    }

    pub fn resolve_value(
        &self,
        value: &Value,
        default_config: &ResolvedAdConfiguration,
    ) -> ResolvedAdConfiguration {
        if !value.is_object() || !lenient::truthy(value) {
            return default_config.clone();
        }

        match ResolvedAdConfiguration::from_value(value.clone()) {
            Ok(parsed) => self.normalize(parsed),
            Err(e) => {
                tracing::warn!("Stored ad configuration is unreadable, using default: {}", e);
                default_config.clone()
            }
        }
    }

    /// Apply the per-unit rules and rebuild `size_mapping_definitions` from
    /// the slots that survive.
    pub fn normalize(&self, parsed: ResolvedAdConfiguration) -> ResolvedAdConfiguration {
        let mut size_mapping_definitions: Vec<String> = Vec::new();
        let mut ad_slots = IndexMap::new();

        for (unit_id, slot) in parsed.ad_slots {
            let Some(slot) = self.normalize_slot(&unit_id, slot) else {
                tracing::debug!("Ad unit '{}' has no active positions, skipping", unit_id);
                continue;
            };

            let names: Vec<&String> = match &slot.size_mapping {
                PositionValue::Flat(name) => vec![name],
                PositionValue::ByPosition(map) => map.values().collect(),
            };
            for name in names {
                if !name.is_empty() && !size_mapping_definitions.contains(name) {
                    size_mapping_definitions.push(name.clone());
                }
            }

            ad_slots.insert(unit_id, slot);
        }

        ResolvedAdConfiguration {
            size_mapping_definitions,
            ad_slots,
            disable_ads: parsed.disable_ads,
        }
    }

    fn normalize_slot(&self, unit_id: &str, slot: SlotOverride) -> Option<SlotOverride> {
        let positions = self.active_positions(unit_id, slot.positions)?;

        let normalized = match &positions {
            SlotPositions::Listed(active) => SlotOverride {
                size_mapping: PositionValue::ByPosition(match slot.size_mapping {
                    PositionValue::ByPosition(map) => map
                        .into_iter()
                        .filter(|(pos, name)| !name.is_empty() && active.contains(pos))
                        .collect(),
                    PositionValue::Flat(_) => IndexMap::new(),
                }),
                lazy_load: PositionValue::ByPosition(
                    active
                        .iter()
                        .map(|pos| {
                            let lazy = slot.lazy_load.get(Some(pos)).copied().unwrap_or(false);
                            (pos.clone(), lazy)
                        })
                        .collect(),
                ),
                custom_targeting: PositionValue::ByPosition(match slot.custom_targeting {
                    PositionValue::ByPosition(map) => map
                        .into_iter()
                        .filter(|(pos, _)| active.contains(pos))
                        .collect(),
                    PositionValue::Flat(_) => IndexMap::new(),
                }),
                out_of_page: slot.out_of_page,
                positions: positions.clone(),
            },
            SlotPositions::Single => SlotOverride {
                size_mapping: match slot.size_mapping {
                    PositionValue::Flat(name) if !name.is_empty() => PositionValue::Flat(name),
                    _ => PositionValue::default(),
                },
                lazy_load: PositionValue::Flat(slot.lazy_load.get(None).copied().unwrap_or(false)),
                custom_targeting: PositionValue::Flat(match slot.custom_targeting {
                    PositionValue::Flat(map) => map,
                    PositionValue::ByPosition(_) => IndexMap::new(),
                }),
                out_of_page: slot.out_of_page,
                positions: SlotPositions::Single,
            },
            SlotPositions::Inactive => return None,
        };

        Some(normalized)
    }

    /// Active positions restricted to the unit's taxonomy. An empty list on
    /// a position-less unit is how the admin save path marks it active.
    fn active_positions(&self, unit_id: &str, requested: SlotPositions) -> Option<SlotPositions> {
        let definition = self.taxonomy.get(unit_id);

        match (requested, definition) {
            (SlotPositions::Inactive, _) => None,
            (SlotPositions::Single, Some(def)) if def.is_positioned() => None,
            (SlotPositions::Single, _) => Some(SlotPositions::Single),
            (SlotPositions::Listed(ids), Some(def)) if def.is_positioned() => {
                let mut active: Vec<String> = Vec::new();
                for id in ids {
                    if def.has_position(&id) && !active.contains(&id) {
                        active.push(id);
                    }
                }
                (!active.is_empty()).then_some(SlotPositions::Listed(active))
            }
            (SlotPositions::Listed(_), Some(_)) => Some(SlotPositions::Single),
            // Unknown units are kept so the generator can report them.
            (SlotPositions::Listed(ids), None) if ids.is_empty() => Some(SlotPositions::Single),
            (SlotPositions::Listed(ids), None) => {
                let mut unique: Vec<String> = Vec::new();
                for id in ids {
                    if !unique.contains(&id) {
                        unique.push(id);
                    }
                }
                Some(SlotPositions::Listed(unique))
            }
        }
    }
}

/// Layout used by templates when the settings carry no default configuration.
pub fn builtin_default_configuration() -> ResolvedAdConfiguration {
    let value = serde_json::json!({
        "size_mapping_definitions": [
            "mappingTopBanner", "mappingBottomBanner", "mappingRightRailBox",
            "mappingMobileStickyFooter", "mappingSliding"
        ],
        "ad_slots": {
            "tile": {
                "positions": ["1", "2"],
                "lazy_load": {"1": true, "2": true}
            },
            "int": {
                "positions": [],
                "out_of_page": true,
                "lazy_load": false
            },
            "sliding": {
                "positions": [],
                "size_mapping": "mappingSliding",
                "lazy_load": true
            },
            "leaderboard": {
                "positions": ["1", "2"],
                "size_mapping": {"1": "mappingTopBanner", "2": "mappingBottomBanner"},
                "lazy_load": {"1": true, "2": true}
            },
            "native": {
                "positions": ["0"],
                "lazy_load": {"0": true}
            },
            "box": {
                "positions": ["1", "2", "3"],
                "size_mapping": {"1": "mappingRightRailBox", "2": "mappingRightRailBox", "3": "mappingRightRailBox"},
                "lazy_load": {"1": true, "2": true, "3": true}
            },
            "box-tile": {
                "positions": ["1", "2", "3", "4", "5", "6"],
                "lazy_load": {"1": true, "2": true, "3": true, "4": true, "5": true, "6": true}
            },
            "mobile_sticky_footer": {
                "positions": [],
                "size_mapping": "mappingMobileStickyFooter",
                "lazy_load": false
            }
        },
        "disable_ads": false
    });
    ResolvedAdConfiguration::from_value(value).unwrap_or_default()
}

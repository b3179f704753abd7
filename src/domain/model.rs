use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::lenient;

/// One creative size. Taxonomies store either `[w, h]` pairs or script
/// literals such as `"[728,90]"` / `"'fluid'"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SlotSize {
    Dimensions(u32, u32),
    Literal(String),
}

impl SlotSize {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Array(pair) if pair.len() == 2 => {
                let w = pair[0].as_u64().and_then(|w| u32::try_from(w).ok())?;
                let h = pair[1].as_u64().and_then(|h| u32::try_from(h).ok())?;
                Some(SlotSize::Dimensions(w, h))
            }
            Value::String(s) if !s.trim().is_empty() => Some(SlotSize::Literal(s.trim().to_string())),
            _ => None,
        }
    }

    pub fn list_from_value(value: &Value) -> Vec<Self> {
        match value {
            // A bare [w, h] is a single size, not a list of two.
            Value::Array(items) if items.len() == 2 && items.iter().all(Value::is_number) => {
                Self::from_value(value).into_iter().collect()
            }
            Value::Array(items) => items.iter().filter_map(Self::from_value).collect(),
            other => Self::from_value(other).into_iter().collect(),
        }
    }
}

/// One `addSize(viewport, sizes)` entry of a size mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Breakpoint {
    Pair {
        viewport: (u32, u32),
        sizes: Vec<SlotSize>,
    },
    /// Pre-rendered argument list, e.g. `"[1024, 0], [[728, 90]]"`.
    Literal(String),
}

impl Breakpoint {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Breakpoint::Literal(s.trim().to_string())),
            Value::Array(items) if items.len() == 2 => match SlotSize::from_value(&items[0])? {
                SlotSize::Dimensions(w, h) => Some(Breakpoint::Pair {
                    viewport: (w, h),
                    sizes: SlotSize::list_from_value(&items[1]),
                }),
                SlotSize::Literal(_) => None,
            },
            Value::Object(map) => {
                let viewport = match SlotSize::from_value(map.get("viewport")?)? {
                    SlotSize::Dimensions(w, h) => (w, h),
                    SlotSize::Literal(_) => return None,
                };
                let sizes = map
                    .get("sizes")
                    .map(SlotSize::list_from_value)
                    .unwrap_or_default();
                Some(Breakpoint::Pair { viewport, sizes })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeMapping {
    pub name: String,
    pub breakpoints: Vec<Breakpoint>,
}

/// Static metadata for one ad unit in the site's taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdUnitDefinition {
    pub id: String,
    pub path: String,
    pub sizes: Vec<SlotSize>,
    /// Empty means the unit renders a single position-less slot.
    pub positions: Vec<String>,
}

impl AdUnitDefinition {
    pub fn from_value(id: &str, value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(Self {
            id: id.to_string(),
            path: map
                .get("path")
                .and_then(lenient::scalar_string)
                .unwrap_or_default(),
            sizes: map
                .get("sizes")
                .map(SlotSize::list_from_value)
                .unwrap_or_default(),
            positions: map
                .get("positions")
                .map(lenient::string_list)
                .unwrap_or_default(),
        })
    }

    pub fn is_positioned(&self) -> bool {
        !self.positions.is_empty()
    }

    pub fn has_position(&self, position: &str) -> bool {
        self.positions.iter().any(|p| p == position)
    }
}

/// Which slots of a unit are switched on for a page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SlotPositions {
    #[default]
    Inactive,
    /// Active position-less unit.
    Single,
    Listed(Vec<String>),
}

impl Serialize for SlotPositions {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SlotPositions::Inactive => serializer.serialize_bool(false),
            SlotPositions::Single => serializer.serialize_bool(true),
            SlotPositions::Listed(ids) => ids.serialize(serializer),
        }
    }
}

/// A setting that is either one value for a position-less unit or a map keyed
/// by position id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PositionValue<T> {
    Flat(T),
    ByPosition(IndexMap<String, T>),
}

impl<T> Default for PositionValue<T> {
    fn default() -> Self {
        PositionValue::ByPosition(IndexMap::new())
    }
}

impl<T> PositionValue<T> {
    /// A flat value only answers for the position-less slot and a map only
    /// answers for positions.
    pub fn get(&self, position: Option<&str>) -> Option<&T> {
        match (self, position) {
            (PositionValue::Flat(value), None) => Some(value),
            (PositionValue::ByPosition(map), Some(pos)) => map.get(pos),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PositionValue::ByPosition(map) if map.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TargetingValue {
    Single(String),
    Multi(Vec<String>),
}

impl TargetingValue {
    /// `"0"` is a real value; only the empty string and empty lists are empty.
    pub fn is_empty(&self) -> bool {
        match self {
            TargetingValue::Single(s) => s.is_empty(),
            TargetingValue::Multi(items) => items.is_empty(),
        }
    }
}

impl From<&str> for TargetingValue {
    fn from(value: &str) -> Self {
        TargetingValue::Single(value.to_string())
    }
}

pub type TargetingMap = IndexMap<String, TargetingValue>;

/// Page-level settings for one ad unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlotOverride {
    #[serde(default, deserialize_with = "lenient::de_positions")]
    pub positions: SlotPositions,
    #[serde(default, deserialize_with = "lenient::de_size_mapping")]
    pub size_mapping: PositionValue<String>,
    #[serde(default, deserialize_with = "lenient::de_truthy")]
    pub out_of_page: bool,
    #[serde(default, deserialize_with = "lenient::de_custom_targeting")]
    pub custom_targeting: PositionValue<TargetingMap>,
    #[serde(default, deserialize_with = "lenient::de_lazy_load")]
    pub lazy_load: PositionValue<bool>,
}

/// Fully resolved ad layout for one page render.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolvedAdConfiguration {
    #[serde(default, deserialize_with = "lenient::de_string_list")]
    pub size_mapping_definitions: Vec<String>,
    #[serde(default, deserialize_with = "de_ad_slots")]
    pub ad_slots: IndexMap<String, SlotOverride>,
    #[serde(default, deserialize_with = "lenient::de_truthy")]
    pub disable_ads: bool,
}

impl ResolvedAdConfiguration {
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn de_ad_slots<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<IndexMap<String, SlotOverride>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(lenient::object_entries(&value)
        .into_iter()
        .filter_map(|(unit, raw)| match SlotOverride::deserialize(raw) {
            Ok(slot) => Some((unit, slot)),
            Err(e) => {
                tracing::debug!("Ignoring unreadable ad slot entry '{}': {}", unit, e);
                None
            }
        })
        .collect())
}

/// Where the current request sits in the site, as reported by the CMS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContext {
    Home,
    Single {
        post_type: String,
        /// Category and tag slugs attached to the post.
        slugs: Vec<String>,
    },
    Category {
        slug: String,
    },
    Tag {
        slug: String,
    },
    Page {
        slug: String,
        item_id: Option<String>,
        /// Comma-separated `pagetype` meta value.
        pagetype_meta: Option<String>,
    },
    Archive,
    NotFound,
    Other,
}

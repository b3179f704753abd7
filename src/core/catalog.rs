use crate::core::script::identifier;
use crate::domain::lenient;
use crate::domain::model::{AdUnitDefinition, Breakpoint, SizeMapping, SlotSize};
use indexmap::IndexMap;
use serde_json::Value;

/// Ad units known to the site, keyed by unit id in stored order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdTaxonomy {
    units: IndexMap<String, AdUnitDefinition>,
}

impl AdTaxonomy {
    pub fn new(units: impl IntoIterator<Item = AdUnitDefinition>) -> Self {
        Self {
            units: units.into_iter().map(|u| (u.id.clone(), u)).collect(),
        }
    }

    /// Unreadable entries are dropped with a warning.
    pub fn from_value(value: &Value) -> Self {
        let mut units = IndexMap::new();
        for (id, raw) in lenient::object_entries(value) {
            match AdUnitDefinition::from_value(&id, &raw) {
                Some(unit) => {
                    units.insert(id, unit);
                }
                None => tracing::warn!("Ignoring malformed ad taxonomy entry '{}'", id),
            }
        }
        Self { units }
    }

    pub fn get(&self, id: &str) -> Option<&AdUnitDefinition> {
        self.units.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.units.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// GAM path for a unit, or `None` when the unit or its path is missing.
    pub fn path_of(&self, id: &str) -> Option<&str> {
        self.get(id)
            .map(|u| u.path.as_str())
            .filter(|p| !p.is_empty())
    }

    /// Taxonomy sizes adjusted by manual includes and excludes.
    ///
    /// Mirrors the legacy helper: includes are appended, then the result is
    /// the symmetric difference with `excludes`, so excluding a size the unit
    /// does not have adds it.
    pub fn sizes_for(&self, id: &str, includes: &[SlotSize], excludes: &[SlotSize]) -> Vec<SlotSize> {
        let Some(unit) = self.get(id) else {
            return Vec::new();
        };

        let mut sizes = unit.sizes.clone();
        sizes.extend(includes.iter().cloned());

        let mut result: Vec<SlotSize> = sizes
            .iter()
            .filter(|s| !excludes.contains(s))
            .cloned()
            .collect();
        result.extend(excludes.iter().filter(|e| !sizes.contains(e)).cloned());
        result
    }
}

/// Named size mappings in stored order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeMappingCatalog {
    mappings: IndexMap<String, SizeMapping>,
    /// Script variable per mapping name, unique across the catalog.
    variables: IndexMap<String, String>,
}

impl SizeMappingCatalog {
    pub fn new(mappings: impl IntoIterator<Item = SizeMapping>) -> Self {
        Self::from_mappings(mappings.into_iter().map(|m| (m.name.clone(), m)).collect())
    }

    fn from_mappings(mappings: IndexMap<String, SizeMapping>) -> Self {
        let mut variables: IndexMap<String, String> = IndexMap::new();
        for name in mappings.keys() {
            let base = identifier(name);
            let mut candidate = base.clone();
            let mut suffix = 2;
            while variables.values().any(|taken| *taken == candidate) {
                candidate = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            if candidate != base {
                tracing::warn!(
                    "Size mapping '{}' clashes with another mapping as '{}', declaring it as '{}'",
                    name,
                    base,
                    candidate
                );
            }
            variables.insert(name.clone(), candidate);
        }
        Self { mappings, variables }
    }

    pub fn from_value(value: &Value) -> Self {
        let mut mappings = IndexMap::new();
        for (name, raw) in lenient::object_entries(value) {
            let breakpoints: Vec<Breakpoint> = match &raw {
                Value::Array(items) => items.iter().filter_map(Breakpoint::from_value).collect(),
                _ => Vec::new(),
            };
            if breakpoints.is_empty() {
                tracing::warn!("Size mapping '{}' has no readable breakpoints", name);
                continue;
            }
            mappings.insert(name.clone(), SizeMapping { name, breakpoints });
        }
        Self::from_mappings(mappings)
    }

    /// Empty names and mappings without breakpoints never resolve.
    pub fn get(&self, name: &str) -> Option<&SizeMapping> {
        if name.is_empty() {
            return None;
        }
        self.mappings.get(name).filter(|m| !m.breakpoints.is_empty())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Script variable holding the built mapping, for names that resolve.
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.get(name)?;
        self.variables.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Category/tag slug to `pagetype` targeting values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageTypeMapping {
    values: IndexMap<String, Vec<String>>,
}

impl PageTypeMapping {
    pub fn new(values: IndexMap<String, Vec<String>>) -> Self {
        Self { values }
    }

    pub fn from_value(value: &Value) -> Self {
        Self {
            values: lenient::object_entries(value)
                .into_iter()
                .map(|(slug, raw)| (slug, lenient::string_list(&raw)))
                .collect(),
        }
    }

    pub fn values_for(&self, slug: &str) -> &[String] {
        self.values.get(slug).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

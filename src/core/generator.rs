use crate::core::catalog::{AdTaxonomy, SizeMappingCatalog};
use crate::core::script::{single_quoted, CallChain, Expr, Script, Stmt};
use crate::domain::model::{
    AdUnitDefinition, Breakpoint, PositionValue, ResolvedAdConfiguration, SlotOverride,
    SlotPositions, SlotSize, TargetingValue,
};
use indexmap::IndexMap;
use serde_json::Value;

pub const DIV_ID_PREFIX: &str = "div-gpt-ad-";
pub const LAZY_SLOTS_VAR: &str = "lazyLoadedAdSlots";
pub const INITIAL_SLOTS_VAR: &str = "initialAdSlotsRequested";

/// DOM id shared by a slot definition and its display placeholder.
/// An empty position means none; `"0"` is a real position.
pub fn div_id(unit_id: &str, position: Option<&str>) -> String {
    match position.filter(|p| !p.is_empty()) {
        Some(pos) => format!("{}{}-{}", DIV_ID_PREFIX, unit_id, pos),
        None => format!("{}{}", DIV_ID_PREFIX, unit_id),
    }
}

/// Targeting pair marking a slot as eligible for viewability refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTargeting {
    pub key: String,
    pub value: String,
}

impl Default for RefreshTargeting {
    fn default() -> Self {
        Self {
            key: "refresh".to_string(),
            value: "true".to_string(),
        }
    }
}

/// One `defineSlot` / `defineOutOfPageSlot` call before rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotDefinition {
    pub unit_id: String,
    pub position: Option<String>,
    pub div_id: String,
    pub out_of_page: bool,
    pub path: String,
    /// Always empty for out-of-page slots.
    pub sizes: Vec<SlotSize>,
    pub size_mapping: Option<String>,
    /// Script variable the mapping was declared as.
    pub size_mapping_var: Option<String>,
    pub targeting: Vec<(String, TargetingValue)>,
    pub lazy: bool,
}

impl SlotDefinition {
    pub fn to_expr(&self) -> Expr {
        let mut args = vec![Expr::str(self.path.as_str())];
        if !self.out_of_page {
            args.push(Expr::Raw(sizes_literal(&self.sizes)));
        }
        args.push(Expr::str(self.div_id.as_str()));

        let define = if self.out_of_page {
            "defineOutOfPageSlot"
        } else {
            "defineSlot"
        };
        let mut chain = CallChain::new("googletag").call(define, args);

        if let Some(variable) = &self.size_mapping_var {
            chain = chain.call("defineSizeMapping", vec![Expr::ident(variable.as_str())]);
        }
        chain = chain.call("addService", vec![Expr::ident("googletag.pubads()")]);
        for (key, value) in &self.targeting {
            chain = chain.call(
                "setTargeting",
                vec![Expr::str(key.as_str()), Expr::Json(targeting_json(value))],
            );
        }

        Expr::Chain(chain)
    }
}

/// Output of one generation pass.
#[derive(Debug, Clone, Default)]
pub struct GeneratedScripts {
    pub size_mapping_script: Script,
    pub slot_definition_script: Script,
    /// Div id to definition, in emission order.
    pub lazy_slots: IndexMap<String, SlotDefinition>,
    pub initial_slots: Vec<SlotDefinition>,
}

impl GeneratedScripts {
    pub fn size_mapping_text(&self) -> String {
        self.size_mapping_script.render()
    }

    pub fn slot_definition_text(&self) -> String {
        self.slot_definition_script.render()
    }

    pub fn all_slots(&self) -> impl Iterator<Item = &SlotDefinition> {
        self.lazy_slots.values().chain(self.initial_slots.iter())
    }
}

/// Emits size-mapping builders and slot definitions for a resolved page.
#[derive(Debug, Clone)]
pub struct ScriptGenerator<'a> {
    taxonomy: &'a AdTaxonomy,
    size_mappings: &'a SizeMappingCatalog,
    network_id: &'a str,
    lazy_load_enabled: bool,
    refresh: RefreshTargeting,
}

impl<'a> ScriptGenerator<'a> {
    pub fn new(
        taxonomy: &'a AdTaxonomy,
        size_mappings: &'a SizeMappingCatalog,
        network_id: &'a str,
    ) -> Self {
        Self {
            taxonomy,
            size_mappings,
            network_id,
            lazy_load_enabled: false,
            refresh: RefreshTargeting::default(),
        }
    }

    pub fn with_lazy_load(mut self, enabled: bool) -> Self {
        self.lazy_load_enabled = enabled;
        self
    }

    pub fn with_refresh_targeting(mut self, refresh: RefreshTargeting) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn generate(&self, config: &ResolvedAdConfiguration) -> GeneratedScripts {
        let mut output = GeneratedScripts {
            size_mapping_script: self.size_mapping_script(config),
            ..GeneratedScripts::default()
        };

        let mut script = Script::new();
        if config.ad_slots.is_empty() {
            tracing::warn!("No ad slots configured for this page");
            script.push(Stmt::comment(
                "Unable to create ad slot definitions due to missing configuration array on template",
            ));
            script.push(Stmt::var(LAZY_SLOTS_VAR, Expr::Object(vec![])));
            script.push(Stmt::var(INITIAL_SLOTS_VAR, Expr::Array(vec![])));
            output.slot_definition_script = script;
            return output;
        }

        for (unit_id, slot) in &config.ad_slots {
            let Some(unit) = self.taxonomy.get(unit_id) else {
                tracing::warn!("Ad unit '{}' is not in the taxonomy, skipping", unit_id);
                script.push(Stmt::comment(format!(
                    "Unable to create ad slot definitions for {} due to missing ad type configuration",
                    unit_id
                )));
                continue;
            };

            for definition in self.definitions_for(unit, slot) {
                tracing::debug!(
                    div_id = %definition.div_id,
                    lazy = definition.lazy,
                    "Defined ad slot"
                );
                if definition.lazy {
                    output.lazy_slots.insert(definition.div_id.clone(), definition);
                } else {
                    output.initial_slots.push(definition);
                }
            }
        }

        script.push(Stmt::var(
            LAZY_SLOTS_VAR,
            Expr::Object(
                output
                    .lazy_slots
                    .iter()
                    .map(|(id, def)| (id.clone(), def.to_expr()))
                    .collect(),
            ),
        ));
        script.push(Stmt::Blank);
        script.push(Stmt::var(
            INITIAL_SLOTS_VAR,
            Expr::Array(output.initial_slots.iter().map(SlotDefinition::to_expr).collect()),
        ));

        output.slot_definition_script = script;
        output
    }

    /// One definition per taxonomy position that is also active, in taxonomy
    /// order; exactly one for a position-less unit.
    pub fn definitions_for(&self, unit: &AdUnitDefinition, slot: &SlotOverride) -> Vec<SlotDefinition> {
        if unit.is_positioned() {
            let active: &[String] = match &slot.positions {
                SlotPositions::Listed(ids) => ids,
                _ => &[],
            };
            unit.positions
                .iter()
                .filter(|pos| active.contains(pos))
                .map(|pos| self.definition(unit, slot, Some(pos)))
                .collect()
        } else if slot.positions == SlotPositions::Inactive {
            Vec::new()
        } else {
            vec![self.definition(unit, slot, None)]
        }
    }

    fn definition(&self, unit: &AdUnitDefinition, slot: &SlotOverride, position: Option<&str>) -> SlotDefinition {
        let size_mapping = slot
            .size_mapping
            .get(position)
            .filter(|name| !name.is_empty())
            .and_then(|name| match self.size_mappings.variable(name) {
                Some(variable) => Some((name.clone(), variable.to_string())),
                None => {
                    tracing::warn!(
                        "Size mapping '{}' for {} is not defined, omitting",
                        name,
                        div_id(&unit.id, position)
                    );
                    None
                }
            });
        let (size_mapping, size_mapping_var) = size_mapping.unzip();

        let mut targeting = Vec::new();
        push_targeting(
            &mut targeting,
            &self.refresh.key,
            TargetingValue::Single(self.refresh.value.clone()),
        );
        if let Some(pos) = position {
            push_targeting(&mut targeting, "position", TargetingValue::Single(pos.to_string()));
        }
        if let Some(custom) = slot.custom_targeting.get(position) {
            for (key, value) in custom {
                push_targeting(&mut targeting, key, value.clone());
            }
        }

        SlotDefinition {
            unit_id: unit.id.clone(),
            position: position.map(str::to_string),
            div_id: div_id(&unit.id, position),
            out_of_page: slot.out_of_page,
            path: format!("/{}{}", self.network_id, unit.path),
            sizes: if slot.out_of_page {
                Vec::new()
            } else {
                self.taxonomy.sizes_for(&unit.id, &[], &[])
            },
            size_mapping,
            size_mapping_var,
            targeting,
            lazy: self.lazy_load_enabled && slot.lazy_load.get(position) == Some(&true),
        }
    }

    /// Builders for every mapping the page uses. Names referenced by slots
    /// but missing from `size_mapping_definitions` are appended so a mapping
    /// is always declared before a slot refers to it.
    fn size_mapping_script(&self, config: &ResolvedAdConfiguration) -> Script {
        let mut names: Vec<&str> = Vec::new();
        for name in &config.size_mapping_definitions {
            if !name.is_empty() && !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        for slot in config.ad_slots.values() {
            let referenced: Vec<&String> = match &slot.size_mapping {
                PositionValue::Flat(name) => vec![name],
                PositionValue::ByPosition(map) => map.values().collect(),
            };
            for name in referenced {
                if !name.is_empty() && !names.contains(&name.as_str()) {
                    tracing::debug!("Size mapping '{}' used but not listed, declaring it", name);
                    names.push(name);
                }
            }
        }

        let mut script = Script::new();
        for name in names {
            match self.size_mappings.get(name).zip(self.size_mappings.variable(name)) {
                Some((mapping, variable)) => {
                    let mut chain = CallChain::new("googletag").call("sizeMapping", vec![]);
                    for breakpoint in &mapping.breakpoints {
                        chain = chain.call("addSize", breakpoint_args(breakpoint));
                    }
                    chain = chain.call("build", vec![]).multiline();
                    script.push(Stmt::var(variable, Expr::Chain(chain)));
                    script.push(Stmt::Blank);
                }
                None => {
                    tracing::warn!("Size mapping configuration does not exist for {}", name);
                    script.push(Stmt::comment(format!(
                        "Size mapping configuration does not exist for {}",
                        name
                    )));
                }
            }
        }
        script
    }
}

/// Key must be non-empty; the value must be non-empty, where `"0"` counts.
fn push_targeting(targeting: &mut Vec<(String, TargetingValue)>, key: &str, value: TargetingValue) {
    if !key.is_empty() && !value.is_empty() {
        targeting.push((key.to_string(), value));
    }
}

fn targeting_json(value: &TargetingValue) -> Value {
    match value {
        TargetingValue::Single(s) => Value::String(s.clone()),
        TargetingValue::Multi(items) => {
            Value::Array(items.iter().cloned().map(Value::String).collect())
        }
    }
}

pub fn size_literal(size: &SlotSize) -> String {
    match size {
        SlotSize::Dimensions(w, h) => format!("[{},{}]", w, h),
        SlotSize::Literal(text) if text.starts_with(['[', '\'', '"']) => text.clone(),
        SlotSize::Literal(text) => single_quoted(text),
    }
}

pub fn sizes_literal(sizes: &[SlotSize]) -> String {
    let parts: Vec<String> = sizes.iter().map(size_literal).collect();
    format!("[{}]", parts.join(","))
}

fn breakpoint_args(breakpoint: &Breakpoint) -> Vec<Expr> {
    match breakpoint {
        Breakpoint::Pair { viewport, sizes } => vec![
            Expr::Raw(format!("[{}, {}]", viewport.0, viewport.1)),
            Expr::Raw(sizes_literal(sizes)),
        ],
        Breakpoint::Literal(text) => vec![Expr::Raw(text.clone())],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SizeMapping;

    fn taxonomy() -> AdTaxonomy {
        AdTaxonomy::new(vec![
            AdUnitDefinition {
                id: "box".to_string(),
                path: "/box".to_string(),
                sizes: vec![SlotSize::Dimensions(300, 250), SlotSize::Literal("fluid".to_string())],
                positions: vec!["1".to_string(), "2".to_string(), "3".to_string()],
            },
            AdUnitDefinition {
                id: "int".to_string(),
                path: "/interstitial".to_string(),
                sizes: vec![SlotSize::Dimensions(1, 1)],
                positions: vec![],
            },
        ])
    }

    fn catalog() -> SizeMappingCatalog {
        SizeMappingCatalog::new(vec![SizeMapping {
            name: "mappingBox".to_string(),
            breakpoints: vec![
                Breakpoint::Pair {
                    viewport: (1024, 0),
                    sizes: vec![SlotSize::Dimensions(300, 600), SlotSize::Dimensions(300, 250)],
                },
                Breakpoint::Pair {
                    viewport: (0, 0),
                    sizes: vec![],
                },
            ],
        }])
    }

    #[test]
    fn test_div_id() {
        assert_eq!(div_id("box", None), "div-gpt-ad-box");
        assert_eq!(div_id("box", Some("")), "div-gpt-ad-box");
        assert_eq!(div_id("box", Some("0")), "div-gpt-ad-box-0");
        assert_eq!(div_id("box", Some("2")), "div-gpt-ad-box-2");
    }

    #[test]
    fn test_positions_follow_taxonomy_order() {
        let taxonomy = taxonomy();
        let catalog = catalog();
        let generator = ScriptGenerator::new(&taxonomy, &catalog, "1234");
        let slot = SlotOverride {
            positions: SlotPositions::Listed(vec!["3".to_string(), "1".to_string(), "7".to_string()]),
            ..SlotOverride::default()
        };

        let defs = generator.definitions_for(taxonomy.get("box").unwrap(), &slot);
        let ids: Vec<&str> = defs.iter().map(|d| d.div_id.as_str()).collect();
        assert_eq!(ids, vec!["div-gpt-ad-box-1", "div-gpt-ad-box-3"]);
        assert_eq!(defs[0].path, "/1234/box");
        assert_eq!(sizes_literal(&defs[0].sizes), "[[300,250],'fluid']");
    }

    #[test]
    fn test_size_mapping_builder() {
        let taxonomy = taxonomy();
        let catalog = catalog();
        let generator = ScriptGenerator::new(&taxonomy, &catalog, "1234");
        let config = ResolvedAdConfiguration {
            size_mapping_definitions: vec!["mappingBox".to_string(), "mappingGone".to_string()],
            ..ResolvedAdConfiguration::default()
        };

        let out = generator.generate(&config);
        assert_eq!(
            out.size_mapping_text(),
            "var mappingBox = googletag.sizeMapping()\n    .addSize([1024, 0], [[300,600],[300,250]])\n    .addSize([0, 0], [])\n    .build();\n\n// Size mapping configuration does not exist for mappingGone\n"
        );
    }

    #[test]
    fn test_colliding_mapping_names_keep_their_own_builders() {
        let taxonomy = taxonomy();
        let catalog = SizeMappingCatalog::new(vec![
            SizeMapping {
                name: "mapping-a".to_string(),
                breakpoints: vec![Breakpoint::Pair {
                    viewport: (1024, 0),
                    sizes: vec![SlotSize::Dimensions(300, 600)],
                }],
            },
            SizeMapping {
                name: "mapping_a".to_string(),
                breakpoints: vec![Breakpoint::Pair {
                    viewport: (0, 0),
                    sizes: vec![SlotSize::Dimensions(300, 250)],
                }],
            },
        ]);
        let generator = ScriptGenerator::new(&taxonomy, &catalog, "1234");
        let mut by_position = IndexMap::new();
        by_position.insert("1".to_string(), "mapping-a".to_string());
        by_position.insert("2".to_string(), "mapping_a".to_string());
        let mut ad_slots = IndexMap::new();
        ad_slots.insert(
            "box".to_string(),
            SlotOverride {
                positions: SlotPositions::Listed(vec!["1".to_string(), "2".to_string()]),
                size_mapping: PositionValue::ByPosition(by_position),
                ..SlotOverride::default()
            },
        );
        let config = ResolvedAdConfiguration {
            ad_slots,
            size_mapping_definitions: vec!["mapping-a".to_string(), "mapping_a".to_string()],
            ..ResolvedAdConfiguration::default()
        };

        let out = generator.generate(&config);
        let mappings = out.size_mapping_text();
        assert!(mappings.contains("var mapping_a = googletag.sizeMapping()\n    .addSize([1024, 0], [[300,600]])"));
        assert!(mappings.contains("var mapping_a_2 = googletag.sizeMapping()\n    .addSize([0, 0], [[300,250]])"));

        let slots = out.slot_definition_text();
        assert!(slots.contains("'div-gpt-ad-box-1').defineSizeMapping(mapping_a).addService"));
        assert!(slots.contains("'div-gpt-ad-box-2').defineSizeMapping(mapping_a_2).addService"));
        let vars: Vec<&str> = out.all_slots().filter_map(|d| d.size_mapping_var.as_deref()).collect();
        assert_eq!(vars, vec!["mapping_a", "mapping_a_2"]);
    }

    #[test]
    fn test_missing_slots_still_declare_batches() {
        let taxonomy = taxonomy();
        let catalog = catalog();
        let generator = ScriptGenerator::new(&taxonomy, &catalog, "1234").with_lazy_load(true);

        let out = generator.generate(&ResolvedAdConfiguration::default());
        assert!(out.slot_definition_script.find_var(LAZY_SLOTS_VAR).is_some());
        assert!(out.slot_definition_script.find_var(INITIAL_SLOTS_VAR).is_some());
        assert_eq!(out.slot_definition_script.comments().count(), 1);
        assert!(out.slot_definition_text().contains("var lazyLoadedAdSlots = {};"));
        assert!(out.slot_definition_text().contains("var initialAdSlotsRequested = [];"));
    }

    #[test]
    fn test_out_of_page_call() {
        let taxonomy = taxonomy();
        let catalog = catalog();
        let generator = ScriptGenerator::new(&taxonomy, &catalog, "1234");
        let slot = SlotOverride {
            positions: SlotPositions::Single,
            out_of_page: true,
            ..SlotOverride::default()
        };

        let defs = generator.definitions_for(taxonomy.get("int").unwrap(), &slot);
        assert_eq!(defs.len(), 1);
        let mut script = Script::new();
        script.push(Stmt::Expr(defs[0].to_expr()));
        assert_eq!(
            script.render(),
            "googletag.defineOutOfPageSlot('/1234/interstitial', 'div-gpt-ad-int').addService(googletag.pubads()).setTargeting('refresh', \"true\");\n"
        );
    }

    #[test]
    fn test_inactive_positionless_unit_is_not_defined() {
        let taxonomy = taxonomy();
        let catalog = catalog();
        let generator = ScriptGenerator::new(&taxonomy, &catalog, "1234");
        let defs = generator.definitions_for(taxonomy.get("int").unwrap(), &SlotOverride::default());
        assert!(defs.is_empty());
    }
}

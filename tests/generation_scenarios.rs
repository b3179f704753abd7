use gam_slots::core::generator::{div_id, GeneratedScripts, INITIAL_SLOTS_VAR, LAZY_SLOTS_VAR};
use gam_slots::core::script::Expr;
use gam_slots::domain::lenient;
use gam_slots::{AdConfigurationResolver, AdSettings, ResolvedAdConfiguration, ScriptGenerator};
use serde_json::{json, Value};

fn settings(lazy: bool) -> AdSettings {
    let lazy_flag = if lazy { "on" } else { "" };
    let options = lenient::object_entries(&json!({
        "network_id": "21804848220",
        "lazy_load_enabled": lazy_flag,
        "ad_taxonomy": {
            "leaderboard": {
                "path": "/leaderboard",
                "sizes": [[728, 90], [970, 250]],
                "positions": ["1", "2"]
            },
            "native": {"path": "/native", "sizes": ["fluid"], "positions": ["0"]},
            "int": {"path": "/interstitial", "sizes": [[1, 1]], "positions": []},
            "sliding": {"path": "/sliding", "sizes": [[300, 250]], "positions": []}
        },
        "size_mapping": {
            "mappingTop": [[[1024, 0], [[970, 250], [728, 90]]], [[0, 0], []]],
            "mappingSliding": [[[0, 0], [[300, 250]]]]
        }
    }));
    AdSettings::from_options(&options).unwrap()
}

fn generate(settings: &AdSettings, raw: Value) -> (ResolvedAdConfiguration, GeneratedScripts) {
    let resolver = AdConfigurationResolver::new(&settings.taxonomy);
    let config = resolver.resolve(Some(&raw.to_string()), &ResolvedAdConfiguration::default());
    let generated = ScriptGenerator::new(&settings.taxonomy, &settings.size_mappings, &settings.network_id)
        .with_lazy_load(settings.lazy_load_enabled)
        .with_refresh_targeting(settings.refresh.clone())
        .generate(&config);
    (config, generated)
}

fn leaderboard_override() -> Value {
    json!({
        "ad_slots": {
            "leaderboard": {
                "positions": ["1", "2"],
                "size_mapping": {"1": "mappingTop"},
                "lazy_load": {"1": true}
            }
        }
    })
}

#[test]
fn test_leaderboard_scenario() {
    let settings = settings(true);
    let (config, generated) = generate(&settings, leaderboard_override());

    assert_eq!(config.size_mapping_definitions, vec!["mappingTop".to_string()]);
    assert_eq!(generated.lazy_slots.len(), 1);
    assert_eq!(generated.initial_slots.len(), 1);

    let lazy = &generated.lazy_slots["div-gpt-ad-leaderboard-1"];
    assert_eq!(lazy.size_mapping.as_deref(), Some("mappingTop"));
    assert_eq!(lazy.path, "/21804848220/leaderboard");

    let immediate = &generated.initial_slots[0];
    assert_eq!(immediate.div_id, "div-gpt-ad-leaderboard-2");
    assert_eq!(immediate.size_mapping, None);

    let Expr::Chain(chain) = immediate.to_expr() else {
        panic!("slot definition should be a call chain");
    };
    assert!(chain.find("defineSizeMapping").is_none());
    let methods: Vec<&str> = chain.methods().collect();
    assert_eq!(methods, vec!["defineSlot", "addService", "setTargeting", "setTargeting"]);

    let mapping_text = generated.size_mapping_text();
    assert!(mapping_text.starts_with("var mappingTop = googletag.sizeMapping()"));
    assert!(mapping_text.contains(".addSize([1024, 0], [[970,250],[728,90]])"));
}

#[test]
fn test_lazy_loading_disabled_makes_every_slot_immediate() {
    let settings = settings(false);
    let (_, generated) = generate(&settings, leaderboard_override());

    assert!(generated.lazy_slots.is_empty());
    assert_eq!(generated.initial_slots.len(), 2);
    let text = generated.slot_definition_text();
    assert!(text.contains("var lazyLoadedAdSlots = {};"));
    assert_eq!(generated.slot_definition_script.find_var(LAZY_SLOTS_VAR), Some(&Expr::Object(vec![])));
    assert!(generated.slot_definition_script.find_var(INITIAL_SLOTS_VAR).is_some());
}

#[test]
fn test_one_definition_per_active_taxonomy_position() {
    let settings = settings(false);
    let (_, generated) = generate(
        &settings,
        json!({"ad_slots": {"leaderboard": {"positions": ["2", "5"]}, "native": {"positions": ["0"]}}}),
    );

    let ids: Vec<&str> = generated.all_slots().map(|d| d.div_id.as_str()).collect();
    assert_eq!(ids, vec!["div-gpt-ad-leaderboard-2", "div-gpt-ad-native-0"]);
    assert_eq!(div_id("native", Some("0")), "div-gpt-ad-native-0");
}

#[test]
fn test_out_of_page_slots_have_no_sizes() {
    let settings = settings(false);
    let (_, generated) = generate(
        &settings,
        json!({"ad_slots": {"int": {"positions": [], "out_of_page": "on"}}}),
    );

    let slot = &generated.initial_slots[0];
    assert!(slot.out_of_page);
    assert!(slot.sizes.is_empty());
    assert!(generated
        .slot_definition_text()
        .contains("googletag.defineOutOfPageSlot('/21804848220/interstitial', 'div-gpt-ad-int')"));
}

#[test]
fn test_targeting_zero_is_kept_and_empty_is_dropped() {
    let settings = settings(false);
    let (_, generated) = generate(
        &settings,
        json!({
            "ad_slots": {
                "sliding": {
                    "positions": true,
                    "custom_targeting": {"tier": "0", "blank": "", "multi": ["a", "b"]}
                }
            }
        }),
    );

    let text = generated.slot_definition_text();
    assert!(text.contains(".setTargeting('tier', \"0\")"));
    assert!(text.contains(".setTargeting('multi', [\"a\",\"b\"])"));
    assert!(!text.contains("'blank'"));
}

#[test]
fn test_unknown_unit_is_reported_in_script() {
    let settings = settings(false);
    let (config, generated) = generate(
        &settings,
        json!({"ad_slots": {"ghost": {"positions": ["1"]}, "sliding": {"positions": "on"}}}),
    );

    assert!(config.ad_slots.contains_key("ghost"));
    let comments: Vec<&str> = generated.slot_definition_script.comments().collect();
    assert_eq!(
        comments,
        vec!["Unable to create ad slot definitions for ghost due to missing ad type configuration"]
    );
    let ids: Vec<&str> = generated.all_slots().map(|d| d.div_id.as_str()).collect();
    assert_eq!(ids, vec!["div-gpt-ad-sliding"]);
}

#[test]
fn test_mapping_referenced_only_by_slot_is_still_declared() {
    let settings = settings(false);
    let config = ResolvedAdConfiguration::from_value(json!({
        "size_mapping_definitions": [],
        "ad_slots": {"sliding": {"positions": true, "size_mapping": "mappingSliding"}}
    }))
    .unwrap();
    let generated = ScriptGenerator::new(&settings.taxonomy, &settings.size_mappings, &settings.network_id)
        .generate(&config);

    assert!(generated.size_mapping_text().contains("var mappingSliding = googletag.sizeMapping()"));
    assert!(generated.slot_definition_text().contains(".defineSizeMapping(mappingSliding)"));
}

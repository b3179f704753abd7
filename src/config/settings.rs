use crate::core::catalog::{AdTaxonomy, PageTypeMapping, SizeMappingCatalog};
use crate::core::generator::RefreshTargeting;
use crate::core::resolver::{builtin_default_configuration, AdConfigurationResolver};
use crate::domain::lenient;
use crate::domain::model::ResolvedAdConfiguration;
use crate::domain::ports::OptionMap;
use crate::utils::error::{AdError, Result};
use crate::utils::validation::{self, Validate};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::Path;

pub const DEFAULT_SECONDS_TO_WAIT: u32 = 30;
pub const DEFAULT_INTERSECTION_MARGIN: u32 = 200;
pub const MAX_INTERSECTION_MARGIN: u32 = 1000;
/// Page slugs treated as section fronts unless the options list their own.
pub const DEFAULT_SECTION_FRONTS: [&str; 7] =
    ["business", "crave", "editorial", "features", "news", "sports", "travel"];

/// Process-wide ad settings, loaded once and shared read-only by requests.
#[derive(Debug, Clone, PartialEq)]
pub struct AdSettings {
    pub network_id: String,
    pub taxonomy: AdTaxonomy,
    pub size_mappings: SizeMappingCatalog,
    /// Layout for archive, article, 404 and page templates without an override.
    pub default_configuration: ResolvedAdConfiguration,
    pub homepage_configuration: ResolvedAdConfiguration,
    pub page_type_mapping: PageTypeMapping,
    pub seconds_to_wait_after_viewability: u32,
    pub lazy_load_enabled: bool,
    /// Percent of the viewport height added above and below for lazy loading.
    pub intersection_margin: u32,
    pub refresh: RefreshTargeting,
    /// Page slugs treated as section fronts for `pagetype` targeting.
    pub section_fronts: Vec<String>,
    /// Extra page-level targeting pairs, e.g. site identifiers.
    pub page_targeting: IndexMap<String, String>,
}

impl Default for AdSettings {
    fn default() -> Self {
        Self {
            network_id: String::new(),
            taxonomy: AdTaxonomy::default(),
            size_mappings: SizeMappingCatalog::default(),
            default_configuration: ResolvedAdConfiguration::default(),
            homepage_configuration: builtin_default_configuration(),
            page_type_mapping: PageTypeMapping::default(),
            seconds_to_wait_after_viewability: DEFAULT_SECONDS_TO_WAIT,
            lazy_load_enabled: false,
            intersection_margin: DEFAULT_INTERSECTION_MARGIN,
            refresh: RefreshTargeting::default(),
            section_fronts: DEFAULT_SECTION_FRONTS.iter().map(|s| s.to_string()).collect(),
            page_targeting: IndexMap::new(),
        }
    }
}

impl AdSettings {
    /// Build settings from the raw option map. Blank options fall back to
    /// their defaults; JSON blobs that do not parse are rejected.
    pub fn from_options(options: &OptionMap) -> Result<Self> {
        let mut settings = AdSettings {
            network_id: scalar(options, "network_id").unwrap_or_default(),
            ..AdSettings::default()
        };

        if let Some(value) = blob(options, "ad_taxonomy")? {
            settings.taxonomy = AdTaxonomy::from_value(&value);
        }
        if let Some(value) = blob(options, "size_mapping")? {
            settings.size_mappings = SizeMappingCatalog::from_value(&value);
        }
        if let Some(value) = blob(options, "page_type_mapping")? {
            settings.page_type_mapping = PageTypeMapping::from_value(&value);
        }

        let resolver = AdConfigurationResolver::new(&settings.taxonomy);
        if let Some(value) = blob(options, "default_ad_configuration")? {
            settings.default_configuration = resolver.normalize(layout(&value, "default_ad_configuration")?);
        }
        settings.homepage_configuration = match blob(options, "homepage_ad_configuration")? {
            Some(value) => resolver.normalize(layout(&value, "homepage_ad_configuration")?),
            None => resolver.normalize(builtin_default_configuration()),
        };

        settings.seconds_to_wait_after_viewability =
            number(options, "seconds_to_wait_after_viewability").unwrap_or(DEFAULT_SECONDS_TO_WAIT);
        settings.intersection_margin =
            number(options, "intersection_margin").unwrap_or(DEFAULT_INTERSECTION_MARGIN);
        settings.lazy_load_enabled = options
            .get("lazy_load_enabled")
            .map(lenient::truthy)
            .unwrap_or(false);

        if let Some(key) = scalar(options, "refresh_key") {
            settings.refresh.key = key;
        }
        if let Some(value) = scalar(options, "refresh_value") {
            settings.refresh.value = value;
        }

        if let Some(raw) = options.get("section_fronts") {
            settings.section_fronts = match raw {
                Value::String(s) => s
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
                other => lenient::string_list(other),
            };
        }
        if let Some(value) = blob(options, "page_targeting")? {
            settings.page_targeting = lenient::object_entries(&value)
                .into_iter()
                .filter_map(|(k, v)| lenient::scalar_string(&v).map(|v| (k, v)))
                .collect();
        }

        tracing::info!(
            "Loaded ad settings: {} ad units, {} size mappings, lazy loading {}",
            settings.taxonomy.len(),
            settings.size_mappings.len(),
            if settings.lazy_load_enabled { "on" } else { "off" }
        );
        Ok(settings)
    }

    /// Load an option map from a JSON or TOML file (by extension).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let options = read_options_file(path)?;
        Self::from_options(&options)
    }

    /// Non-fatal findings worth showing to an operator.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.seconds_to_wait_after_viewability < DEFAULT_SECONDS_TO_WAIT {
            warnings.push(format!(
                "seconds_to_wait_after_viewability is {}, below the recommended minimum of {}",
                self.seconds_to_wait_after_viewability, DEFAULT_SECONDS_TO_WAIT
            ));
        }
        if self.taxonomy.is_empty() {
            warnings.push("ad_taxonomy is empty, no slots can be defined".to_string());
        }
        for (label, config) in [
            ("default_ad_configuration", &self.default_configuration),
            ("homepage_ad_configuration", &self.homepage_configuration),
        ] {
            for unit in config.ad_slots.keys() {
                if !self.taxonomy.contains(unit) {
                    warnings.push(format!("{} references unknown ad unit '{}'", label, unit));
                }
            }
            for name in &config.size_mapping_definitions {
                if !self.size_mappings.contains(name) {
                    warnings.push(format!("{} references unknown size mapping '{}'", label, name));
                }
            }
        }
        warnings
    }
}

impl Validate for AdSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_numeric_id("network_id", &self.network_id)?;
        validation::validate_positive_number(
            "seconds_to_wait_after_viewability",
            self.seconds_to_wait_after_viewability as usize,
            1,
        )?;
        validation::validate_range("intersection_margin", self.intersection_margin, 0, MAX_INTERSECTION_MARGIN)?;
        validation::validate_non_empty_string("refresh_key", &self.refresh.key)?;
        validation::validate_non_empty_string("refresh_value", &self.refresh.value)?;
        Ok(())
    }
}

pub fn read_options_file<P: AsRef<Path>>(path: P) -> Result<OptionMap> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);
    parse_options(&content, is_toml)
}

pub fn parse_options(content: &str, is_toml: bool) -> Result<OptionMap> {
    let processed = substitute_env_vars(content);
    if is_toml {
        let table: toml::Table = toml::from_str(&processed)?;
        let value = serde_json::to_value(table)?;
        Ok(lenient::object_entries(&value))
    } else {
        Ok(serde_json::from_str(&processed)?)
    }
}

/// Replace `${VAR}` with the environment value, leaving unknown names as is.
pub fn substitute_env_vars(content: &str) -> String {
    use regex::Regex;
    use std::sync::OnceLock;

    static ENV_VAR: OnceLock<Regex> = OnceLock::new();
    let re = ENV_VAR.get_or_init(|| match Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}") {
        Ok(re) => re,
        Err(e) => unreachable!("env var pattern is valid: {}", e),
    });

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .into_owned()
}

fn scalar(options: &OptionMap, key: &str) -> Option<String> {
    options
        .get(key)
        .and_then(lenient::scalar_string)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn number(options: &OptionMap, key: &str) -> Option<u32> {
    let raw = scalar(options, key)?;
    match raw.trim_end_matches('%').trim().parse::<u32>() {
        Ok(0) => None,
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!("Ignoring non-numeric {} value '{}'", key, raw);
            None
        }
    }
}

fn blob(options: &OptionMap, key: &str) -> Result<Option<Value>> {
    let Some(raw) = options.get(key) else {
        return Ok(None);
    };
    lenient::decode_blob(raw).map_err(|e| AdError::InvalidConfigValueError {
        field: key.to_string(),
        value: preview(raw),
        reason: format!("not valid JSON: {}", e),
    })
}

fn layout(value: &Value, field: &str) -> Result<ResolvedAdConfiguration> {
    ResolvedAdConfiguration::from_value(value.clone()).map_err(|e| AdError::InvalidConfigValueError {
        field: field.to_string(),
        value: preview(value),
        reason: format!("not an ad configuration object: {}", e),
    })
}

fn preview(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    text.chars().take(60).collect()
}

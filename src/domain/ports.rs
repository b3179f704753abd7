use crate::utils::error::Result;
use indexmap::IndexMap;
use serde_json::Value;

/// Raw option map as persisted by the CMS settings API.
pub type OptionMap = IndexMap<String, Value>;

/// Key-value settings store holding the plugin option map.
pub trait SettingsStore: Send + Sync {
    fn load_options(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<OptionMap>>> + Send;
}

/// Per-content-item metadata store (page-level ad overrides live here).
pub trait MetadataStore: Send + Sync {
    fn get_meta(
        &self,
        item_id: &str,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
}

use crate::config::settings::AdSettings;
use crate::core::display::{DisplayCallEmitter, DisplayOptions};
use crate::core::head::HeadScriptComposer;
use crate::core::{MetadataStore, PageContext, SettingsStore};
use crate::utils::error::{AdError, Result};

/// Option map key the settings are stored under.
pub const OPTIONS_KEY: &str = "gam_360_ad_options";
/// Metadata key holding a page's stored ad override.
pub const AD_CONFIGURATION_META_KEY: &str = "_gam_ad_configuration";
/// Metadata key holding a page's comma-separated page types.
pub const PAGETYPE_META_KEY: &str = "pagetype";

/// Loads settings and per-page metadata from the stores and renders the
/// head script and display placeholders for a request.
pub struct PageRenderer<S: SettingsStore, M: MetadataStore> {
    pub(crate) settings_store: S,
    pub(crate) metadata: M,
    options_key: String,
}

impl<S: SettingsStore, M: MetadataStore> PageRenderer<S, M> {
    pub fn new(settings_store: S, metadata: M) -> Self {
        Self {
            settings_store,
            metadata,
            options_key: OPTIONS_KEY.to_string(),
        }
    }

    pub fn with_options_key(mut self, key: impl Into<String>) -> Self {
        self.options_key = key.into();
        self
    }

    pub async fn load_settings(&self) -> Result<AdSettings> {
        let options = self
            .settings_store
            .load_options(&self.options_key)
            .await?
            .ok_or_else(|| AdError::MissingConfigError {
                field: self.options_key.clone(),
            })?;
        AdSettings::from_options(&options)
    }

    /// Head script for the page, or `None` when the page shows no ads.
    /// Static pages get their stored override and `pagetype` meta filled in
    /// from the metadata store.
    pub async fn render_head(
        &self,
        settings: &AdSettings,
        context: &PageContext,
        debug_console: bool,
    ) -> Result<Option<String>> {
        let mut context = context.clone();
        let mut stored_override = None;

        if let PageContext::Page {
            item_id: Some(item_id),
            pagetype_meta,
            ..
        } = &mut context
        {
            stored_override = self.metadata.get_meta(item_id, AD_CONFIGURATION_META_KEY).await?;
            if pagetype_meta.is_none() {
                *pagetype_meta = self.metadata.get_meta(item_id, PAGETYPE_META_KEY).await?;
            }
            tracing::debug!(
                "Page {} has {} stored override",
                item_id,
                if stored_override.is_some() { "a" } else { "no" }
            );
        }

        let head = HeadScriptComposer::new(settings).compose(&context, stored_override.as_deref(), debug_console);
        Ok(head.map(|h| h.render()))
    }

    pub fn render_display(
        &self,
        settings: &AdSettings,
        unit_id: &str,
        position: Option<&str>,
        options: &DisplayOptions,
    ) -> Option<String> {
        DisplayCallEmitter::new(&settings.taxonomy).emit(unit_id, position, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use crate::domain::lenient;
    use serde_json::json;

    fn store() -> MemoryStore {
        let options = lenient::object_entries(&json!({
            "network_id": "1234",
            "ad_taxonomy": {"box": {"path": "/box", "sizes": [[300, 250]], "positions": ["1", "2"]}},
            "default_ad_configuration": {"ad_slots": {"box": {"positions": ["1"]}}},
            "page_type_mapping": {"sports": ["sports"]}
        }));
        MemoryStore::new()
            .with_options(OPTIONS_KEY, options)
            .with_meta("9", AD_CONFIGURATION_META_KEY, r#"{"ad_slots": {"box": {"positions": ["2"]}}}"#)
            .with_meta("9", PAGETYPE_META_KEY, "sports")
    }

    #[tokio::test]
    async fn test_page_uses_stored_metadata() {
        let renderer = PageRenderer::new(store(), store());
        let settings = renderer.load_settings().await.unwrap();
        let context = PageContext::Page {
            slug: "about".to_string(),
            item_id: Some("9".to_string()),
            pagetype_meta: None,
        };

        let head = renderer.render_head(&settings, &context, false).await.unwrap().unwrap();
        assert!(head.contains("div-gpt-ad-box-2"));
        assert!(!head.contains("div-gpt-ad-box-1"));
        assert!(head.contains("setTargeting('pagetype', [\"sports\",\"ros\"])"));
    }

    #[tokio::test]
    async fn test_override_is_read_from_plugin_meta_key() {
        let layout = r#"{"ad_slots": {"box": {"positions": ["2"]}}}"#;
        let metadata = MemoryStore::new().with_meta("11", "_gam_ad_configuration", layout);
        let renderer = PageRenderer::new(store(), metadata);
        let settings = renderer.load_settings().await.unwrap();
        let context = PageContext::Page {
            slug: "about".to_string(),
            item_id: Some("11".to_string()),
            pagetype_meta: None,
        };

        let head = renderer.render_head(&settings, &context, false).await.unwrap().unwrap();
        assert!(head.contains("div-gpt-ad-box-2"));
        assert!(!head.contains("div-gpt-ad-box-1"));

        let unprefixed = MemoryStore::new().with_meta("11", "ad_configuration", layout);
        let renderer = PageRenderer::new(store(), unprefixed);
        let head = renderer.render_head(&settings, &context, false).await.unwrap().unwrap();
        assert!(head.contains("div-gpt-ad-box-1"));
    }

    #[tokio::test]
    async fn test_missing_options_is_an_error() {
        let renderer = PageRenderer::new(MemoryStore::new(), MemoryStore::new());
        let err = renderer.load_settings().await.unwrap_err();
        assert!(matches!(err, AdError::MissingConfigError { ref field } if field == OPTIONS_KEY));
    }
}

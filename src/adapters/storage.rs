use crate::config::settings::parse_options;
use crate::domain::ports::{MetadataStore, OptionMap, SettingsStore};
use crate::utils::error::{AdError, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const META_DIR: &str = "meta";

/// Settings and metadata kept as files under one directory:
/// `<base>/<key>.json` (or `.toml`) for option maps and
/// `<base>/meta/<item_id>.json` for per-item metadata objects.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn meta_path(&self, item_id: &str) -> Result<PathBuf> {
        let valid = !item_id.is_empty()
            && item_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AdError::StorageError {
                message: format!("Invalid item id '{}'", item_id),
            });
        }
        Ok(self.base_path.join(META_DIR).join(format!("{}.json", item_id)))
    }
}

async fn read_if_exists(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl SettingsStore for LocalStorage {
    async fn load_options(&self, key: &str) -> Result<Option<OptionMap>> {
        for (extension, is_toml) in [("json", false), ("toml", true)] {
            let path = self.base_path.join(format!("{}.{}", key, extension));
            if let Some(content) = read_if_exists(&path).await? {
                tracing::debug!("Reading options from {}", path.display());
                return parse_options(&content, is_toml).map(Some);
            }
        }
        tracing::debug!("No options file for '{}' under {}", key, self.base_path.display());
        Ok(None)
    }
}

impl MetadataStore for LocalStorage {
    async fn get_meta(&self, item_id: &str, key: &str) -> Result<Option<String>> {
        let path = self.meta_path(item_id)?;
        let Some(content) = read_if_exists(&path).await? else {
            return Ok(None);
        };
        let meta: IndexMap<String, Value> = serde_json::from_str(&content)?;
        Ok(meta.get(key).and_then(meta_string))
    }
}

/// Metadata values are strings; structured values are stored re-encoded.
fn meta_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// In-process store for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    options: IndexMap<String, OptionMap>,
    meta: IndexMap<String, IndexMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, key: impl Into<String>, options: OptionMap) -> Self {
        self.options.insert(key.into(), options);
        self
    }

    pub fn with_meta(mut self, item_id: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta
            .entry(item_id.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }
}

impl SettingsStore for MemoryStore {
    async fn load_options(&self, key: &str) -> Result<Option<OptionMap>> {
        Ok(self.options.get(key).cloned())
    }
}

impl MetadataStore for MemoryStore {
    async fn get_meta(&self, item_id: &str, key: &str) -> Result<Option<String>> {
        Ok(self.meta.get(item_id).and_then(|m| m.get(key)).cloned())
    }
}

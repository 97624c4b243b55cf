//! Key-value storage - 偏好与映射模板持久化
//!
//! The engine never touches storage directly; it goes through an injected
//! [`KeyValueStore`]. Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: process-local, for tests and embedded use
//! - [`JsonFileStore`]: one JSON object file on disk
//!
//! [`TemplateStore`] and [`Preferences`] are typed views over fixed keys.

use parking_lot::RwLock;
use shared::error::{AppError, AppResult};
use shared::models::ImportMapping;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::scope::NO_SELECTION;

/// Saved import mapping template
pub const MAPPING_TEMPLATE_KEY: &str = "import.mapping_template";
/// Last selected locale
pub const UI_LOCALE_KEY: &str = "ui.locale";
/// Last selected channel
pub const UI_CHANNEL_KEY: &str = "ui.channel";

/// Injected get/set capability
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

// ── MemoryStore ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

// ── JsonFileStore ───────────────────────────────────────────────────

#[derive(Debug, Error)]
enum FileStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<FileStoreError> for AppError {
    fn from(err: FileStoreError) -> Self {
        AppError::storage(err.to_string())
    }
}

/// Key-value store backed by a single JSON object file
///
/// The whole file is read once on open and rewritten on every change.
#[derive(Debug)]
pub struct JsonFileStore {
    file_path: PathBuf,
    data: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `path`; a missing file starts empty
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let file_path = path.as_ref().to_path_buf();
        let data = Self::read_file(&file_path).map_err(|e| {
            tracing::error!(path = %file_path.display(), error = %e, "Failed to open preferences file");
            AppError::from(e)
        })?;
        tracing::debug!(path = %file_path.display(), entries = data.len(), "Preferences file opened");
        Ok(Self {
            file_path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn read_file(path: &Path) -> Result<BTreeMap<String, String>, FileStoreError> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_file(&self, data: &BTreeMap<String, String>) -> Result<(), FileStoreError> {
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.file_path, content)?;
        Ok(())
    }

    /// Apply `change` and flush; the in-memory copy is left untouched on failure
    fn update(&self, change: impl FnOnce(&mut BTreeMap<String, String>)) -> AppResult<()> {
        let mut data = self.data.write();
        let mut next = data.clone();
        change(&mut next);
        if next == *data {
            return Ok(());
        }
        self.write_file(&next).map_err(|e| {
            tracing::error!(path = %self.file_path.display(), error = %e, "Failed to write preferences file");
            AppError::from(e)
        })?;
        *data = next;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.update(|data| {
            data.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.update(|data| {
            data.remove(key);
        })
    }
}

// ── Typed views ─────────────────────────────────────────────────────

/// The single global import mapping template
#[derive(Clone)]
pub struct TemplateStore {
    store: Arc<dyn KeyValueStore>,
}

impl TemplateStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Saved template; unreadable or corrupt data counts as "no template"
    pub fn load(&self) -> Option<ImportMapping> {
        let raw = match self.store.get(MAPPING_TEMPLATE_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read mapping template");
                return None;
            }
        };
        match serde_json::from_str::<ImportMapping>(&raw) {
            Ok(mapping) => Some(mapping),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring corrupt mapping template");
                None
            }
        }
    }

    /// Overwrite the saved template
    pub fn save(&self, mapping: &ImportMapping) -> AppResult<()> {
        let raw = serde_json::to_string(mapping)?;
        self.store.set(MAPPING_TEMPLATE_KEY, &raw)?;
        tracing::info!(columns = mapping.len(), "Mapping template saved");
        Ok(())
    }

    pub fn clear(&self) -> AppResult<()> {
        self.store.remove(MAPPING_TEMPLATE_KEY)
    }
}

/// Locale / channel picker preferences
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn locale(&self) -> Option<String> {
        self.read(UI_LOCALE_KEY)
    }

    pub fn set_locale(&self, locale: Option<&str>) -> AppResult<()> {
        self.write(UI_LOCALE_KEY, locale)
    }

    pub fn channel(&self) -> Option<String> {
        self.read(UI_CHANNEL_KEY)
    }

    pub fn set_channel(&self, channel: Option<&str>) -> AppResult<()> {
        self.write(UI_CHANNEL_KEY, channel)
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value.filter(|v| !v.trim().is_empty() && v != NO_SELECTION),
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read preference");
                None
            }
        }
    }

    /// `None`, blank and the no-selection sentinel all clear the key
    fn write(&self, key: &str, value: Option<&str>) -> AppResult<()> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() && v != NO_SELECTION => self.store.set(key, v),
            _ => self.store.remove(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_json_file_store_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/prefs.json");

        let store = JsonFileStore::open(&path).unwrap();
        store.set(UI_LOCALE_KEY, "fr-FR").unwrap();
        store.set(UI_CHANNEL_KEY, "web").unwrap();
        store.remove(UI_CHANNEL_KEY).unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get(UI_LOCALE_KEY).unwrap().as_deref(), Some("fr-FR"));
        assert_eq!(reopened.get(UI_CHANNEL_KEY).unwrap(), None);
    }

    #[test]
    fn test_json_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();

        let err = JsonFileStore::open(&path).unwrap_err();
        assert_eq!(err.code, shared::error::ErrorCode::StorageError);
    }

    #[test]
    fn test_template_store_overwrites_and_tolerates_corruption() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let templates = TemplateStore::new(kv.clone());
        assert_eq!(templates.load(), None);

        let first: ImportMapping = [("Ref", "sku")].into_iter().collect();
        let second: ImportMapping = [("GTIN", "gtin")].into_iter().collect();
        templates.save(&first).unwrap();
        templates.save(&second).unwrap();
        assert_eq!(templates.load(), Some(second));

        kv.set(MAPPING_TEMPLATE_KEY, "{broken").unwrap();
        assert_eq!(templates.load(), None);

        templates.clear().unwrap();
        assert_eq!(kv.get(MAPPING_TEMPLATE_KEY).unwrap(), None);
    }

    #[test]
    fn test_preferences_sentinel_clears() {
        let prefs = Preferences::new(Arc::new(MemoryStore::new()));
        prefs.set_locale(Some(" de-DE ")).unwrap();
        prefs.set_channel(Some("store")).unwrap();
        assert_eq!(prefs.locale().as_deref(), Some("de-DE"));

        prefs.set_locale(Some(NO_SELECTION)).unwrap();
        prefs.set_channel(None).unwrap();
        assert_eq!(prefs.locale(), None);
        assert_eq!(prefs.channel(), None);
    }
}

// src/persistence.rs
//! Durable storage of the last explicitly chosen locale.

use crate::config::DEFAULT_PREFERENCE_KEY;
use crate::utils::error::Error;
use crate::utils::path::get_config_dir;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

pub const PREFERENCE_FILE_NAME: &str = "preferences.json";

/// A keyed string store that outlives the session.
pub trait PreferenceStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, Error>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), Error>;
}

/// `{key: value}` JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `data/config/preferences.json`
    pub fn default_location() -> Self {
        Self::new(get_config_dir().join(PREFERENCE_FILE_NAME))
    }

    fn read_all(&self) -> Result<HashMap<String, String>, Error> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

impl PreferenceStore for JsonFileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&values)?)?;
        debug!("Saved preference '{}' to {}", key, self.path.display());
        Ok(())
    }
}

/// Session-only store. `disabled()` builds one that refuses every operation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    disabled: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disabled() -> Self {
        Self {
            values: Mutex::default(),
            disabled: true,
        }
    }

    pub fn with_item(self, key: &str, value: &str) -> Self {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        self
    }
}

impl PreferenceStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, Error> {
        if self.disabled {
            return Err(Error::Storage("memory store is disabled".to_string()));
        }
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Error> {
        if self.disabled {
            return Err(Error::Storage("memory store is disabled".to_string()));
        }
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The stored locale preference under one fixed key.
///
/// Storage failures are logged and swallowed: reads come back as `None`, writes
/// become no-ops.
#[derive(Clone)]
pub struct LocalePreference {
    store: Arc<dyn PreferenceStore>,
    key: String,
}

impl LocalePreference {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self::with_key(store, DEFAULT_PREFERENCE_KEY)
    }

    pub fn with_key(store: Arc<dyn PreferenceStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self) -> Option<String> {
        match self.store.get_item(&self.key) {
            Ok(value) => value.filter(|v| !v.trim().is_empty()),
            Err(e) => {
                warn!("[i18n] failed to read stored language '{}': {}", self.key, e);
                None
            }
        }
    }

    pub fn set(&self, locale: &str) {
        if let Err(e) = self.store.set_item(&self.key, locale) {
            warn!("[i18n] failed to save language '{}' under '{}': {}", locale, self.key, e);
        }
    }
}

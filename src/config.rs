// src/config.rs
use crate::source::{BundleSource, DirectorySource, HttpSource};
use crate::utils::path::get_config_dir;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const CONFIG_FILE_NAME: &str = "i18n_config.json";

const BASE_LOCALE_CONFIG_KEY: &str = "Base Locale";
pub const DEFAULT_BASE_LOCALE: &str = "en";

const BUNDLE_SOURCE_CONFIG_KEY: &str = "Bundle Source";
pub const BUNDLE_SOURCE_OPTION_DIRECTORY: &str = "directory";
pub const BUNDLE_SOURCE_OPTION_HTTP: &str = "http";

const BUNDLE_ROOT_CONFIG_KEY: &str = "Bundle Root";
const DEFAULT_BUNDLE_ROOT: &str = "locales";

const PREFERENCE_KEY_CONFIG_KEY: &str = "Preference Key";
pub const DEFAULT_PREFERENCE_KEY: &str = "_i18n_language";

/// One named setting. Every loader setting is a string; `options`, when present,
/// lists the only accepted values.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConfigItem {
    pub name: String,
    pub description: String,
    pub value: String,
    pub default_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl ConfigItem {
    fn new(name: &str, description: &str, default_value: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            value: default_value.to_string(),
            default_value: default_value.to_string(),
            options: None,
        }
    }

    fn with_options(mut self, options: &[&str]) -> Self {
        self.options = Some(options.iter().map(|o| o.to_string()).collect());
        self
    }

    fn validate_and_normalize(&mut self) {
        let trimmed = self.value.trim();
        if trimmed.is_empty() {
            warn!(
                "Empty value for config '{}'. Resetting to default '{}'.",
                self.name, self.default_value
            );
            self.value = self.default_value.clone();
            return;
        }
        if trimmed.len() != self.value.len() {
            self.value = trimmed.to_string();
        }
        if let Some(options) = &self.options {
            if !options.is_empty() && !options.contains(&self.value) {
                warn!(
                    "Value '{}' for config '{}' not in options. Resetting to default '{}'.",
                    self.value, self.name, self.default_value
                );
                self.value = self.default_value.clone();
            }
        }
    }
}

/// Loader settings persisted as a flat `{name: value}` JSON map.
#[derive(Debug, Clone)]
pub struct I18nConfig {
    items: HashMap<String, ConfigItem>,
    config_path: PathBuf,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            items: Self::get_default_config_items(),
            config_path: get_config_dir().join(CONFIG_FILE_NAME),
        }
    }
}

impl I18nConfig {
    /// Loads `data/config/i18n_config.json`, filling gaps with defaults and writing the result back.
    pub fn new() -> Self {
        Self::load_or_init(get_config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn load_or_init(config_path: impl Into<PathBuf>) -> Self {
        let mut instance = Self {
            items: Self::get_default_config_items(),
            config_path: config_path.into(),
        };

        instance.load_from_file();
        instance.merge_and_validate_defaults();
        if let Err(e) = instance.save_to_file() {
            error!("{:#}", e);
        }
        instance
    }

    fn get_default_config_items() -> HashMap<String, ConfigItem> {
        [
            ConfigItem::new(
                BASE_LOCALE_CONFIG_KEY,
                "Unconditional fallback locale; its bundles back every missing key.",
                DEFAULT_BASE_LOCALE,
            ),
            ConfigItem::new(
                BUNDLE_SOURCE_CONFIG_KEY,
                "Where bundles are fetched from. 'directory' reads {root}/{locale}/{namespace}.json from disk, 'http' downloads the same path below a base URL.",
                BUNDLE_SOURCE_OPTION_DIRECTORY,
            )
            .with_options(&[BUNDLE_SOURCE_OPTION_DIRECTORY, BUNDLE_SOURCE_OPTION_HTTP]),
            ConfigItem::new(
                BUNDLE_ROOT_CONFIG_KEY,
                "Directory path or base URL the bundle addresses are resolved against.",
                DEFAULT_BUNDLE_ROOT,
            ),
            ConfigItem::new(
                PREFERENCE_KEY_CONFIG_KEY,
                "Storage key holding the last explicitly chosen locale.",
                DEFAULT_PREFERENCE_KEY,
            ),
        ]
        .into_iter()
        .map(|item| (item.name.clone(), item))
        .collect()
    }

    fn merge_and_validate_defaults(&mut self) {
        let default_items_from_code = Self::get_default_config_items();
        let default_keys_from_code: Vec<String> = default_items_from_code.keys().cloned().collect();

        for (name, default_item_definition) in default_items_from_code {
            match self.items.entry(name.clone()) {
                std::collections::hash_map::Entry::Occupied(mut entry) => {
                    let item = entry.get_mut();
                    item.description = default_item_definition.description;
                    item.default_value = default_item_definition.default_value;
                    item.options = default_item_definition.options;
                    item.validate_and_normalize();
                }
                std::collections::hash_map::Entry::Vacant(entry) => {
                    info!("Adding new default config item: {}", name);
                    entry.insert(default_item_definition);
                }
            }
        }

        self.items.retain(|name, _| {
            if default_keys_from_code.contains(name) {
                true
            } else {
                warn!("Removing obsolete config item '{}'.", name);
                false
            }
        });
    }

    fn load_from_file(&mut self) {
        if !self.config_path.exists() {
            info!(
                "Config file {:?} not found. Proceeding with default configuration values.",
                self.config_path
            );
            return;
        }

        match fs::read_to_string(&self.config_path) {
            Ok(content) => match serde_json::from_str::<HashMap<String, String>>(&content) {
                Ok(loaded_values) => {
                    for (name, loaded_value) in loaded_values {
                        if let Some(item) = self.items.get_mut(&name) {
                            item.value = loaded_value;
                        } else {
                            warn!("Loaded unknown config key '{}' from file. It will be ignored and removed upon next save.", name);
                        }
                    }
                    info!("Config values loaded from {:?}", self.config_path);
                }
                Err(e) => {
                    error!(
                        "Failed to parse config file {:?}: {}. Using default values.",
                        self.config_path, e
                    );
                }
            },
            Err(e) => {
                error!(
                    "Failed to read config file {:?}: {}. Using default values.",
                    self.config_path, e
                );
            }
        }
    }

    pub fn save_to_file(&self) -> Result<()> {
        let values_to_save: HashMap<String, String> = self
            .items
            .iter()
            .map(|(name, item)| (name.clone(), item.value.clone()))
            .collect();

        let content = serde_json::to_string_pretty(&values_to_save)
            .context("Failed to serialize config values to JSON")?;
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create parent directory {:?} for config file", parent)
            })?;
        }
        fs::write(&self.config_path, content)
            .with_context(|| format!("Failed to write config file to {:?}", self.config_path))?;
        info!("Config saved to {:?}", self.config_path);
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_item_value(&self, name: &str) -> Option<&str> {
        self.items.get(name).map(|item| item.value.as_str())
    }

    fn get_string(&self, name: &str, fallback: &str) -> String {
        match self.get_item_value(name) {
            Some(value) if !value.trim().is_empty() => value.to_string(),
            Some(_) => fallback.to_string(),
            None => {
                warn!("Config item '{}' not found. Using '{}'.", name, fallback);
                fallback.to_string()
            }
        }
    }

    pub fn base_locale(&self) -> String {
        self.get_string(BASE_LOCALE_CONFIG_KEY, DEFAULT_BASE_LOCALE)
    }

    pub fn bundle_root(&self) -> String {
        self.get_string(BUNDLE_ROOT_CONFIG_KEY, DEFAULT_BUNDLE_ROOT)
    }

    pub fn preference_key(&self) -> String {
        self.get_string(PREFERENCE_KEY_CONFIG_KEY, DEFAULT_PREFERENCE_KEY)
    }

    pub fn get_effective_bundle_source(&self) -> &'static str {
        match self.get_item_value(BUNDLE_SOURCE_CONFIG_KEY) {
            Some(BUNDLE_SOURCE_OPTION_HTTP) => BUNDLE_SOURCE_OPTION_HTTP,
            _ => BUNDLE_SOURCE_OPTION_DIRECTORY,
        }
    }

    /// Builds the bundle source the configuration describes.
    pub fn build_source(&self) -> Arc<dyn BundleSource> {
        let root = self.bundle_root();
        match self.get_effective_bundle_source() {
            BUNDLE_SOURCE_OPTION_HTTP => Arc::new(HttpSource::new(root)),
            _ => Arc::new(DirectorySource::new(root)),
        }
    }
}

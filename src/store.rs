// src/store.rs
//! Merged translation tables and the active locale.

use crate::bundle::MessageTable;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Environment hook mirroring the active locale, e.g. a document root `lang` attribute.
pub trait RootElement: Send + Sync {
    fn set_lang(&self, locale: &str);
}

pub struct MessageStore {
    base_locale: String,
    active_locale: RwLock<String>,
    tables: RwLock<HashMap<String, MessageTable>>,
    root: Option<Arc<dyn RootElement>>,
}

impl MessageStore {
    /// Empty store whose active locale starts at `base_locale`.
    pub fn new(base_locale: impl Into<String>) -> Self {
        let base_locale = base_locale.into();
        Self {
            active_locale: RwLock::new(base_locale.clone()),
            base_locale,
            tables: RwLock::new(HashMap::new()),
            root: None,
        }
    }

    pub fn with_root(mut self, root: Arc<dyn RootElement>) -> Self {
        self.root = Some(root);
        self
    }

    pub fn base_locale(&self) -> &str {
        &self.base_locale
    }

    pub fn active_locale(&self) -> String {
        self.active_locale
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_active_locale(&self, locale: &str) {
        {
            let mut active = self.active_locale.write().unwrap_or_else(PoisonError::into_inner);
            if *active != locale {
                info!("[i18n] active language {} -> {}", active, locale);
            }
            *active = locale.to_string();
        }
        if let Some(root) = &self.root {
            root.set_lang(locale);
        }
    }

    /// Union merge: incoming keys overwrite, untouched keys stay.
    pub fn merge(&self, locale: &str, incoming: MessageTable) {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let table = tables.entry(locale.to_string()).or_default();
        let count = incoming.len();
        table.extend(incoming);
        debug!("[i18n] merged {} messages into '{}' ({} total)", count, locale, table.len());
    }

    pub fn table(&self, locale: &str) -> Option<MessageTable> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(locale)
            .cloned()
    }

    pub fn locales(&self) -> Vec<String> {
        let mut locales: Vec<String> = self
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        locales.sort();
        locales
    }

    /// Translation for the active locale.
    pub fn lookup(&self, key: &str) -> String {
        let active = self.active_locale();
        self.lookup_in(&active, key)
    }

    /// `locale`, then the base locale, then the key itself. Misses are silent.
    pub fn lookup_in(&self, locale: &str, key: &str) -> String {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        [locale, self.base_locale.as_str()]
            .iter()
            .find_map(|l| tables.get(*l).and_then(|t| t.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn table(pairs: &[(&str, &str)]) -> MessageTable {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[derive(Default)]
    struct RecordingRoot(Mutex<Vec<String>>);

    impl RootElement for RecordingRoot {
        fn set_lang(&self, locale: &str) {
            self.0.lock().unwrap().push(locale.to_string());
        }
    }

    #[test]
    fn merge_is_a_union_with_overwrite() {
        let store = MessageStore::new("en");
        store.merge("en", table(&[("a", "1"), ("b", "2")]));
        store.merge("en", table(&[("b", "two"), ("c", "3")]));

        assert_eq!(store.table("en").unwrap(), table(&[("a", "1"), ("b", "two"), ("c", "3")]));
    }

    #[test]
    fn merging_identical_bundle_twice_is_idempotent() {
        let once = MessageStore::new("en");
        once.merge("fr", table(&[("hello", "Bonjour")]));

        let twice = MessageStore::new("en");
        twice.merge("fr", table(&[("hello", "Bonjour")]));
        twice.merge("fr", table(&[("hello", "Bonjour")]));

        assert_eq!(once.table("fr"), twice.table("fr"));
    }

    #[test]
    fn lookup_falls_back_to_base_then_key() {
        let store = MessageStore::new("en");
        store.merge("en", table(&[("hello", "Hello"), ("bye", "Bye")]));
        store.merge("fr", table(&[("hello", "Bonjour")]));
        store.set_active_locale("fr");

        assert_eq!(store.lookup("hello"), "Bonjour");
        assert_eq!(store.lookup("bye"), "Bye");
        assert_eq!(store.lookup("missing.key"), "missing.key");
        assert_eq!(store.lookup_in("de", "hello"), "Hello");
    }

    #[test]
    fn set_active_locale_updates_root_when_present() {
        let root = Arc::new(RecordingRoot::default());
        let store = MessageStore::new("en").with_root(root.clone());
        store.set_active_locale("ja");
        store.set_active_locale("ko");
        assert_eq!(store.active_locale(), "ko");
        assert_eq!(*root.0.lock().unwrap(), vec!["ja".to_string(), "ko".to_string()]);

        let headless = MessageStore::new("en");
        headless.set_active_locale("ja");
        assert_eq!(headless.active_locale(), "ja");
        assert!(headless.locales().is_empty());
    }
}

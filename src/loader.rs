// src/loader.rs
use crate::bundle::BundleKey;
use crate::source::BundleSource;
use crate::store::MessageStore;
use dashmap::DashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Keys whose content has been merged at least once. Failed fetches never land here.
#[derive(Debug, Default)]
pub struct BundleCache {
    loaded: DashSet<BundleKey>,
}

impl BundleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &BundleKey) -> bool {
        self.loaded.contains(key)
    }

    pub fn mark_loaded(&self, key: BundleKey) {
        self.loaded.insert(key);
    }

    pub fn keys(&self) -> Vec<BundleKey> {
        let mut keys: Vec<BundleKey> = self.loaded.iter().map(|k| k.key().clone()).collect();
        keys.sort();
        keys
    }
}

/// Fetches bundles on demand and merges them into the [`MessageStore`].
///
/// Concurrent requests for the same missing key each fetch; the merge is idempotent
/// so the duplicate only costs the extra fetch.
#[derive(Clone)]
pub struct BundleLoader {
    source: Arc<dyn BundleSource>,
    store: Arc<MessageStore>,
    cache: Arc<BundleCache>,
}

impl BundleLoader {
    pub fn new(source: Arc<dyn BundleSource>, store: Arc<MessageStore>) -> Self {
        Self {
            source,
            store,
            cache: Arc::new(BundleCache::new()),
        }
    }

    pub fn store(&self) -> &Arc<MessageStore> {
        &self.store
    }

    pub fn is_loaded(&self, key: &BundleKey) -> bool {
        self.cache.contains(key)
    }

    pub fn loaded_keys(&self) -> Vec<BundleKey> {
        self.cache.keys()
    }

    /// Ensures the `(locale, namespace)` bundle is merged. Always resolves to `locale`;
    /// a failed fetch is logged and left unmarked so the next request retries it.
    pub async fn request_bundle(&self, namespace: &str, locale: &str) -> String {
        let key = BundleKey::new(locale, namespace);
        if self.cache.contains(&key) {
            debug!("[i18n] bundle {} already loaded", key);
            return locale.to_string();
        }

        match self.source.fetch(&key).await {
            Ok(table) => {
                self.store.merge(&key.locale, table);
                debug!("[i18n] bundle {} loaded", key);
                self.cache.mark_loaded(key);
            }
            Err(e) if e.is_bundle_error() => {
                warn!("[i18n] bundle {} not available: {}", key, e);
            }
            Err(e) => {
                warn!("[i18n] bundle {} failed to load: {}", key, e);
            }
        }
        locale.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::MessageTable;
    use crate::source::EmbeddedSource;
    use crate::utils::error::Error;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct CountingSource {
        inner: EmbeddedSource,
        fetches: AtomicUsize,
        offline: AtomicBool,
    }

    impl CountingSource {
        fn new(inner: EmbeddedSource) -> Self {
            Self {
                inner,
                fetches: AtomicUsize::new(0),
                offline: AtomicBool::new(false),
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BundleSource for CountingSource {
        async fn fetch(&self, key: &BundleKey) -> Result<MessageTable, Error> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.offline.load(Ordering::SeqCst) {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "transport down",
                )));
            }
            self.inner.fetch(key).await
        }
    }

    fn setup() -> (Arc<CountingSource>, BundleLoader) {
        let source = Arc::new(CountingSource::new(
            EmbeddedSource::new()
                .with_bundle("en", "default", json!({ "hello": "Hello" }))
                .with_bundle("fr", "main", json!({ "title": "Accueil" })),
        ));
        let store = Arc::new(MessageStore::new("en"));
        let loader = BundleLoader::new(source.clone(), store);
        (source, loader)
    }

    #[tokio::test]
    async fn second_request_is_served_from_cache() {
        let (source, loader) = setup();

        assert_eq!(loader.request_bundle("main", "fr").await, "fr");
        assert_eq!(source.fetches(), 1);
        assert!(loader.is_loaded(&BundleKey::new("fr", "main")));

        assert_eq!(loader.request_bundle("main", "fr").await, "fr");
        assert_eq!(source.fetches(), 1);
        assert_eq!(loader.store().lookup_in("fr", "title"), "Accueil");
    }

    #[tokio::test]
    async fn missing_bundle_resolves_and_is_retried() {
        let (source, loader) = setup();

        assert_eq!(loader.request_bundle("others", "fr").await, "fr");
        assert!(!loader.is_loaded(&BundleKey::new("fr", "others")));
        assert_eq!(loader.request_bundle("others", "fr").await, "fr");
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn transport_failure_does_not_mark_loaded() {
        let (source, loader) = setup();
        source.offline.store(true, Ordering::SeqCst);

        assert_eq!(loader.request_bundle("default", "en").await, "en");
        assert!(loader.loaded_keys().is_empty());

        source.offline.store(false, Ordering::SeqCst);
        loader.request_bundle("default", "en").await;
        assert_eq!(loader.loaded_keys(), vec![BundleKey::new("en", "default")]);
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn concurrent_requests_are_not_coalesced() {
        let (source, loader) = setup();

        let (a, b) = tokio::join!(
            loader.request_bundle("default", "en"),
            loader.request_bundle("default", "en")
        );
        assert_eq!((a.as_str(), b.as_str()), ("en", "en"));
        assert_eq!(source.fetches(), 2);
        assert_eq!(loader.store().table("en").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_namespace_loads_default_bundle() {
        let (_, loader) = setup();
        loader.request_bundle("", "en").await;
        assert!(loader.is_loaded(&BundleKey::new("en", "default")));
    }
}

// src/service.rs
use crate::bundle::DEFAULT_NAMESPACE;
use crate::config::I18nConfig;
use crate::interceptor::RequestInterceptor;
use crate::loader::BundleLoader;
use crate::persistence::{JsonFileStore, LocalePreference, PreferenceStore};
use crate::resolver::LocaleResolver;
use crate::router::{NavigationGuard, Navigator, Route};
use crate::source::BundleSource;
use crate::store::{MessageStore, RootElement};
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::info;

/// The application-facing localization service.
///
/// Construct one per application and hand clones of it (or of its guard and
/// interceptor) to whatever needs them.
#[derive(Clone)]
pub struct I18n {
    store: Arc<MessageStore>,
    loader: BundleLoader,
    preference: LocalePreference,
    resolver: LocaleResolver,
}

pub struct I18nBuilder {
    base_locale: String,
    source: Arc<dyn BundleSource>,
    preferences: Arc<dyn PreferenceStore>,
    preference_key: String,
    root: Option<Arc<dyn RootElement>>,
    environment: Option<Arc<dyn Fn() -> Option<String> + Send + Sync>>,
}

impl I18nBuilder {
    pub fn new(base_locale: impl Into<String>, source: Arc<dyn BundleSource>) -> Self {
        Self {
            base_locale: base_locale.into(),
            source,
            preferences: Arc::new(JsonFileStore::default_location()),
            preference_key: crate::config::DEFAULT_PREFERENCE_KEY.to_string(),
            root: None,
            environment: None,
        }
    }

    /// Base locale, source and preference key from the configuration file.
    pub fn from_config(config: &I18nConfig) -> Self {
        Self::new(config.base_locale(), config.build_source()).preference_key(config.preference_key())
    }

    pub fn preferences(mut self, store: Arc<dyn PreferenceStore>) -> Self {
        self.preferences = store;
        self
    }

    pub fn preference_key(mut self, key: impl Into<String>) -> Self {
        self.preference_key = key.into();
        self
    }

    pub fn root_element(mut self, root: Arc<dyn RootElement>) -> Self {
        self.root = Some(root);
        self
    }

    pub fn environment<F>(mut self, probe: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.environment = Some(Arc::new(probe));
        self
    }

    pub fn build(self) -> I18n {
        let mut store = MessageStore::new(self.base_locale.clone());
        if let Some(root) = self.root {
            store = store.with_root(root);
        }
        let store = Arc::new(store);
        let loader = BundleLoader::new(self.source, store.clone());
        let preference = LocalePreference::with_key(self.preferences, self.preference_key);
        let mut resolver = LocaleResolver::new(preference.clone(), self.base_locale);
        if let Some(probe) = self.environment {
            resolver = resolver.with_environment(move || probe());
        }
        I18n {
            store,
            loader,
            preference,
            resolver,
        }
    }
}

impl I18n {
    pub fn builder(base_locale: impl Into<String>, source: Arc<dyn BundleSource>) -> I18nBuilder {
        I18nBuilder::new(base_locale, source)
    }

    /// Resolves the startup locale, activates it and loads the default bundles for
    /// the base and the resolved locale.
    pub async fn init(&self) -> String {
        let locale = self.resolver.resolve();
        self.store.set_active_locale(&locale);
        // Sequential so the second request is a cache hit when both locales coincide.
        self.loader.request_bundle(DEFAULT_NAMESPACE, self.base_locale()).await;
        self.loader.request_bundle(DEFAULT_NAMESPACE, &locale).await;
        info!("[i18n] initialized with '{}' (base '{}')", locale, self.base_locale());
        locale
    }

    pub fn base_locale(&self) -> &str {
        self.store.base_locale()
    }

    pub fn active_locale(&self) -> String {
        self.store.active_locale()
    }

    pub fn store(&self) -> &Arc<MessageStore> {
        &self.store
    }

    pub fn loader(&self) -> &BundleLoader {
        &self.loader
    }

    pub fn translate(&self, key: &str) -> String {
        self.store.lookup(key)
    }

    /// Switches to `locale`, persists the choice and loads the default and `namespace`
    /// bundles for it.
    pub async fn set_locale(&self, namespace: Option<&str>, locale: &str) -> String {
        self.store.set_active_locale(locale);
        let mut namespaces = vec![DEFAULT_NAMESPACE];
        if let Some(namespace) = namespace.filter(|n| !n.is_empty() && *n != DEFAULT_NAMESPACE) {
            namespaces.push(namespace);
        }
        join_all(
            namespaces
                .into_iter()
                .map(|namespace| self.loader.request_bundle(namespace, locale)),
        )
        .await;
        self.preference.set(locale);
        locale.to_string()
    }

    pub async fn reset_locale(&self, namespace: Option<&str>) -> String {
        let base = self.base_locale().to_string();
        self.set_locale(namespace, &base).await
    }

    /// Locale switch scoped to the navigator's current route namespace.
    pub async fn change_locale(&self, navigator: &Navigator, locale: &str) -> String {
        let namespace = navigator.current_namespace();
        self.set_locale(namespace.as_deref(), locale).await
    }

    /// Back to the base locale for the navigator's current route namespace.
    pub async fn reset_locale_for(&self, navigator: &Navigator) -> String {
        let namespace = navigator.current_namespace();
        self.reset_locale(namespace.as_deref()).await
    }

    pub fn guard(&self) -> NavigationGuard {
        NavigationGuard::new(self.loader.clone())
    }

    pub fn navigator(&self, initial: Route) -> Navigator {
        Navigator::new(self.guard(), initial)
    }

    pub fn interceptor(&self) -> RequestInterceptor {
        RequestInterceptor::new(self.store.clone())
    }
}

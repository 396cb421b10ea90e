// src/resolver.rs
use crate::persistence::LocalePreference;
use crate::utils::locale::{get_system_locale, normalize_locale};
use std::sync::Arc;
use tracing::debug;

type EnvironmentProbe = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Picks the startup locale: stored preference, then the environment, then the base locale.
#[derive(Clone)]
pub struct LocaleResolver {
    preference: LocalePreference,
    base_locale: String,
    environment: EnvironmentProbe,
}

impl LocaleResolver {
    pub fn new(preference: LocalePreference, base_locale: impl Into<String>) -> Self {
        Self {
            preference,
            base_locale: base_locale.into(),
            environment: Arc::new(get_system_locale),
        }
    }

    /// Replaces the operating-system probe.
    pub fn with_environment<F>(mut self, probe: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.environment = Arc::new(probe);
        self
    }

    pub fn resolve(&self) -> String {
        if let Some(stored) = self.preference.get() {
            debug!("[i18n] using stored language '{}'", stored);
            return stored;
        }
        if let Some(env) = (self.environment)().and_then(|l| normalize_locale(&l)) {
            debug!("[i18n] using environment language '{}'", env);
            return env;
        }
        debug!("[i18n] using base language '{}'", self.base_locale);
        self.base_locale.clone()
    }
}

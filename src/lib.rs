//! Lazily loaded, route-aware translation bundles.
//!
//! Bundles are addressed by `(locale, namespace)` and fetched the first time a
//! navigation or a locale switch needs them. Startup picks the locale from the stored
//! preference, the operating system, then the configured base locale.
//!
//! ```no_run
//! use lang_loader::{I18n, I18nConfig, I18nBuilder, Route};
//!
//! # async fn run() {
//! let config = I18nConfig::new();
//! let i18n: I18n = I18nBuilder::from_config(&config).build();
//! i18n.init().await;
//!
//! let navigator = i18n.navigator(Route::new("/"));
//! navigator.push(Route::new("/orders").with_namespace("main")).await;
//! println!("{}", i18n.translate("orders.title"));
//! # }
//! ```

pub mod bundle;
pub mod config;
pub mod interceptor;
pub mod loader;
pub mod persistence;
pub mod resolver;
pub mod router;
pub mod service;
pub mod source;
pub mod store;
pub mod utils;

pub use crate::bundle::{BundleKey, MessageTable, DEFAULT_NAMESPACE};
pub use crate::config::I18nConfig;
pub use crate::interceptor::RequestInterceptor;
pub use crate::loader::{BundleCache, BundleLoader};
pub use crate::persistence::{JsonFileStore, LocalePreference, MemoryStore, PreferenceStore};
pub use crate::resolver::LocaleResolver;
pub use crate::router::{
    GuardDecision, GuardState, NavigationGuard, NavigationOutcome, NavigationRequest, Navigator, Route, RouteMeta,
};
pub use crate::service::{I18n, I18nBuilder};
pub use crate::source::{BundleSource, DirectorySource, EmbeddedSource, HttpSource};
pub use crate::store::{MessageStore, RootElement};
pub use crate::utils::error::Error;
pub use crate::utils::logger::LoggerBuilder;

// src/router.rs
//! Route-aware bundle loading.
//!
//! [`NavigationGuard`] runs before a navigation commits: it keeps the `lang` query
//! parameter sticky across navigations and blocks until every bundle the target route
//! needs has settled. [`Navigator`] is a small in-process router driving it.

use crate::bundle::{BundleKey, DEFAULT_NAMESPACE};
use crate::loader::BundleLoader;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

pub const LANG_QUERY_KEY: &str = "lang";

/// Redirect hops a single navigation may take before it is committed as-is.
const MAX_REDIRECTS: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub path: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub meta: RouteMeta,
}

impl Route {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.meta.namespace = Some(namespace.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = hash.into();
        self
    }

    /// Explicit `lang` query parameter, if non-empty.
    pub fn lang(&self) -> Option<&str> {
        self.query
            .get(LANG_QUERY_KEY)
            .map(String::as_str)
            .filter(|l| !l.is_empty())
    }

    pub fn namespace(&self) -> Option<&str> {
        self.meta.namespace.as_deref().filter(|n| !n.is_empty())
    }
}

/// Tags every route of one business area with its namespace.
pub fn tag_routes(namespace: &str, routes: Vec<Route>) -> Vec<Route> {
    routes.into_iter().map(|r| r.with_namespace(namespace)).collect()
}

/// A navigation call. `replace` records whether the caller asked for history
/// replacement and is carried over to any redirect the guard synthesizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub to: Route,
    pub replace: bool,
}

impl NavigationRequest {
    pub fn push(to: Route) -> Self {
        Self { to, replace: false }
    }

    pub fn replace(to: Route) -> Self {
        Self { to, replace: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Idle,
    Evaluating,
    RedirectingLangParam,
    LoadingBundles,
    Proceeding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Re-run the navigation with this synthesized request.
    Redirect(NavigationRequest),
    /// Every queued bundle has settled; the navigation may commit.
    Proceed { requested: Vec<BundleKey> },
}

/// One pass of the guard over a single navigation attempt.
#[derive(Debug)]
pub struct NavigationAttempt {
    state: GuardState,
    history: Vec<GuardState>,
}

impl Default for NavigationAttempt {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationAttempt {
    pub fn new() -> Self {
        Self {
            state: GuardState::Idle,
            history: vec![GuardState::Idle],
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Every state visited, in order.
    pub fn states(&self) -> &[GuardState] {
        &self.history
    }

    fn transition(&mut self, next: GuardState) {
        debug!("[i18n] guard {:?} -> {:?}", self.state, next);
        self.state = next;
        self.history.push(next);
    }
}

#[derive(Clone)]
pub struct NavigationGuard {
    loader: BundleLoader,
    base_locale: String,
}

impl NavigationGuard {
    pub fn new(loader: BundleLoader) -> Self {
        let base_locale = loader.store().base_locale().to_string();
        Self { loader, base_locale }
    }

    pub fn base_locale(&self) -> &str {
        &self.base_locale
    }

    /// The redirect needed to keep `from`'s `lang` parameter, if any.
    pub fn lang_redirect(&self, from: &Route, request: &NavigationRequest) -> Option<NavigationRequest> {
        let lang = from.lang()?;
        if request.to.lang().is_some() {
            return None;
        }
        let mut to = request.to.clone();
        to.query.insert(LANG_QUERY_KEY.to_string(), lang.to_string());
        Some(NavigationRequest {
            to,
            replace: request.replace,
        })
    }

    /// Bundles a navigation from `from` to `to` needs, in request order.
    ///
    /// The target locale is `to`'s `lang`, then `from`'s, then the active locale.
    pub fn plan(&self, from: &Route, to: &Route) -> Vec<BundleKey> {
        let mut keys = Vec::new();
        let target_locale = to
            .lang()
            .or_else(|| from.lang())
            .map(str::to_string)
            .unwrap_or_else(|| self.loader.store().active_locale());

        if target_locale != self.base_locale {
            keys.push(BundleKey::new(target_locale.as_str(), DEFAULT_NAMESPACE));
            if let Some(namespace) = to.namespace() {
                keys.push(BundleKey::new(target_locale.as_str(), namespace));
            }
        }
        if let Some(namespace) = to.namespace() {
            keys.push(BundleKey::new(self.base_locale.as_str(), namespace));
        }
        keys
    }

    pub async fn before_each(&self, from: &Route, request: &NavigationRequest) -> GuardDecision {
        let mut attempt = NavigationAttempt::new();
        self.evaluate(&mut attempt, from, request).await
    }

    /// Runs the guard and records its state transitions in `attempt`.
    pub async fn evaluate(
        &self,
        attempt: &mut NavigationAttempt,
        from: &Route,
        request: &NavigationRequest,
    ) -> GuardDecision {
        attempt.transition(GuardState::Evaluating);

        if let Some(redirect) = self.lang_redirect(from, request) {
            debug!(
                "[i18n] carrying lang '{}' over to {} (replace: {})",
                from.lang().unwrap_or_default(),
                redirect.to.path,
                redirect.replace
            );
            attempt.transition(GuardState::RedirectingLangParam);
            return GuardDecision::Redirect(redirect);
        }

        let requested = self.plan(from, &request.to);
        if !requested.is_empty() {
            attempt.transition(GuardState::LoadingBundles);
            join_all(
                requested
                    .iter()
                    .map(|key| self.loader.request_bundle(&key.namespace, &key.locale)),
            )
            .await;
        }

        attempt.transition(GuardState::Proceeding);
        GuardDecision::Proceed { requested }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationOutcome {
    pub route: Route,
    pub replace: bool,
    pub redirects: usize,
    pub requested: Vec<BundleKey>,
}

/// In-process router: current route plus a history stack, every change guarded.
pub struct Navigator {
    guard: NavigationGuard,
    history: Mutex<Vec<Route>>,
}

impl Navigator {
    pub fn new(guard: NavigationGuard, initial: Route) -> Self {
        Self {
            guard,
            history: Mutex::new(vec![initial]),
        }
    }

    pub fn current_route(&self) -> Route {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
            .unwrap_or_default()
    }

    pub fn current_namespace(&self) -> Option<String> {
        self.current_route().namespace().map(str::to_string)
    }

    pub fn history(&self) -> Vec<Route> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub async fn push(&self, to: Route) -> NavigationOutcome {
        self.navigate(NavigationRequest::push(to)).await
    }

    pub async fn replace(&self, to: Route) -> NavigationOutcome {
        self.navigate(NavigationRequest::replace(to)).await
    }

    pub async fn navigate(&self, mut request: NavigationRequest) -> NavigationOutcome {
        let from = self.current_route();
        let mut redirects = 0;

        let requested = loop {
            let decision = self.guard.before_each(&from, &request).await;
            match decision {
                GuardDecision::Redirect(next) if redirects < MAX_REDIRECTS => {
                    redirects += 1;
                    request = next;
                }
                GuardDecision::Redirect(next) => {
                    warn!(
                        "[i18n] too many redirects towards {}; committing without loading",
                        next.to.path
                    );
                    request = next;
                    break Vec::new();
                }
                GuardDecision::Proceed { requested } => break requested,
            }
        };

        self.commit(&request);
        self.after_each(&from, &request);

        NavigationOutcome {
            route: request.to,
            replace: request.replace,
            redirects,
            requested,
        }
    }

    fn commit(&self, request: &NavigationRequest) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        if request.replace {
            history.pop();
        }
        history.push(request.to.clone());
    }

    fn after_each(&self, from: &Route, request: &NavigationRequest) {
        info!(
            "[i18n] navigated {} -> {} ({})",
            from.path,
            request.to.path,
            if request.replace { "replace" } else { "push" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::MessageTable;
    use crate::source::BundleSource;
    use crate::store::MessageStore;
    use crate::utils::error::Error;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Records requests and settles each after a short delay; `("main", "ja")` fails.
    #[derive(Default)]
    struct SlowSource {
        requested: Mutex<Vec<BundleKey>>,
        settled: AtomicUsize,
    }

    #[async_trait]
    impl BundleSource for SlowSource {
        async fn fetch(&self, key: &BundleKey) -> Result<MessageTable, Error> {
            self.requested.lock().unwrap().push(key.clone());
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.settled.fetch_add(1, Ordering::SeqCst);
            if key.locale == "ja" && key.namespace == "main" {
                return Err(Error::BundleNotFound(key.to_string()));
            }
            Ok(MessageTable::from([(format!("{}.probe", key.namespace), key.to_string())]))
        }
    }

    fn guard() -> (Arc<SlowSource>, NavigationGuard) {
        let source = Arc::new(SlowSource::default());
        let store = Arc::new(MessageStore::new("en"));
        let loader = BundleLoader::new(source.clone(), store);
        (source, NavigationGuard::new(loader))
    }

    #[tokio::test]
    async fn lang_param_is_carried_over_preserving_push() {
        let (source, guard) = guard();
        let from = Route::new("/home").with_query("lang", "fr");
        let to = Route::new("/user/7")
            .named("user")
            .with_param("id", "7")
            .with_hash("#bio")
            .with_query("tab", "posts");

        let decision = guard.before_each(&from, &NavigationRequest::push(to.clone())).await;
        let expected = NavigationRequest {
            to: to.with_query("lang", "fr"),
            replace: false,
        };
        assert_eq!(decision, GuardDecision::Redirect(expected));
        assert!(source.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn lang_redirect_preserves_replace() {
        let (_, guard) = guard();
        let from = Route::new("/a").with_query("lang", "fr");
        let mut attempt = NavigationAttempt::new();

        let decision = guard
            .evaluate(&mut attempt, &from, &NavigationRequest::replace(Route::new("/b")))
            .await;
        match decision {
            GuardDecision::Redirect(next) => {
                assert!(next.replace);
                assert_eq!(next.to.lang(), Some("fr"));
            }
            other => panic!("expected redirect, got {:?}", other),
        }
        assert_eq!(
            attempt.states(),
            &[GuardState::Idle, GuardState::Evaluating, GuardState::RedirectingLangParam]
        );
    }

    #[tokio::test]
    async fn namespaced_route_waits_for_all_three_bundles() {
        let (source, guard) = guard();
        let from = Route::new("/");
        let to = Route::new("/main").with_namespace("main").with_query("lang", "ja");
        let mut attempt = NavigationAttempt::new();

        let decision = guard
            .evaluate(&mut attempt, &from, &NavigationRequest::push(to))
            .await;

        let expected = vec![
            BundleKey::new("ja", "default"),
            BundleKey::new("ja", "main"),
            BundleKey::new("en", "main"),
        ];
        assert_eq!(decision, GuardDecision::Proceed { requested: expected.clone() });
        // Proceeding is only reached once every fetch settled, including the failed one.
        assert_eq!(source.settled.load(Ordering::SeqCst), 3);
        let mut seen = source.requested.lock().unwrap().clone();
        seen.sort();
        let mut expected_sorted = expected;
        expected_sorted.sort();
        assert_eq!(seen, expected_sorted);
        assert_eq!(
            attempt.states(),
            &[
                GuardState::Idle,
                GuardState::Evaluating,
                GuardState::LoadingBundles,
                GuardState::Proceeding
            ]
        );
        assert_eq!(attempt.state(), GuardState::Proceeding);
    }

    #[tokio::test]
    async fn base_locale_without_namespace_loads_nothing() {
        let (source, guard) = guard();
        let from = Route::new("/").with_query("lang", "en");
        let to = Route::new("/about").with_query("lang", "en");
        let mut attempt = NavigationAttempt::new();

        let decision = guard
            .evaluate(&mut attempt, &from, &NavigationRequest::push(to))
            .await;
        assert_eq!(decision, GuardDecision::Proceed { requested: vec![] });
        assert!(source.requested.lock().unwrap().is_empty());
        assert_eq!(
            attempt.states(),
            &[GuardState::Idle, GuardState::Evaluating, GuardState::Proceeding]
        );
    }

    #[test]
    fn plan_covers_route_shapes() {
        let (_, guard) = guard();
        let root = Route::new("/");

        // No namespace: only the default bundle for a foreign locale.
        let to = Route::new("/x").with_query("lang", "de");
        assert_eq!(guard.plan(&root, &to), vec![BundleKey::new("de", "default")]);

        // Locale inherited from `from`.
        let from = Route::new("/y").with_query("lang", "de");
        let to = Route::new("/z").with_namespace("others");
        assert_eq!(
            guard.plan(&from, &to),
            vec![
                BundleKey::new("de", "default"),
                BundleKey::new("de", "others"),
                BundleKey::new("en", "others"),
            ]
        );

        // No lang anywhere and the base locale active: just the base namespace bundle.
        assert_eq!(guard.plan(&root, &to), vec![BundleKey::new("en", "others")]);

        // Base locale with a namespace.
        let to = Route::new("/z").with_namespace("others").with_query("lang", "en");
        assert_eq!(guard.plan(&root, &to), vec![BundleKey::new("en", "others")]);
    }

    #[tokio::test]
    async fn routes_without_lang_load_for_active_locale() {
        let source = Arc::new(SlowSource::default());
        let store = Arc::new(MessageStore::new("en"));
        store.set_active_locale("ja");
        let guard = NavigationGuard::new(BundleLoader::new(source.clone(), store));

        let to = Route::new("/orders").with_namespace("main");
        let expected = vec![
            BundleKey::new("ja", "default"),
            BundleKey::new("ja", "main"),
            BundleKey::new("en", "main"),
        ];
        assert_eq!(guard.plan(&Route::new("/"), &to), expected);

        let navigator = Navigator::new(guard, Route::new("/"));
        let outcome = navigator.push(to).await;
        assert_eq!(outcome.redirects, 0);
        assert_eq!(outcome.requested, expected);
        assert_eq!(source.settled.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn navigator_follows_redirect_and_keeps_mode() {
        let (source, guard) = guard();
        let navigator = Navigator::new(guard, Route::new("/").with_query("lang", "ja"));

        let outcome = navigator.push(Route::new("/main").with_namespace("main")).await;
        assert_eq!(outcome.redirects, 1);
        assert!(!outcome.replace);
        assert_eq!(outcome.route.lang(), Some("ja"));
        assert_eq!(outcome.requested.len(), 3);
        assert_eq!(source.settled.load(Ordering::SeqCst), 3);
        assert_eq!(navigator.history().len(), 2);
        assert_eq!(navigator.current_namespace().as_deref(), Some("main"));

        let outcome = navigator.replace(Route::new("/others").with_namespace("others")).await;
        assert!(outcome.replace);
        assert_eq!(outcome.redirects, 1);
        let history = navigator.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].path, "/others");
        assert_eq!(history[1].lang(), Some("ja"));
    }

    #[test]
    fn tag_routes_marks_every_route() {
        let routes = tag_routes("main", vec![Route::new("/a"), Route::new("/b")]);
        assert!(routes.iter().all(|r| r.namespace() == Some("main")));
    }
}

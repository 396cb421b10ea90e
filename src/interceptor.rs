// src/interceptor.rs
use crate::router::LANG_QUERY_KEY;
use crate::store::MessageStore;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Stamps the active locale onto outbound request parameters as `lang`.
#[derive(Clone)]
pub struct RequestInterceptor {
    store: Arc<MessageStore>,
}

impl RequestInterceptor {
    pub fn new(store: Arc<MessageStore>) -> Self {
        Self { store }
    }

    /// Sets `lang`, overwriting any previous value; every other parameter passes through.
    pub fn apply(&self, mut params: Map<String, Value>) -> Map<String, Value> {
        params.insert(
            LANG_QUERY_KEY.to_string(),
            Value::String(self.store.active_locale()),
        );
        params
    }

    /// Rewrites the request URL query so it carries exactly one `lang` pair.
    pub fn intercept(&self, request: &mut reqwest::Request) {
        let locale = self.store.active_locale();
        let url = request.url_mut();
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != LANG_QUERY_KEY)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        pairs.extend_pairs(kept);
        pairs.append_pair(LANG_QUERY_KEY, &locale);
    }

    /// Builds and intercepts a request in one step.
    pub fn build(&self, builder: reqwest::RequestBuilder) -> reqwest::Result<reqwest::Request> {
        let mut request = builder.build()?;
        self.intercept(&mut request);
        Ok(request)
    }
}

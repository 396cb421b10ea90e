// src/source.rs
//! Where bundles come from.
//!
//! A source resolves a [`BundleKey`] to its `{locale}/{namespace}.json` resource and
//! decodes it. Nothing is read until a key is requested, so bundles stay lazy whichever
//! backend is used.

use crate::bundle::{parse_bundle, table_from_value, BundleKey, MessageTable};
use crate::utils::error::Error;
use crate::utils::path::{get_bundle_path, get_bundle_url};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

#[async_trait]
pub trait BundleSource: Send + Sync {
    /// Fetches and decodes one bundle. A missing resource is `Error::BundleNotFound`.
    async fn fetch(&self, key: &BundleKey) -> Result<MessageTable, Error>;
}

/// Bundles compiled into the binary or assembled in memory.
#[derive(Debug, Default, Clone)]
pub struct EmbeddedSource {
    documents: HashMap<BundleKey, Value>,
}

impl EmbeddedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundle(mut self, locale: &str, namespace: &str, document: Value) -> Self {
        self.insert(locale, namespace, document);
        self
    }

    pub fn insert(&mut self, locale: &str, namespace: &str, document: Value) {
        self.documents.insert(BundleKey::new(locale, namespace), document);
    }
}

#[async_trait]
impl BundleSource for EmbeddedSource {
    async fn fetch(&self, key: &BundleKey) -> Result<MessageTable, Error> {
        match self.documents.get(key) {
            Some(document) => table_from_value(key, document.clone()),
            None => Err(Error::BundleNotFound(key.to_string())),
        }
    }
}

/// Reads `{root}/{locale}/{namespace}.json` from disk on demand.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BundleSource for DirectorySource {
    async fn fetch(&self, key: &BundleKey) -> Result<MessageTable, Error> {
        let path = get_bundle_path(&self.root, &key.locale, &key.namespace);
        debug!("Reading bundle {} from {}", key, path.display());
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::BundleNotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        parse_bundle(key, &bytes)
    }
}

/// Downloads `{base_url}/{locale}/{namespace}.json`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn bundle_url(&self, key: &BundleKey) -> String {
        get_bundle_url(&self.base_url, &key.locale, &key.namespace)
    }
}

#[async_trait]
impl BundleSource for HttpSource {
    async fn fetch(&self, key: &BundleKey) -> Result<MessageTable, Error> {
        let url = self.bundle_url(key);
        debug!("Downloading bundle {} from {}", key, url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Error::BundleNotFound(format!("{} ({})", url, response.status())));
        }
        let bytes = response.bytes().await?;
        parse_bundle(key, &bytes)
    }
}

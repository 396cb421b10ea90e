use once_cell::sync::Lazy;
use std::env;
use std::path::{Path, PathBuf};

const BASE_DIR: &str = "data";
pub const BUNDLE_EXTENSION: &str = "json";

static CWD: Lazy<PathBuf> = Lazy::new(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

pub fn get_log_dir() -> PathBuf {
    PathBuf::from(BASE_DIR).join("logs")
}

fn get_base_dir() -> PathBuf {
    CWD.join(BASE_DIR)
}

pub fn get_config_dir() -> PathBuf {
    get_base_dir().join("config")
}

/// Relative address of a bundle: `{locale}/{namespace}.json`.
pub fn bundle_relative_path(locale: &str, namespace: &str) -> PathBuf {
    Path::new(locale).join(format!("{}.{}", namespace, BUNDLE_EXTENSION))
}

pub fn get_bundle_path(root: &Path, locale: &str, namespace: &str) -> PathBuf {
    root.join(bundle_relative_path(locale, namespace))
}

pub fn get_bundle_url(base_url: &str, locale: &str, namespace: &str) -> String {
    format!(
        "{}/{}/{}.{}",
        base_url.trim_end_matches('/'),
        locale,
        namespace,
        BUNDLE_EXTENSION
    )
}

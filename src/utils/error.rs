// src/utils/error.rs
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("bundle not found: {0}")]
    BundleNotFound(String),
    #[error("bundle {key} is not a message object: {reason}")]
    BundleDecode { key: String, reason: String },
    #[error("preference storage unavailable: {0}")]
    Storage(String),
}

#[derive(serde::Serialize)]
#[serde(tag = "kind", content = "message")]
#[serde(rename_all = "camelCase")]
enum ErrorKind {
    Io(String),
    Json(String),
    Http(String),
    BundleNotFound(String),
    BundleDecode(String),
    Storage(String),
}

impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        let error_message = self.to_string();
        let error_kind = match self {
            Self::Io(_) => ErrorKind::Io(error_message),
            Self::Json(_) => ErrorKind::Json(error_message),
            Self::Http(_) => ErrorKind::Http(error_message),
            Self::BundleNotFound(_) => ErrorKind::BundleNotFound(error_message),
            Self::BundleDecode { .. } => ErrorKind::BundleDecode(error_message),
            Self::Storage(_) => ErrorKind::Storage(error_message),
        };
        serde::Serialize::serialize(&error_kind, serializer)
    }
}

impl Error {
    /// Fetch-side failures: the bundle is treated as absent and retried later.
    pub fn is_bundle_error(&self) -> bool {
        matches!(
            self,
            Self::BundleNotFound(_) | Self::BundleDecode { .. } | Self::Http(_) | Self::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_kind_and_message() {
        let e = Error::BundleNotFound("ja.main".to_string());
        let value = serde_json::to_value(&e).unwrap();
        assert_eq!(value["kind"], "bundleNotFound");
        assert_eq!(value["message"], "bundle not found: ja.main");
    }

    #[test]
    fn only_fetch_failures_count_as_bundle_errors() {
        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "down"));
        assert!(io.is_bundle_error());
        let storage = Error::Storage("quota exceeded".to_string());
        assert!(!storage.is_bundle_error());
        assert_eq!(serde_json::to_value(&storage).unwrap()["kind"], "storage");
    }
}

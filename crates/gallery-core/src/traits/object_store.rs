//! Object store trait for bucket-oriented blob backends.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Metadata about a stored object.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ObjectMeta {
    /// Full key within the bucket.
    pub key: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Content type recorded at upload time, if the backend keeps it.
    pub content_type: Option<String>,
    /// Last modified timestamp.
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

/// Options for a presigned GET URL.
///
/// The `response_*` fields become the `response-content-disposition` and
/// `response-content-type` overrides the backend applies when the URL is
/// fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignOptions {
    /// How long the URL stays valid.
    pub expires_in: Duration,
    /// Value for the `Content-Disposition` response header.
    pub response_content_disposition: Option<String>,
    /// Value for the `Content-Type` response header.
    pub response_content_type: Option<String>,
}

impl PresignOptions {
    pub fn new(expires_in: Duration) -> Self {
        Self {
            expires_in,
            response_content_disposition: None,
            response_content_type: None,
        }
    }
}

/// Trait for blob storage backends.
///
/// Implementations exist for the local filesystem, an in-memory map and
/// S3-compatible services. The trait is defined here in `gallery-core` and
/// implemented in `gallery-storage`.
///
/// Removal is idempotent: removing a key that does not exist succeeds.
/// `get` on a missing key fails with `ErrorKind::NotFound`.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "s3").
    fn provider_type(&self) -> &str;

    /// Check whether the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Create the bucket if it does not already exist.
    async fn ensure_bucket(&self, bucket: &str) -> AppResult<()>;

    /// Store `data` under `key`, replacing any existing object.
    async fn put(&self, bucket: &str, key: &str, data: Bytes, content_type: &str)
    -> AppResult<()>;

    /// Read an object fully into memory.
    async fn get(&self, bucket: &str, key: &str) -> AppResult<Bytes>;

    /// Remove a single object.
    async fn remove(&self, bucket: &str, key: &str) -> AppResult<()>;

    /// Remove many objects in as few round trips as the backend allows.
    async fn remove_many(&self, bucket: &str, keys: &[String]) -> AppResult<()>;

    /// List objects whose key starts with `prefix`.
    ///
    /// When `recursive` is false only keys without a further `/` after the
    /// prefix are returned.
    async fn list(&self, bucket: &str, prefix: &str, recursive: bool)
    -> AppResult<Vec<ObjectMeta>>;

    /// Produce a time-limited GET URL for an object.
    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        options: &PresignOptions,
    ) -> AppResult<String>;
}

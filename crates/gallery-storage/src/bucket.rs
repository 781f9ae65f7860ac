//! Per-user bucket handle.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use gallery_core::result::AppResult;
use gallery_core::traits::object_store::{ObjectStore, PresignOptions};
use gallery_core::types::UserBuckets;

use crate::keys;

/// An object store bound to one user's primary and service buckets.
///
/// Cheap to clone; this is the resolved bucket handle passed explicitly to
/// every operation that touches blobs.
#[derive(Debug, Clone)]
pub struct BucketClient {
    store: Arc<dyn ObjectStore>,
    buckets: UserBuckets,
}

impl BucketClient {
    pub fn new(store: Arc<dyn ObjectStore>, buckets: UserBuckets) -> Self {
        Self { store, buckets }
    }

    pub fn buckets(&self) -> &UserBuckets {
        &self.buckets
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Create both buckets if they do not exist yet.
    pub async fn ensure_buckets(&self) -> AppResult<()> {
        self.store.ensure_bucket(&self.buckets.primary).await?;
        self.store.ensure_bucket(&self.buckets.service).await
    }

    pub async fn put_primary(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<()> {
        self.store
            .put(&self.buckets.primary, key, data, content_type)
            .await
    }

    pub async fn get_primary(&self, key: &str) -> AppResult<Bytes> {
        self.store.get(&self.buckets.primary, key).await
    }

    pub async fn remove_primary(&self, key: &str) -> AppResult<()> {
        self.store.remove(&self.buckets.primary, key).await
    }

    pub async fn remove_primary_many(&self, keys: &[String]) -> AppResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        debug!(bucket = %self.buckets.primary, count = keys.len(), "Removing primary objects");
        self.store.remove_many(&self.buckets.primary, keys).await
    }

    pub async fn put_service(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<()> {
        self.store
            .put(&self.buckets.service, key, data, content_type)
            .await
    }

    pub async fn get_service(&self, key: &str) -> AppResult<Bytes> {
        self.store.get(&self.buckets.service, key).await
    }

    pub async fn remove_service_many(&self, keys: &[String]) -> AppResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        debug!(bucket = %self.buckets.service, count = keys.len(), "Removing service objects");
        self.store.remove_many(&self.buckets.service, keys).await
    }

    /// Every key under `hls/<file_code>/` in the service bucket.
    pub async fn hls_keys(&self, file_code: &str) -> AppResult<Vec<String>> {
        let objects = self
            .store
            .list(&self.buckets.service, &keys::hls_prefix(file_code), true)
            .await?;
        Ok(objects.into_iter().map(|o| o.key).collect())
    }

    pub async fn presign_primary(&self, key: &str, options: &PresignOptions) -> AppResult<String> {
        self.store
            .presign_get(&self.buckets.primary, key, options)
            .await
    }
}

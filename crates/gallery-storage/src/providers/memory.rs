//! In-memory object store.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use gallery_core::error::AppError;
use gallery_core::result::AppResult;
use gallery_core::traits::object_store::{ObjectMeta, ObjectStore, PresignOptions};

use super::validate_key;
use crate::presign::unsigned_url;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
    last_modified: DateTime<Utc>,
}

type Buckets = HashMap<String, BTreeMap<String, StoredObject>>;

/// Map-backed [`ObjectStore`]. Buckets are created on first write.
///
/// Clones share the same contents.
#[derive(Debug, Clone)]
pub struct MemoryObjectStore {
    buckets: Arc<RwLock<Buckets>>,
    public_base_url: String,
    fail_removals: Arc<AtomicBool>,
}

impl MemoryObjectStore {
    pub fn new(public_base_url: &str) -> Self {
        Self {
            buckets: Arc::default(),
            public_base_url: public_base_url.to_string(),
            fail_removals: Arc::default(),
        }
    }

    /// Make every subsequent removal fail with a storage error.
    pub fn set_fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::SeqCst);
    }

    /// All keys currently stored in `bucket`, sorted.
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// The content type an object was stored with.
    pub async fn content_type(&self, bucket: &str, key: &str) -> Option<String> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|o| o.content_type.clone())
    }

    fn check_removals(&self) -> AppResult<()> {
        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(AppError::storage("Object removal rejected by backend"));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn ensure_bucket(&self, bucket: &str) -> AppResult<()> {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default();
        Ok(())
    }

    async fn put(&self, bucket: &str, key: &str, data: Bytes, content_type: &str)
    -> AppResult<()> {
        validate_key(key)?;
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default()
            .insert(
                key.to_string(),
                StoredObject {
                    data,
                    content_type: content_type.to_string(),
                    last_modified: Utc::now(),
                },
            );
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> AppResult<Bytes> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|o| o.data.clone())
            .ok_or_else(|| AppError::not_found(format!("Object not found: {bucket}/{key}")))
    }

    async fn remove(&self, bucket: &str, key: &str) -> AppResult<()> {
        self.check_removals()?;
        if let Some(objects) = self.buckets.write().await.get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }

    async fn remove_many(&self, bucket: &str, keys: &[String]) -> AppResult<()> {
        self.check_removals()?;
        if let Some(objects) = self.buckets.write().await.get_mut(bucket) {
            for key in keys {
                objects.remove(key);
            }
        }
        Ok(())
    }

    async fn list(&self, bucket: &str, prefix: &str, recursive: bool)
    -> AppResult<Vec<ObjectMeta>> {
        let buckets = self.buckets.read().await;
        let Some(objects) = buckets.get(bucket) else {
            return Ok(Vec::new());
        };
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| recursive || !key[prefix.len()..].contains('/'))
            .map(|(key, object)| ObjectMeta {
                key: key.clone(),
                size_bytes: object.data.len() as u64,
                content_type: Some(object.content_type.clone()),
                last_modified: Some(object.last_modified),
            })
            .collect())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        options: &PresignOptions,
    ) -> AppResult<String> {
        validate_key(key)?;
        unsigned_url(&self.public_base_url, bucket, key, options)
    }
}

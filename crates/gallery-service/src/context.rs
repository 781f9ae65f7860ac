//! Per-call context: who is acting and which buckets they own.

use std::sync::Arc;

use gallery_core::traits::object_store::ObjectStore;
use gallery_core::types::UserBuckets;
use gallery_storage::BucketClient;

/// The acting user and their resolved bucket handle.
///
/// Built by the caller for every operation; services keep no per-user
/// state of their own.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: i64,
    pub bucket: BucketClient,
}

impl RequestContext {
    pub fn new(user_id: i64, bucket: BucketClient) -> Self {
        Self { user_id, bucket }
    }

    /// Context for `user_id` with buckets derived from `bucket_prefix`.
    pub fn for_user(user_id: i64, store: Arc<dyn ObjectStore>, bucket_prefix: &str) -> Self {
        Self {
            user_id,
            bucket: BucketClient::new(store, UserBuckets::for_user(bucket_prefix, user_id)),
        }
    }
}

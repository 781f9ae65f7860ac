//! Object store implementations.

pub mod local;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

use std::sync::Arc;

use tracing::info;

use gallery_core::config::storage::StorageConfig;
use gallery_core::error::AppError;
use gallery_core::result::AppResult;
use gallery_core::traits::object_store::ObjectStore;

pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;

/// Build the object store selected by `storage.provider`.
pub async fn build_object_store(config: &StorageConfig) -> AppResult<Arc<dyn ObjectStore>> {
    info!(provider = %config.provider, "Initializing object store");
    match config.provider.as_str() {
        "local" => Ok(Arc::new(
            LocalObjectStore::new(&config.local.root_path, &config.public_base_url).await?,
        )),
        "memory" => Ok(Arc::new(MemoryObjectStore::new(&config.public_base_url))),
        #[cfg(feature = "s3")]
        "s3" => Ok(Arc::new(s3::S3ObjectStore::new(&config.s3).await?)),
        #[cfg(not(feature = "s3"))]
        "s3" => Err(AppError::configuration(
            "S3 object store requested but the `s3` feature is not enabled",
        )),
        other => Err(AppError::configuration(format!(
            "Unknown storage provider: {other}"
        ))),
    }
}

/// Reject keys that would escape their bucket on a path-based backend.
pub(crate) fn validate_key(key: &str) -> AppResult<()> {
    let escapes = key.is_empty()
        || key.starts_with('/')
        || key.split('/').any(|part| part == ".." || part == ".");
    if escapes {
        return Err(AppError::invalid_param(format!("Invalid object key: {key:?}")));
    }
    Ok(())
}

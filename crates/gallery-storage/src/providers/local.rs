//! Local filesystem object store.
//!
//! Each bucket is a directory under the root and each key a relative path
//! inside it. Content types are not persisted; listings infer them from the
//! extension.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use gallery_core::error::{AppError, ErrorKind};
use gallery_core::result::AppResult;
use gallery_core::traits::object_store::{ObjectMeta, ObjectStore, PresignOptions};

use super::validate_key;
use crate::presign::unsigned_url;

/// Filesystem-backed [`ObjectStore`].
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    /// Create the store rooted at `root_path`, creating the directory.
    pub async fn new(root_path: &str, public_base_url: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            root,
            public_base_url: public_base_url.to_string(),
        })
    }

    fn bucket_dir(&self, bucket: &str) -> AppResult<PathBuf> {
        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == ".." || bucket == "." {
            return Err(AppError::invalid_param(format!("Invalid bucket name: {bucket:?}")));
        }
        Ok(self.root.join(bucket))
    }

    fn resolve(&self, bucket: &str, key: &str) -> AppResult<PathBuf> {
        validate_key(key)?;
        Ok(self.bucket_dir(bucket)?.join(key))
    }
}

fn io_error(action: &str, bucket: &str, key: &str, err: std::io::Error) -> AppError {
    if err.kind() == std::io::ErrorKind::NotFound {
        AppError::not_found(format!("Object not found: {bucket}/{key}"))
    } else {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to {action} object: {bucket}/{key}"),
            err,
        )
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root).await.is_ok_and(|m| m.is_dir()))
    }

    async fn ensure_bucket(&self, bucket: &str) -> AppResult<()> {
        let dir = self.bucket_dir(bucket)?;
        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create bucket: {bucket}"),
                e,
            )
        })
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        _content_type: &str,
    ) -> AppResult<()> {
        let path = self.resolve(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("prepare", bucket, key, e))?;
        }
        fs::write(&path, &data)
            .await
            .map_err(|e| io_error("write", bucket, key, e))?;
        debug!(bucket, key, bytes = data.len(), "Stored object");
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> AppResult<Bytes> {
        let path = self.resolve(bucket, key)?;
        let data = fs::read(&path)
            .await
            .map_err(|e| io_error("read", bucket, key, e))?;
        Ok(Bytes::from(data))
    }

    async fn remove(&self, bucket: &str, key: &str) -> AppResult<()> {
        let path = self.resolve(bucket, key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove", bucket, key, e)),
        }
    }

    async fn remove_many(&self, bucket: &str, keys: &[String]) -> AppResult<()> {
        for key in keys {
            self.remove(bucket, key).await?;
        }
        Ok(())
    }

    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> AppResult<Vec<ObjectMeta>> {
        let bucket_dir = self.bucket_dir(bucket)?;
        let mut objects = Vec::new();
        let mut pending = vec![bucket_dir.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(io_error("list", bucket, prefix, e)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| io_error("list", bucket, prefix, e))?
            {
                let path = entry.path();
                let key = relative_key(&bucket_dir, &path);
                let meta = entry
                    .metadata()
                    .await
                    .map_err(|e| io_error("stat", bucket, &key, e))?;

                if meta.is_dir() {
                    let dir_prefix = format!("{key}/");
                    if dir_prefix.starts_with(prefix) || prefix.starts_with(&dir_prefix) {
                        pending.push(path);
                    }
                    continue;
                }

                let Some(rest) = key.strip_prefix(prefix) else {
                    continue;
                };
                if !recursive && rest.contains('/') {
                    continue;
                }
                objects.push(ObjectMeta {
                    content_type: content_type_from_key(&key).map(str::to_string),
                    size_bytes: meta.len(),
                    last_modified: meta.modified().ok().map(chrono::DateTime::from),
                    key,
                });
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
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

/// Key of `path` relative to the bucket directory, `/`-separated.
fn relative_key(bucket_dir: &Path, path: &Path) -> String {
    path.strip_prefix(bucket_dir)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn content_type_from_key(key: &str) -> Option<&'static str> {
    let ext = key.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "m3u8" => crate::keys::PLAYLIST_CONTENT_TYPE,
        "ts" => crate::keys::SEGMENT_CONTENT_TYPE,
        "mp4" => "video/mp4",
        _ => return None,
    };
    Some(mime)
}

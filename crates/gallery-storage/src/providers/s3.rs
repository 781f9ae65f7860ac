//! S3-compatible object store (AWS S3, MinIO).

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use bytes::Bytes;
use tracing::{debug, info};

use gallery_core::config::storage::S3StorageConfig;
use gallery_core::error::AppError;
use gallery_core::result::AppResult;
use gallery_core::traits::object_store::{ObjectMeta, ObjectStore, PresignOptions};

/// `DeleteObjects` accepts at most this many keys per request.
const MAX_DELETE_BATCH: usize = 1000;

/// [`ObjectStore`] backed by the AWS SDK.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Build a client from configuration. Static credentials are used when
    /// an access key is configured, otherwise the default provider chain.
    pub async fn new(config: &S3StorageConfig) -> AppResult<Self> {
        info!(
            endpoint = %config.endpoint,
            region = %config.region,
            path_style = config.force_path_style,
            "Initializing S3 object store"
        );

        let timeouts = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(config.operation_timeout_seconds))
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .timeout_config(timeouts);
        if !config.access_key.is_empty() {
            loader = loader.credentials_provider(Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "gallery-config",
            ));
        }
        if !config.endpoint.is_empty() {
            loader = loader.endpoint_url(config.endpoint.clone());
        }
        let shared = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
        })
    }
}

fn s3_error<E: std::error::Error>(action: &str, bucket: &str, key: &str, err: E) -> AppError {
    AppError::storage(format!(
        "S3 {action} failed for {bucket}/{key}: {}",
        DisplayErrorContext(&err)
    ))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn provider_type(&self) -> &str {
        "s3"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.client.list_buckets().send().await.is_ok())
    }

    async fn ensure_bucket(&self, bucket: &str) -> AppResult<()> {
        if self.client.head_bucket().bucket(bucket).send().await.is_ok() {
            return Ok(());
        }
        match self.client.create_bucket().bucket(bucket).send().await {
            Ok(_) => {
                info!(bucket, "Created bucket");
                Ok(())
            }
            Err(e)
                if e.as_service_error().is_some_and(|s| {
                    s.is_bucket_already_owned_by_you() || s.is_bucket_already_exists()
                }) =>
            {
                Ok(())
            }
            Err(e) => Err(s3_error("create bucket", bucket, "", e)),
        }
    }

    async fn put(&self, bucket: &str, key: &str, data: Bytes, content_type: &str)
    -> AppResult<()> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| s3_error("put", bucket, key, e))?;
        debug!(bucket, key, bytes = size, "Stored object");
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> AppResult<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|s| s.is_no_such_key()) {
                    AppError::not_found(format!("Object not found: {bucket}/{key}"))
                } else {
                    s3_error("get", bucket, key, e)
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| s3_error("read body", bucket, key, e))?;
        Ok(body.into_bytes())
    }

    async fn remove(&self, bucket: &str, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| s3_error("remove", bucket, key, e))?;
        Ok(())
    }

    async fn remove_many(&self, bucket: &str, keys: &[String]) -> AppResult<()> {
        for batch in keys.chunks(MAX_DELETE_BATCH) {
            let objects = batch
                .iter()
                .map(|key| {
                    ObjectIdentifier::builder()
                        .key(key)
                        .build()
                        .map_err(|e| s3_error("build delete", bucket, key, e))
                })
                .collect::<AppResult<Vec<_>>>()?;
            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|e| s3_error("build delete", bucket, "*", e))?;

            let output = self
                .client
                .delete_objects()
                .bucket(bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| s3_error("bulk remove", bucket, "*", e))?;

            if let Some(failed) = output.errors().first() {
                return Err(AppError::storage(format!(
                    "S3 bulk remove failed for {bucket}/{}: {}",
                    failed.key().unwrap_or_default(),
                    failed.message().unwrap_or("unknown error")
                )));
            }
            debug!(bucket, count = batch.len(), "Removed objects");
        }
        Ok(())
    }

    async fn list(&self, bucket: &str, prefix: &str, recursive: bool)
    -> AppResult<Vec<ObjectMeta>> {
        let mut request = self.client.list_objects_v2().bucket(bucket).prefix(prefix);
        if !recursive {
            request = request.delimiter("/");
        }

        let mut pages = request.into_paginator().send();
        let mut objects = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| s3_error("list", bucket, prefix, e))?;
            for object in page.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                objects.push(ObjectMeta {
                    key: key.to_string(),
                    size_bytes: object.size().unwrap_or_default().max(0) as u64,
                    content_type: None,
                    last_modified: object
                        .last_modified()
                        .and_then(|t| chrono::DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
                });
            }
        }
        Ok(objects)
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        options: &PresignOptions,
    ) -> AppResult<String> {
        let presigning = PresigningConfig::expires_in(options.expires_in)
            .map_err(|e| s3_error("presign config", bucket, key, e))?;

        let mut request = self.client.get_object().bucket(bucket).key(key);
        if let Some(disposition) = &options.response_content_disposition {
            request = request.response_content_disposition(disposition);
        }
        if let Some(content_type) = &options.response_content_type {
            request = request.response_content_type(content_type);
        }

        let presigned = request
            .presigned(presigning)
            .await
            .map_err(|e| s3_error("presign", bucket, key, e))?;
        Ok(presigned.uri().to_string())
    }
}

//! Presigned download URLs.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use gallery_core::error::AppError;
use gallery_core::result::AppResult;
use gallery_core::traits::object_store::PresignOptions;
use gallery_database::FileStore;
use gallery_entity::Scope;
use gallery_storage::keys;

use crate::context::RequestContext;

/// Issues short-lived download URLs for primary blobs.
#[derive(Debug, Clone)]
pub struct DownloadService {
    files: Arc<dyn FileStore>,
    ttl: Duration,
}

impl DownloadService {
    pub fn new(files: Arc<dyn FileStore>, ttl: Duration) -> Self {
        Self { files, ttl }
    }

    /// Presigned GET for the file's primary blob that downloads as an
    /// attachment under its display name.
    pub async fn presigned_url(&self, ctx: &RequestContext, file_code: &str) -> AppResult<String> {
        let file = self
            .files
            .find_by_code(ctx.user_id, file_code, Scope::Active)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File not found: {file_code}")))?;

        let options = PresignOptions {
            response_content_disposition: Some(content_disposition(&file.file_name)),
            response_content_type: Some(response_content_type(&file.file_type)),
            ..PresignOptions::new(self.ttl)
        };

        let url = ctx
            .bucket
            .presign_primary(&keys::primary_key(&file.file_code), &options)
            .await?;
        debug!(user_id = ctx.user_id, code = %file.file_code, ttl_secs = self.ttl.as_secs(), "Presigned URL issued");
        Ok(url)
    }
}

/// `attachment` disposition with an ASCII fallback name and an RFC 5987
/// UTF-8 name.
pub fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    let mut encoded = String::with_capacity(file_name.len() * 3);
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

/// Stored MIME type with an explicit UTF-8 charset for text types.
pub fn response_content_type(file_type: &str) -> String {
    let file_type = file_type.trim();
    if file_type.is_empty() {
        return "application/octet-stream".to_string();
    }
    if file_type.starts_with("text/") && !file_type.to_ascii_lowercase().contains("charset=") {
        return format!("{file_type}; charset=utf-8");
    }
    file_type.to_string()
}

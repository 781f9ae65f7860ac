//! Upload flow: store the primary blob, record the row, kick the pipeline.

use std::sync::Arc;

use bytes::Bytes;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use gallery_core::error::AppError;
use gallery_core::result::AppResult;
use gallery_database::{FileStore, FolderStore};
use gallery_entity::Scope;
use gallery_entity::file::{CreateFile, File, MediaKind};
use gallery_storage::keys;
use gallery_worker::{DerivativePipeline, PipelineReport};

use crate::context::RequestContext;
use crate::folder::hierarchy::resolve_folder;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// One uploaded file as received from the caller.
#[derive(Debug, Clone)]
pub struct UploadedPart {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Stores uploads and schedules their derivatives.
#[derive(Debug, Clone)]
pub struct UploadService {
    folders: Arc<dyn FolderStore>,
    files: Arc<dyn FileStore>,
    pipeline: DerivativePipeline,
    max_upload_size_bytes: u64,
}

impl UploadService {
    pub fn new(
        folders: Arc<dyn FolderStore>,
        files: Arc<dyn FileStore>,
        pipeline: DerivativePipeline,
        max_upload_size_bytes: u64,
    ) -> Self {
        Self {
            folders,
            files,
            pipeline,
            max_upload_size_bytes,
        }
    }

    /// Store an upload in `folder_code` and return the new row with the raw
    /// bytes. Images are previewable immediately.
    ///
    /// The blob is written before the row; if the row cannot be inserted the
    /// blob is removed again on a best-effort basis.
    pub async fn upload_file(
        &self,
        ctx: &RequestContext,
        folder_code: &str,
        part: UploadedPart,
    ) -> AppResult<(File, Bytes)> {
        let file_name = part.file_name.trim();
        if file_name.is_empty() {
            return Err(AppError::invalid_param("File name cannot be empty"));
        }
        let size = part.data.len() as u64;
        if size > self.max_upload_size_bytes {
            return Err(AppError::invalid_param(format!(
                "Upload of {size} bytes exceeds the {} byte limit",
                self.max_upload_size_bytes
            )));
        }

        let folder =
            resolve_folder(self.folders.as_ref(), ctx.user_id, folder_code, Scope::Active).await?;

        let content_type = match part.content_type.trim() {
            "" => DEFAULT_CONTENT_TYPE.to_string(),
            ct => ct.to_string(),
        };
        let file_code = Uuid::new_v4().to_string();
        let key = keys::primary_key(&file_code);

        ctx.bucket
            .put_primary(&key, part.data.clone(), &content_type)
            .await?;

        let data = CreateFile {
            user_id: ctx.user_id,
            folder_id: folder.id,
            file_name: file_name.to_string(),
            file_code: file_code.clone(),
            file_size: part.data.len() as i64,
            is_previewable: MediaKind::from_mime(&content_type) == MediaKind::Image,
            file_type: content_type,
        };

        let file = match self.files.insert(&data).await {
            Ok(file) => file,
            Err(e) => {
                error!(user_id = ctx.user_id, code = %file_code, error = %e, "Failed to record upload");
                if let Err(cleanup) = ctx.bucket.remove_primary(&key).await {
                    warn!(code = %file_code, error = %cleanup, "Failed to remove orphaned upload blob");
                }
                return Err(e);
            }
        };

        info!(
            user_id = ctx.user_id,
            file_id = file.id,
            code = %file.file_code,
            size = file.file_size,
            file_type = %file.file_type,
            folder_id = folder.id,
            "File uploaded"
        );
        Ok((file, part.data))
    }

    /// [`upload_file`](Self::upload_file) followed by a detached derivative
    /// pipeline. The handle is only for callers that want to observe it.
    pub async fn process_upload(
        &self,
        ctx: &RequestContext,
        folder_code: &str,
        part: UploadedPart,
    ) -> AppResult<(File, Option<JoinHandle<PipelineReport>>)> {
        let (file, data) = self.upload_file(ctx, folder_code, part).await?;
        let handle = self.pipeline.spawn(ctx.bucket.clone(), file.clone(), data);
        Ok((file, handle))
    }
}

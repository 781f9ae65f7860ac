//! Thumbnail and HLS retrieval, plus manual derivative regeneration.

use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use gallery_core::error::AppError;
use gallery_core::result::AppResult;
use gallery_database::FileStore;
use gallery_entity::Scope;
use gallery_entity::file::{File, MediaKind};
use gallery_storage::keys;
use gallery_worker::{DerivativePipeline, PipelineReport};

use crate::cleanup::derivative_keys;
use crate::context::RequestContext;

/// Serves derivatives produced by the pipeline.
#[derive(Debug, Clone)]
pub struct PreviewService {
    files: Arc<dyn FileStore>,
    pipeline: DerivativePipeline,
}

impl PreviewService {
    pub fn new(files: Arc<dyn FileStore>, pipeline: DerivativePipeline) -> Self {
        Self { files, pipeline }
    }

    /// JPEG thumbnail bytes. `ResourceNotReady` until the pipeline has
    /// stored one.
    pub async fn get_thumbnail(&self, ctx: &RequestContext, file_code: &str) -> AppResult<Bytes> {
        let file = self.find_by_code(ctx, file_code).await?;
        if file.media_kind() == MediaKind::Other {
            return Err(AppError::invalid_param(format!(
                "Files of type {} have no thumbnail",
                file.file_type
            )));
        }

        let thumbnail = self
            .files
            .find_thumbnail(file.id)
            .await?
            .ok_or_else(|| AppError::not_ready(format!("Thumbnail for {file_code} is not ready")))?;
        ctx.bucket.get_service(&thumbnail.file_path).await
    }

    /// The rewritten HLS media playlist of a video.
    pub async fn get_master_playlist(&self, ctx: &RequestContext, file_code: &str) -> AppResult<Bytes> {
        let file = self.previewable_video(ctx, file_code).await?;
        ctx.bucket
            .get_service(&keys::hls_playlist_key(&file.file_code))
            .await
    }

    /// Segment `index` of a video's HLS rendition.
    pub async fn get_segment(&self, ctx: &RequestContext, file_code: &str, index: u32) -> AppResult<Bytes> {
        let file = self.previewable_video(ctx, file_code).await?;
        ctx.bucket
            .get_service(&keys::hls_segment_key(&file.file_code, index))
            .await
    }

    /// Drop a file's derivatives and run the pipeline again from its
    /// primary blob, waiting for the result.
    pub async fn regenerate(&self, ctx: &RequestContext, file_id: i64) -> AppResult<PipelineReport> {
        let mut file = self
            .files
            .find_by_id(ctx.user_id, file_id, Scope::Active)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File not found: {file_id}")))?;
        if !DerivativePipeline::accepts(&file) {
            return Err(AppError::invalid_param(format!(
                "Files of type {} have no derivatives",
                file.file_type
            )));
        }

        let thumbnail = self.files.find_thumbnail(file.id).await?;
        let stale = derivative_keys(&ctx.bucket, &file, thumbnail.as_ref()).await?;
        if let Some(thumb) = &thumbnail {
            self.files.delete_thumbnails(&[thumb.id]).await?;
        }
        if file.is_video() && file.is_previewable {
            self.files.set_previewable(file.id, false).await?;
            file.is_previewable = false;
        }
        ctx.bucket.remove_service_many(&stale).await?;

        let data = ctx
            .bucket
            .get_primary(&keys::primary_key(&file.file_code))
            .await?;

        info!(
            user_id = ctx.user_id,
            file_id,
            removed = stale.len(),
            "Regenerating derivatives"
        );
        Ok(self.pipeline.run(ctx.bucket.clone(), file, data).await)
    }

    async fn find_by_code(&self, ctx: &RequestContext, file_code: &str) -> AppResult<File> {
        self.files
            .find_by_code(ctx.user_id, file_code, Scope::WithDeleted)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File not found: {file_code}")))
    }

    async fn previewable_video(&self, ctx: &RequestContext, file_code: &str) -> AppResult<File> {
        let file = self.find_by_code(ctx, file_code).await?;
        if !file.is_video() {
            return Err(AppError::invalid_param(format!(
                "Files of type {} have no HLS rendition",
                file.file_type
            )));
        }
        if file.file_size > self.pipeline.config().max_previewable_video_bytes {
            return Err(AppError::invalid_param(format!(
                "Video {file_code} is too large to preview"
            )));
        }
        if !file.is_previewable {
            return Err(AppError::not_ready(format!(
                "HLS rendition for {file_code} is not ready"
            )));
        }
        Ok(file)
    }
}

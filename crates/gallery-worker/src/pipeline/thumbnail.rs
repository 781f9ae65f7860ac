//! Thumbnail derivative task.
//!
//! Images are decoded and scaled in-process. Videos are probed for their
//! frame count and a uniformly random frame is extracted by the encoder.
//! The JPEG lands at `thumb/<code>.jpg` in the service bucket and the
//! thumbnail row is upserted afterwards.

use std::path::Path;

use bytes::Bytes;
use rand::Rng;
use tracing::debug;

use gallery_core::error::{AppError, ErrorKind};
use gallery_core::result::AppResult;
use gallery_entity::file::{File, MediaKind, Thumbnail};
use gallery_media::thumbnail::render_thumbnail;
use gallery_storage::{BucketClient, keys};

use crate::runner::PipelineContext;

/// Produce, upload and record the thumbnail of `file` from its staged copy.
pub async fn generate(
    ctx: &PipelineContext,
    bucket: &BucketClient,
    file: &File,
    staged: &Path,
) -> AppResult<Thumbnail> {
    let jpeg = match file.media_kind() {
        MediaKind::Image => image_thumbnail(ctx, staged).await?,
        MediaKind::Video => video_thumbnail(ctx, staged).await?,
        MediaKind::Other => {
            return Err(AppError::invalid_param(format!(
                "No thumbnail for content type {}",
                file.file_type
            )));
        }
    };

    let key = keys::thumbnail_key(&file.file_code);
    tokio::time::timeout(
        ctx.config.object_timeout(),
        bucket.put_service(&key, jpeg, keys::THUMBNAIL_CONTENT_TYPE),
    )
    .await??;

    ctx.files.upsert_thumbnail(file.id, &key).await
}

async fn image_thumbnail(ctx: &PipelineContext, staged: &Path) -> AppResult<Bytes> {
    let data = tokio::fs::read(staged).await?;
    let height = ctx.config.thumbnail_height;
    let quality = ctx.config.jpeg_quality;

    let jpeg = tokio::task::spawn_blocking(move || render_thumbnail(&data, height, quality))
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Thumbnail render task failed", e))??;
    Ok(Bytes::from(jpeg))
}

async fn video_thumbnail(ctx: &PipelineContext, staged: &Path) -> AppResult<Bytes> {
    let probe = ctx.encoder.probe(staged).await?;
    let frames = probe.frame_count()?;
    let index = pick_frame(frames);
    debug!(frames, index, "Extracting thumbnail frame");

    Ok(ctx
        .encoder
        .extract_frame(staged, index, ctx.config.thumbnail_height)
        .await?)
}

/// Uniform index in `[0, frames)`, or 0 for an empty stream.
fn pick_frame(frames: u64) -> u64 {
    if frames == 0 {
        return 0;
    }
    rand::rng().random_range(0..frames)
}

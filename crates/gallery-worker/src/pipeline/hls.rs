//! HLS rendition task.
//!
//! Only videos no larger than the configured ceiling are segmented. The
//! segmenter writes into a fresh scratch directory; the playlist's segment
//! URIs are rewritten to point at the segment endpoint before everything is
//! uploaded under `hls/<code>/`. Segments go up before the playlist so a
//! visible playlist never references a missing segment. The file is marked
//! previewable only after all uploads succeed.

use std::path::Path;

use tracing::debug;

use gallery_core::config::pipeline::PipelineConfig;
use gallery_core::result::AppResult;
use gallery_entity::file::File;
use gallery_media::playlist::rewrite_segment_uris;
use gallery_storage::{BucketClient, keys};

use crate::pipeline::staging;
use crate::runner::PipelineContext;

/// Why `file` gets no HLS rendition, if it does not.
pub fn skip_reason(file: &File, config: &PipelineConfig) -> Option<String> {
    if !file.is_video() {
        return Some("not a video".to_string());
    }
    if file.file_size > config.max_previewable_video_bytes {
        return Some(format!(
            "{} bytes exceeds the {} byte ceiling",
            file.file_size, config.max_previewable_video_bytes
        ));
    }
    None
}

/// Segment, rewrite, upload and mark previewable. Returns the number of
/// objects uploaded.
pub async fn transcode(
    ctx: &PipelineContext,
    bucket: &BucketClient,
    file: &File,
    staged: &Path,
) -> AppResult<usize> {
    let work_dir = staging::hls_work_dir(&ctx.config.temp_dir, &file.file_code);
    staging::discard_dir(&work_dir).await;

    let result = async {
        tokio::fs::create_dir_all(&work_dir).await?;
        segment_and_upload(ctx, bucket, file, staged, &work_dir).await
    }
    .await;

    staging::discard_dir(&work_dir).await;
    let uploaded = result?;

    ctx.files.set_previewable(file.id, true).await?;
    Ok(uploaded)
}

async fn segment_and_upload(
    ctx: &PipelineContext,
    bucket: &BucketClient,
    file: &File,
    staged: &Path,
    work_dir: &Path,
) -> AppResult<usize> {
    let code = &file.file_code;
    let playlist_name = keys::hls_playlist_name(code);

    let playlist_path = ctx
        .encoder
        .segment_hls(
            staged,
            work_dir,
            &playlist_name,
            ctx.config.hls_segment_seconds,
        )
        .await?;

    let raw = tokio::fs::read_to_string(&playlist_path).await?;
    let rewritten = rewrite_segment_uris(&raw, &ctx.config.hls_url_prefix, code);
    tokio::fs::write(&playlist_path, rewritten).await?;

    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(work_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if keys::hls_content_type(&name).is_some() {
            names.push(name);
        } else {
            debug!(file = %name, "Ignoring unexpected segmenter output");
        }
    }
    // Segments first, playlist last.
    names.sort_by_key(|name| (*name == playlist_name, name.clone()));

    for name in &names {
        let Some(content_type) = keys::hls_content_type(name) else {
            continue;
        };
        let data = tokio::fs::read(work_dir.join(name)).await?;
        tokio::time::timeout(
            ctx.config.object_timeout(),
            bucket.put_service(&keys::hls_object_key(code, name), data.into(), content_type),
        )
        .await??;
    }

    Ok(names.len())
}

//! Derivative blob enumeration shared by every delete path.

use tracing::debug;

use gallery_core::result::AppResult;
use gallery_entity::file::{File, Thumbnail};
use gallery_storage::{BucketClient, keys};

/// Every service-bucket key derived from `file`: its thumbnail and, for
/// videos, everything under `hls/<code>/`.
///
/// HLS objects are listed for every video, not just previewable ones, so
/// that a transcode interrupted mid-upload leaves nothing behind.
pub async fn derivative_keys(
    bucket: &BucketClient,
    file: &File,
    thumbnail: Option<&Thumbnail>,
) -> AppResult<Vec<String>> {
    let mut out = Vec::new();

    match thumbnail {
        Some(thumb) => out.push(thumb.file_path.clone()),
        None if file.is_image() || file.is_video() => {
            out.push(keys::thumbnail_key(&file.file_code));
        }
        None => {}
    }

    if file.is_video() {
        let hls = bucket.hls_keys(&file.file_code).await?;
        debug!(file_code = %file.file_code, count = hls.len(), "HLS objects enumerated");
        out.extend(hls);
    }

    Ok(out)
}

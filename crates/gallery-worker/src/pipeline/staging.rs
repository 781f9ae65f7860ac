//! Local temp copies of uploads.
//!
//! The encoder reads from the filesystem, so every upload is written to
//! `<temp_dir>/<file_code>-file` before derivative tasks start. The copy is
//! removed when the pipeline ends, whatever the outcome.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use gallery_core::result::AppResult;

pub fn staged_path(temp_dir: &Path, file_code: &str) -> PathBuf {
    temp_dir.join(format!("{file_code}-file"))
}

/// Scratch directory for the HLS segmenter of one file.
pub fn hls_work_dir(temp_dir: &Path, file_code: &str) -> PathBuf {
    temp_dir.join(format!("{file_code}-hls"))
}

/// Write `data` to the staging path of `file_code`.
pub async fn stage(temp_dir: &Path, file_code: &str, data: &[u8]) -> AppResult<PathBuf> {
    tokio::fs::create_dir_all(temp_dir).await?;
    let path = staged_path(temp_dir, file_code);
    tokio::fs::write(&path, data).await?;
    debug!(path = %path.display(), size = data.len(), "Upload staged");
    Ok(path)
}

/// Remove a staged file. Missing files are fine.
pub async fn discard(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Staged upload removed"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove staged upload"),
    }
}

/// Remove a scratch directory tree. Missing directories are fine.
pub async fn discard_dir(path: &Path) {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove scratch directory"),
    }
}

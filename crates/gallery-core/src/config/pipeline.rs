//! Derivative pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for post-upload thumbnail and HLS generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Whether uploads launch the pipeline at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Directory for staged uploads and HLS scratch directories.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Maximum number of pipelines running at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Videos larger than this are never transcoded to HLS.
    #[serde(default = "default_max_previewable_video_bytes")]
    pub max_previewable_video_bytes: i64,
    /// Thumbnail height in pixels; width follows the aspect ratio.
    #[serde(default = "default_thumbnail_height")]
    pub thumbnail_height: u32,
    /// JPEG quality for thumbnails (1-100).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Target HLS segment duration in seconds.
    #[serde(default = "default_hls_segment_seconds")]
    pub hls_segment_seconds: u32,
    /// URL prefix written into rewritten playlists.
    #[serde(default = "default_hls_url_prefix")]
    pub hls_url_prefix: String,
    /// Path to the `ffmpeg` executable.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
    /// Path to the `ffprobe` executable.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,
    /// Deadline for a single encoder invocation.
    #[serde(default = "default_encoder_timeout")]
    pub encoder_timeout_seconds: u64,
    /// Deadline for a single object store call made by the pipeline.
    #[serde(default = "default_object_timeout")]
    pub object_timeout_seconds: u64,
}

impl PipelineConfig {
    pub fn encoder_timeout(&self) -> Duration {
        Duration::from_secs(self.encoder_timeout_seconds)
    }

    pub fn object_timeout(&self) -> Duration {
        Duration::from_secs(self.object_timeout_seconds)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            temp_dir: default_temp_dir(),
            max_concurrent: default_max_concurrent(),
            max_previewable_video_bytes: default_max_previewable_video_bytes(),
            thumbnail_height: default_thumbnail_height(),
            jpeg_quality: default_jpeg_quality(),
            hls_segment_seconds: default_hls_segment_seconds(),
            hls_url_prefix: default_hls_url_prefix(),
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            encoder_timeout_seconds: default_encoder_timeout(),
            object_timeout_seconds: default_object_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("gallery")
}

fn default_max_concurrent() -> usize {
    4
}

fn default_max_previewable_video_bytes() -> i64 {
    150_000_000
}

fn default_thumbnail_height() -> u32 {
    150
}

fn default_jpeg_quality() -> u8 {
    85
}

fn default_hls_segment_seconds() -> u32 {
    10
}

fn default_hls_url_prefix() -> String {
    "/api/hls".to_string()
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_encoder_timeout() -> u64 {
    600
}

fn default_object_timeout() -> u64 {
    120
}

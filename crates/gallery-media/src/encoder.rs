//! The external video encoder.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use gallery_core::config::pipeline::PipelineConfig;

use crate::error::{MediaError, MediaResult};
use crate::executor::CommandRunner;
use crate::probe::ProbeResult;

/// Operations the pipeline needs from a video toolchain.
#[async_trait]
pub trait VideoEncoder: Send + Sync + std::fmt::Debug + 'static {
    /// Read stream and container metadata.
    async fn probe(&self, input: &Path) -> MediaResult<ProbeResult>;

    /// Extract frame `frame_index` scaled to `height` pixels as JPEG bytes.
    async fn extract_frame(&self, input: &Path, frame_index: u64, height: u32)
    -> MediaResult<Bytes>;

    /// Segment `input` into `output_dir/segment-<n>.ts` plus
    /// `output_dir/<playlist_name>`, returning the playlist path.
    async fn segment_hls(
        &self,
        input: &Path,
        output_dir: &Path,
        playlist_name: &str,
        segment_seconds: u32,
    ) -> MediaResult<PathBuf>;
}

/// [`VideoEncoder`] backed by the `ffprobe` and `ffmpeg` executables.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    ffmpeg: CommandRunner,
    ffprobe: CommandRunner,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg_path: &str, ffprobe_path: &str, timeout: Duration) -> Self {
        Self {
            ffmpeg: CommandRunner::new(ffmpeg_path, timeout),
            ffprobe: CommandRunner::new(ffprobe_path, timeout),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            &config.ffmpeg_path,
            &config.ffprobe_path,
            config.encoder_timeout(),
        )
    }
}

fn probe_args(input: &Path) -> Vec<String> {
    vec![
        "-v".into(),
        "quiet".into(),
        "-print_format".into(),
        "json".into(),
        "-show_format".into(),
        "-show_streams".into(),
        input.to_string_lossy().into_owned(),
    ]
}

fn frame_args(input: &Path, frame_index: u64, height: u32) -> Vec<String> {
    vec![
        "-v".into(),
        "error".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-vf".into(),
        format!("select=eq(n\\,{frame_index}),scale=-1:{height}"),
        "-vframes".into(),
        "1".into(),
        "-f".into(),
        "image2pipe".into(),
        "-vcodec".into(),
        "mjpeg".into(),
        "pipe:1".into(),
    ]
}

fn hls_args(input: &Path, output_dir: &Path, playlist_name: &str, segment_seconds: u32) -> Vec<String> {
    vec![
        "-v".into(),
        "error".into(),
        "-y".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-codec".into(),
        "copy".into(),
        "-hls_time".into(),
        segment_seconds.to_string(),
        "-hls_list_size".into(),
        "0".into(),
        "-f".into(),
        "hls".into(),
        "-hls_segment_filename".into(),
        output_dir.join("segment-%d.ts").to_string_lossy().into_owned(),
        output_dir.join(playlist_name).to_string_lossy().into_owned(),
    ]
}

#[async_trait]
impl VideoEncoder for FfmpegEncoder {
    async fn probe(&self, input: &Path) -> MediaResult<ProbeResult> {
        let output = self.ffprobe.run(probe_args(input)).await?;
        ProbeResult::from_json(&output.stdout)
    }

    async fn extract_frame(
        &self,
        input: &Path,
        frame_index: u64,
        height: u32,
    ) -> MediaResult<Bytes> {
        let output = self.ffmpeg.run(frame_args(input, frame_index, height)).await?;
        if output.stdout.is_empty() {
            return Err(MediaError::EmptyOutput(format!(
                "frame {frame_index} of {}",
                input.display()
            )));
        }
        Ok(Bytes::from(output.stdout))
    }

    async fn segment_hls(
        &self,
        input: &Path,
        output_dir: &Path,
        playlist_name: &str,
        segment_seconds: u32,
    ) -> MediaResult<PathBuf> {
        let output = self
            .ffmpeg
            .run(hls_args(input, output_dir, playlist_name, segment_seconds))
            .await?;

        let playlist = output_dir.join(playlist_name);
        if !tokio::fs::try_exists(&playlist).await? {
            return Err(MediaError::EmptyOutput(playlist.display().to_string()));
        }
        info!(
            input = %input.display(),
            duration_ms = output.duration_ms,
            "HLS segmentation finished"
        );
        Ok(playlist)
    }
}

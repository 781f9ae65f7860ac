//! `ffprobe` metadata model and frame counting.

use serde::Deserialize;

use crate::error::{MediaError, MediaResult};

/// The subset of `ffprobe -print_format json -show_format -show_streams`
/// output the pipeline uses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeResult {
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
    #[serde(default)]
    pub format: ProbeFormat,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeStream {
    #[serde(default)]
    pub codec_type: Option<String>,
    /// Exact frame count, when the container records it.
    #[serde(default)]
    pub nb_frames: Option<String>,
    /// Frame rate as a `num/den` fraction.
    #[serde(default)]
    pub r_frame_rate: Option<String>,
    /// Stream duration in seconds.
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeFormat {
    /// Container duration in seconds.
    #[serde(default)]
    pub duration: Option<String>,
}

impl ProbeResult {
    pub fn from_json(raw: &[u8]) -> MediaResult<Self> {
        serde_json::from_slice(raw).map_err(|e| MediaError::Probe(e.to_string()))
    }

    pub fn video_stream(&self) -> Option<&ProbeStream> {
        self.streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
    }

    /// Number of frames in the first video stream.
    ///
    /// Uses `nb_frames` when present, otherwise the whole-number frame rate
    /// multiplied by the stream (or container) duration.
    pub fn frame_count(&self) -> MediaResult<u64> {
        let stream = self
            .video_stream()
            .ok_or_else(|| MediaError::Probe("no video stream".to_string()))?;

        if let Some(frames) = stream
            .nb_frames
            .as_deref()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|n| *n > 0)
        {
            return Ok(frames);
        }

        let rate = stream
            .r_frame_rate
            .as_deref()
            .and_then(whole_frame_rate)
            .ok_or_else(|| MediaError::Probe("unusable frame rate".to_string()))?;

        let duration = stream
            .duration
            .as_deref()
            .or(self.format.duration.as_deref())
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d >= 0.0)
            .ok_or_else(|| MediaError::Probe("unusable duration".to_string()))?;

        Ok((rate as f64 * duration) as u64)
    }
}

/// Integer part of a `num/den` rate; `None` for malformed or zero denominators.
fn whole_frame_rate(raw: &str) -> Option<u64> {
    let (num, den) = raw.split_once('/')?;
    let num: u64 = num.trim().parse().ok()?;
    let den: u64 = den.trim().parse().ok()?;
    if den == 0 {
        return None;
    }
    Some(num / den)
}

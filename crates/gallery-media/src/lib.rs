//! # gallery-media
//!
//! Media processing building blocks for the derivative pipeline: image
//! thumbnail rendering, the [`VideoEncoder`] abstraction over the external
//! `ffmpeg`/`ffprobe` tools, probe metadata, and HLS playlist rewriting.

pub mod encoder;
pub mod error;
pub mod executor;
pub mod playlist;
pub mod probe;
pub mod thumbnail;

pub use encoder::{FfmpegEncoder, VideoEncoder};
pub use error::{MediaError, MediaResult};
pub use probe::ProbeResult;

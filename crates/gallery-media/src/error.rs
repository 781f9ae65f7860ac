//! Media processing errors.

use thiserror::Error;

use gallery_core::error::{AppError, ErrorKind};

/// Errors raised while rendering thumbnails or driving the encoder.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The encoder executable could not be started.
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The encoder did not finish within its deadline.
    #[error("{program} timed out after {seconds} seconds")]
    Timeout { program: String, seconds: u64 },

    /// The encoder exited with a non-zero status.
    #[error("{program} failed with exit code {code}: {stderr}")]
    ProcessFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    /// Probe output was missing or unusable.
    #[error("Invalid probe output: {0}")]
    Probe(String),

    /// The encoder reported success but produced nothing.
    #[error("Encoder produced no output: {0}")]
    EmptyOutput(String),

    /// The image could not be decoded or encoded.
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error during media processing: {0}")]
    Io(#[from] std::io::Error),
}

pub type MediaResult<T> = Result<T, MediaError>;

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        let kind = match &err {
            MediaError::Timeout { .. } => ErrorKind::Timeout,
            MediaError::Io(_) => ErrorKind::Storage,
            _ => ErrorKind::Encoder,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}

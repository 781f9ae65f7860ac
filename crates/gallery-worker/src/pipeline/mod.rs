//! Pipeline stages and the report a finished pipeline produces.

pub mod hls;
pub mod signal;
pub mod staging;
pub mod thumbnail;

use std::fmt;

/// Lifecycle of one upload's derivative pipeline.
///
/// `Uploaded -> Staged -> Done`, or `Failed` from either state. Staging
/// failure goes straight from `Uploaded` to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uploaded,
    Staged,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uploaded => "uploaded",
            Self::Staged => "staged",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// How one derivative task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    /// The task does not apply to this file.
    Skipped(String),
    /// Staging failed before the task could start.
    Cancelled,
    Failed(String),
}

impl TaskOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Failed(_))
    }
}

/// Result of a finished pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub file_code: String,
    pub state: PipelineState,
    pub thumbnail: TaskOutcome,
    pub hls: TaskOutcome,
}

impl PipelineReport {
    pub(crate) fn aborted(file_code: &str, reason: &str) -> Self {
        Self {
            file_code: file_code.to_string(),
            state: PipelineState::Failed,
            thumbnail: TaskOutcome::Failed(reason.to_string()),
            hls: TaskOutcome::Failed(reason.to_string()),
        }
    }
}

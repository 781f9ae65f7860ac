//! # gallery-worker
//!
//! The derivative pipeline run after every image or video upload: the
//! upload is staged to local temp storage, then a thumbnail task and (for
//! videos under the size ceiling) an HLS transcode task run concurrently.
//! Pipelines run detached from the request and never report errors to the
//! uploader; outcomes are logged and returned as a [`PipelineReport`].

pub mod pipeline;
pub mod runner;

pub use pipeline::{PipelineReport, PipelineState, TaskOutcome};
pub use runner::DerivativePipeline;

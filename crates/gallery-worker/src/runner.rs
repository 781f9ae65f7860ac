//! Pipeline runner.
//!
//! Each accepted upload gets one detached task. Inside it, staging and the
//! two derivative tasks run concurrently; the derivative tasks block on the
//! stage signal and either receive the staged path or are cancelled
//! together. A semaphore bounds how many pipelines run at once.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use gallery_core::config::pipeline::PipelineConfig;
use gallery_database::FileStore;
use gallery_entity::file::{File, MediaKind};
use gallery_media::VideoEncoder;
use gallery_storage::BucketClient;

use crate::pipeline::signal::{StageSignal, StageWatcher};
use crate::pipeline::{PipelineReport, PipelineState, TaskOutcome, hls, staging, thumbnail};

/// Dependencies shared by every pipeline run.
#[derive(Debug)]
pub struct PipelineContext {
    pub files: Arc<dyn FileStore>,
    pub encoder: Arc<dyn VideoEncoder>,
    pub config: PipelineConfig,
}

/// Schedules derivative pipelines for uploaded files.
#[derive(Debug, Clone)]
pub struct DerivativePipeline {
    ctx: Arc<PipelineContext>,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

impl DerivativePipeline {
    pub fn new(
        files: Arc<dyn FileStore>,
        encoder: Arc<dyn VideoEncoder>,
        config: PipelineConfig,
    ) -> Self {
        let max_concurrent = config.max_concurrent.max(1);
        Self {
            ctx: Arc::new(PipelineContext {
                files,
                encoder,
                config,
            }),
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.ctx.config
    }

    /// Whether `file` gets derivatives at all.
    pub fn accepts(file: &File) -> bool {
        matches!(file.media_kind(), MediaKind::Image | MediaKind::Video)
    }

    /// Start the pipeline for a freshly stored upload without waiting for
    /// it. Returns `None` when the pipeline is disabled or the file has no
    /// derivatives.
    pub fn spawn(
        &self,
        bucket: BucketClient,
        file: File,
        data: Bytes,
    ) -> Option<JoinHandle<PipelineReport>> {
        if !self.ctx.config.enabled {
            debug!(file_code = %file.file_code, "Derivative pipeline disabled");
            return None;
        }
        if !Self::accepts(&file) {
            debug!(
                file_code = %file.file_code,
                file_type = %file.file_type,
                "No derivatives for content type"
            );
            return None;
        }

        let pipeline = self.clone();
        Some(tokio::spawn(async move {
            pipeline.run(bucket, file, data).await
        }))
    }

    /// Run the pipeline for `file` to completion.
    ///
    /// Never fails: outcomes are logged and reported. The staged copy is
    /// removed before returning.
    pub async fn run(&self, bucket: BucketClient, file: File, data: Bytes) -> PipelineReport {
        let code = file.file_code.clone();
        let _permit = match self.permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                warn!(file_code = %code, "Pipeline permits closed, skipping derivatives");
                return PipelineReport::aborted(&code, "pipeline shut down");
            }
        };

        info!(
            file_code = %code,
            file_type = %file.file_type,
            size = data.len(),
            state = %PipelineState::Uploaded,
            "Derivative pipeline started"
        );

        let temp_dir = self.ctx.config.temp_dir.clone();
        let (signal, watcher) = StageSignal::new();

        let stage = async {
            match staging::stage(&temp_dir, &code, &data).await {
                Ok(path) => {
                    info!(file_code = %code, state = %PipelineState::Staged, "Upload staged");
                    signal.ready(path);
                    true
                }
                Err(e) => {
                    error!(file_code = %code, error = %e, "Failed to stage upload");
                    signal.cancel();
                    false
                }
            }
        };

        let (staged, thumbnail, hls) = tokio::join!(
            stage,
            self.thumbnail_task(watcher.clone(), &bucket, &file),
            self.hls_task(watcher, &bucket, &file),
        );

        staging::discard(&staging::staged_path(&temp_dir, &code)).await;

        let state = if staged && !thumbnail.is_failure() && !hls.is_failure() {
            PipelineState::Done
        } else {
            PipelineState::Failed
        };

        match state {
            PipelineState::Done => info!(
                file_code = %code,
                state = %state,
                ?thumbnail,
                ?hls,
                "Derivative pipeline finished"
            ),
            _ => warn!(
                file_code = %code,
                state = %state,
                ?thumbnail,
                ?hls,
                "Derivative pipeline finished with failures"
            ),
        }

        PipelineReport {
            file_code: code,
            state,
            thumbnail,
            hls,
        }
    }

    /// Wait until no pipeline holds a permit, up to `timeout`. Returns
    /// whether the pipeline went idle in time.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let all = u32::try_from(self.max_concurrent).unwrap_or(u32::MAX);
        match tokio::time::timeout(timeout, self.permits.acquire_many(all)).await {
            Ok(Ok(_permits)) => true,
            Ok(Err(_)) => true,
            Err(_) => {
                warn!(
                    in_flight = self.max_concurrent - self.permits.available_permits(),
                    "Timed out waiting for derivative pipelines"
                );
                false
            }
        }
    }

    async fn thumbnail_task(
        &self,
        watcher: StageWatcher,
        bucket: &BucketClient,
        file: &File,
    ) -> TaskOutcome {
        let Some(staged) = watcher.wait().await else {
            warn!(file_code = %file.file_code, "Thumbnail task cancelled");
            return TaskOutcome::Cancelled;
        };

        match thumbnail::generate(&self.ctx, bucket, file, &staged).await {
            Ok(thumb) => {
                info!(file_code = %file.file_code, path = %thumb.file_path, "Thumbnail stored");
                TaskOutcome::Completed
            }
            Err(e) => {
                error!(file_code = %file.file_code, error = %e, "Thumbnail generation failed");
                TaskOutcome::Failed(e.to_string())
            }
        }
    }

    async fn hls_task(&self, watcher: StageWatcher, bucket: &BucketClient, file: &File) -> TaskOutcome {
        if let Some(reason) = hls::skip_reason(file, &self.ctx.config) {
            debug!(file_code = %file.file_code, reason = %reason, "HLS rendition skipped");
            return TaskOutcome::Skipped(reason);
        }

        let Some(staged) = watcher.wait().await else {
            warn!(file_code = %file.file_code, "HLS task cancelled");
            return TaskOutcome::Cancelled;
        };

        let deadline = self.ctx.config.encoder_timeout();
        match tokio::time::timeout(deadline, hls::transcode(&self.ctx, bucket, file, &staged)).await {
            Ok(Ok(uploaded)) => {
                info!(file_code = %file.file_code, objects = uploaded, "HLS rendition stored");
                TaskOutcome::Completed
            }
            Ok(Err(e)) => {
                error!(file_code = %file.file_code, error = %e, "HLS transcode failed");
                TaskOutcome::Failed(e.to_string())
            }
            Err(_) => {
                error!(
                    file_code = %file.file_code,
                    timeout_secs = deadline.as_secs(),
                    "HLS transcode timed out"
                );
                staging::discard_dir(&staging::hls_work_dir(&self.ctx.config.temp_dir, &file.file_code))
                    .await;
                TaskOutcome::Failed("timed out".to_string())
            }
        }
    }
}

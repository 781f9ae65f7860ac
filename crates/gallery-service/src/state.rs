//! Wiring of every service over one pair of stores.

use std::sync::Arc;
use std::time::Duration;

use gallery_core::config::pipeline::PipelineConfig;
use gallery_core::config::storage::StorageConfig;
use gallery_database::{FileStore, FolderStore};
use gallery_media::VideoEncoder;
use gallery_worker::DerivativePipeline;

use crate::file::{DownloadService, FileService, PreviewService, UploadService};
use crate::folder::FolderService;
use crate::lock::SubtreeLocks;

/// All gallery services, sharing stores, locks and one pipeline.
#[derive(Debug, Clone)]
pub struct GalleryServices {
    pub folders: FolderService,
    pub files: FileService,
    pub uploads: UploadService,
    pub downloads: DownloadService,
    pub previews: PreviewService,
    pub pipeline: DerivativePipeline,
}

impl GalleryServices {
    pub fn new(
        folder_store: Arc<dyn FolderStore>,
        file_store: Arc<dyn FileStore>,
        encoder: Arc<dyn VideoEncoder>,
        storage: &StorageConfig,
        pipeline: PipelineConfig,
    ) -> Self {
        let locks = SubtreeLocks::new();
        let pipeline = DerivativePipeline::new(file_store.clone(), encoder, pipeline);

        Self {
            folders: FolderService::new(folder_store.clone(), file_store.clone(), locks.clone()),
            files: FileService::new(folder_store.clone(), file_store.clone(), locks),
            uploads: UploadService::new(
                folder_store,
                file_store.clone(),
                pipeline.clone(),
                storage.max_upload_size_bytes,
            ),
            downloads: DownloadService::new(
                file_store.clone(),
                Duration::from_secs(storage.presign_ttl_seconds),
            ),
            previews: PreviewService::new(file_store, pipeline.clone()),
            pipeline,
        }
    }
}

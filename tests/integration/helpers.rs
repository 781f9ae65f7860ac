//! Shared test helpers for integration tests.
//!
//! Every test gets a fresh in-memory row store, an in-memory object store,
//! a scripted video encoder and its own temp directory.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use tempfile::TempDir;

use gallery_core::config::pipeline::PipelineConfig;
use gallery_core::config::storage::StorageConfig;
use gallery_core::traits::object_store::ObjectStore;
use gallery_database::MemoryStore;
use gallery_entity::file::File;
use gallery_entity::folder::Folder;
use gallery_media::{MediaError, MediaResult, ProbeResult, VideoEncoder};
use gallery_service::{GalleryServices, RequestContext, UploadedPart};
use gallery_storage::providers::MemoryObjectStore;
use gallery_worker::PipelineReport;

pub const USER: i64 = 1;

/// Videos above this size get no HLS rendition in tests.
pub const VIDEO_CEILING: i64 = 4096;

/// Frame count the fake encoder reports for every video.
pub const FAKE_FRAMES: u64 = 48;

/// Encoder double that writes a two-segment rendition and returns a small
/// JPEG for any frame.
#[derive(Debug, Default)]
pub struct FakeEncoder {
    pub probes: AtomicUsize,
    pub frames: AtomicUsize,
    pub segmentations: AtomicUsize,
    pub fail_segmentation: AtomicBool,
}

#[async_trait]
impl VideoEncoder for FakeEncoder {
    async fn probe(&self, input: &Path) -> MediaResult<ProbeResult> {
        assert!(input.exists(), "probe input must be staged");
        self.probes.fetch_add(1, Ordering::SeqCst);
        ProbeResult::from_json(
            format!(r#"{{"streams":[{{"codec_type":"video","nb_frames":"{FAKE_FRAMES}"}}]}}"#)
                .as_bytes(),
        )
    }

    async fn extract_frame(&self, input: &Path, frame_index: u64, height: u32) -> MediaResult<Bytes> {
        assert!(input.exists(), "frame input must be staged");
        assert!(frame_index < FAKE_FRAMES);
        self.frames.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::from(jpeg(height * 16 / 9, height)))
    }

    async fn segment_hls(
        &self,
        input: &Path,
        output_dir: &Path,
        playlist_name: &str,
        segment_seconds: u32,
    ) -> MediaResult<PathBuf> {
        assert!(input.exists(), "segmenter input must be staged");
        self.segmentations.fetch_add(1, Ordering::SeqCst);
        if self.fail_segmentation.load(Ordering::SeqCst) {
            return Err(MediaError::ProcessFailed {
                program: "ffmpeg".into(),
                code: 1,
                stderr: "scripted failure".into(),
            });
        }

        tokio::fs::write(output_dir.join("segment-0.ts"), b"ts-0").await?;
        tokio::fs::write(output_dir.join("segment-1.ts"), b"ts-1").await?;
        let playlist = format!(
            "#EXTM3U\n#EXT-X-TARGETDURATION:{segment_seconds}\n#EXTINF:{segment_seconds}.0,\nsegment-0.ts\n#EXTINF:3.5,\nsegment-1.ts\n#EXT-X-ENDLIST\n"
        );
        let path = output_dir.join(playlist_name);
        tokio::fs::write(&path, playlist).await?;
        Ok(path)
    }
}

/// A wired gallery over in-memory stores.
pub struct TestApp {
    pub db: Arc<MemoryStore>,
    pub objects: Arc<MemoryObjectStore>,
    pub encoder: Arc<FakeEncoder>,
    pub services: GalleryServices,
    pub temp: TempDir,
    pub storage: StorageConfig,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_pipeline(|_| {}).await
    }

    /// Build an app after letting the caller tweak the pipeline config.
    pub async fn with_pipeline(tweak: impl FnOnce(&mut PipelineConfig)) -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let db = Arc::new(MemoryStore::new());
        let objects = Arc::new(MemoryObjectStore::new("http://objects.test"));
        let encoder = Arc::new(FakeEncoder::default());

        let mut pipeline = PipelineConfig {
            temp_dir: temp.path().join("pipeline"),
            max_previewable_video_bytes: VIDEO_CEILING,
            ..PipelineConfig::default()
        };
        tweak(&mut pipeline);

        let storage = StorageConfig {
            provider: "memory".into(),
            ..StorageConfig::default()
        };

        let services = GalleryServices::new(
            db.clone(),
            db.clone(),
            encoder.clone(),
            &storage,
            pipeline,
        );

        let app = Self {
            db,
            objects,
            encoder,
            services,
            temp,
            storage,
        };
        app.services
            .folders
            .ensure_root(&app.ctx())
            .await
            .expect("root");
        app
    }

    pub fn ctx(&self) -> RequestContext {
        self.ctx_for(USER)
    }

    pub fn ctx_for(&self, user_id: i64) -> RequestContext {
        let store: Arc<dyn ObjectStore> = self.objects.clone();
        RequestContext::for_user(user_id, store, &self.storage.bucket_prefix)
    }

    pub async fn create_folder(&self, parent_code: &str, name: &str) -> Folder {
        self.services
            .folders
            .create_folder(&self.ctx(), parent_code, name)
            .await
            .expect("create folder")
    }

    /// Upload without running the pipeline.
    pub async fn upload_only(&self, folder_code: &str, name: &str, content_type: &str, data: Bytes) -> File {
        let (file, _) = self
            .services
            .uploads
            .upload_file(&self.ctx(), folder_code, part(name, content_type, data))
            .await
            .expect("upload");
        file
    }

    /// Upload and wait for the pipeline, if one was started.
    pub async fn upload(
        &self,
        folder_code: &str,
        name: &str,
        content_type: &str,
        data: Bytes,
    ) -> (File, Option<PipelineReport>) {
        let (file, handle) = self
            .services
            .uploads
            .process_upload(&self.ctx(), folder_code, part(name, content_type, data))
            .await
            .expect("upload");
        let report = match handle {
            Some(handle) => Some(handle.await.expect("pipeline task")),
            None => None,
        };
        (file, report)
    }

    pub async fn primary_keys(&self) -> Vec<String> {
        self.objects.keys(&self.ctx().bucket.buckets().primary).await
    }

    pub async fn service_keys(&self) -> Vec<String> {
        self.objects.keys(&self.ctx().bucket.buckets().service).await
    }

    /// Entries left in the pipeline's temp directory.
    pub fn temp_entries(&self) -> Vec<PathBuf> {
        let dir = self.temp.path().join("pipeline");
        match std::fs::read_dir(dir) {
            Ok(entries) => entries.filter_map(|e| e.ok().map(|e| e.path())).collect(),
            Err(_) => Vec::new(),
        }
    }
}

pub fn part(name: &str, content_type: &str, data: Bytes) -> UploadedPart {
    UploadedPart {
        file_name: name.to_string(),
        content_type: content_type.to_string(),
        data,
    }
}

pub fn png(width: u32, height: u32) -> Bytes {
    let img = RgbImage::from_pixel(width, height, image::Rgb([30, 90, 200]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).expect("encode png");
    Bytes::from(out.into_inner())
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width.max(1), height.max(1), image::Rgb([120, 120, 120]));
    let mut out = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut out, 80))
        .expect("encode jpeg");
    out
}

/// Fake video payload of `size` bytes.
pub fn video(size: usize) -> Bytes {
    Bytes::from(vec![7u8; size])
}

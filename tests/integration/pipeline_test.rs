//! Integration tests for the derivative pipeline.

mod helpers;

use std::sync::atomic::Ordering;

use gallery_core::error::ErrorKind;
use gallery_storage::keys;
use gallery_worker::{PipelineState, TaskOutcome};

use helpers::{TestApp, VIDEO_CEILING, png, video};

#[tokio::test]
async fn test_small_video_gets_thumbnail_and_hls() {
    let app = TestApp::new().await;
    let ctx = app.ctx();

    let (file, report) = app.upload("root", "clip.mp4", "video/mp4", video(1024)).await;
    let report = report.expect("pipeline started");
    assert_eq!(report.state, PipelineState::Done);
    assert_eq!(report.thumbnail, TaskOutcome::Completed);
    assert_eq!(report.hls, TaskOutcome::Completed);
    assert_eq!(app.encoder.probes.load(Ordering::SeqCst), 1);
    assert_eq!(app.encoder.frames.load(Ordering::SeqCst), 1);

    let code = &file.file_code;
    let mut expected = vec![
        keys::thumbnail_key(code),
        keys::hls_playlist_key(code),
        keys::hls_segment_key(code, 0),
        keys::hls_segment_key(code, 1),
    ];
    expected.sort();
    assert_eq!(app.service_keys().await, expected);

    let service = &ctx.bucket.buckets().service;
    assert_eq!(
        app.objects.content_type(service, &keys::hls_playlist_key(code)).await.as_deref(),
        Some(keys::PLAYLIST_CONTENT_TYPE)
    );
    assert_eq!(
        app.objects.content_type(service, &keys::hls_segment_key(code, 0)).await.as_deref(),
        Some(keys::SEGMENT_CONTENT_TYPE)
    );

    let stored = app
        .services
        .files
        .get_file(&ctx, file.id)
        .await
        .expect("file");
    assert!(stored.is_previewable);

    let playlist = app
        .services
        .previews
        .get_master_playlist(&ctx, code)
        .await
        .expect("playlist");
    let playlist = String::from_utf8(playlist.to_vec()).expect("utf8");
    assert!(playlist.contains(&format!("/api/hls/{code}/segments/0")));
    assert!(playlist.contains(&format!("/api/hls/{code}/segments/1")));
    assert!(!playlist.contains("segment-"));
    assert!(!playlist.contains(".ts"));

    let segment = app
        .services
        .previews
        .get_segment(&ctx, code, 1)
        .await
        .expect("segment");
    assert_eq!(&segment[..], b"ts-1");

    let thumbnail = app
        .services
        .previews
        .get_thumbnail(&ctx, code)
        .await
        .expect("thumbnail");
    assert_eq!(image::load_from_memory(&thumbnail).expect("jpeg").height(), 150);

    assert!(app.temp_entries().is_empty(), "temp files left: {:?}", app.temp_entries());
}

#[tokio::test]
async fn test_video_above_ceiling_never_becomes_previewable() {
    let app = TestApp::new().await;
    let ctx = app.ctx();

    let (file, report) = app
        .upload("root", "long.mp4", "video/mp4", video(VIDEO_CEILING as usize + 1))
        .await;
    let report = report.expect("pipeline started");
    assert_eq!(report.state, PipelineState::Done);
    assert_eq!(report.thumbnail, TaskOutcome::Completed);
    assert!(matches!(report.hls, TaskOutcome::Skipped(_)));
    assert_eq!(app.encoder.segmentations.load(Ordering::SeqCst), 0);

    let stored = app.services.files.get_file(&ctx, file.id).await.expect("file");
    assert!(!stored.is_previewable);
    assert_eq!(app.service_keys().await, vec![keys::thumbnail_key(&file.file_code)]);

    let err = app
        .services
        .previews
        .get_master_playlist(&ctx, &file.file_code)
        .await
        .expect_err("no rendition");
    assert!(err.is(ErrorKind::InvalidParam));
}

#[tokio::test]
async fn test_transcode_failure_is_contained() {
    let app = TestApp::new().await;
    app.encoder.fail_segmentation.store(true, Ordering::SeqCst);
    let ctx = app.ctx();

    let (file, report) = app.upload("root", "broken.mp4", "video/mp4", video(100)).await;
    let report = report.expect("pipeline started");
    assert_eq!(report.state, PipelineState::Failed);
    assert_eq!(report.thumbnail, TaskOutcome::Completed);
    assert!(matches!(report.hls, TaskOutcome::Failed(_)));

    let stored = app.services.files.get_file(&ctx, file.id).await.expect("file");
    assert!(!stored.is_previewable);
    assert_eq!(app.service_keys().await, vec![keys::thumbnail_key(&file.file_code)]);

    let err = app
        .services
        .previews
        .get_master_playlist(&ctx, &file.file_code)
        .await
        .expect_err("not ready");
    assert!(err.is(ErrorKind::ResourceNotReady));
    assert!(app.temp_entries().is_empty());

    // A manual retry succeeds once the encoder recovers.
    app.encoder.fail_segmentation.store(false, Ordering::SeqCst);
    let report = app
        .services
        .previews
        .regenerate(&ctx, file.id)
        .await
        .expect("regenerate");
    assert_eq!(report.state, PipelineState::Done);
    let stored = app.services.files.get_file(&ctx, file.id).await.expect("file");
    assert!(stored.is_previewable);
    assert_eq!(app.db.thumbnail_count().await, 1);
}

#[tokio::test]
async fn test_non_media_files_skip_the_pipeline() {
    let app = TestApp::new().await;
    let (file, report) = app.upload("root", "doc.pdf", "application/pdf", "pdf".into()).await;
    assert!(report.is_none());
    assert!(app.service_keys().await.is_empty());

    let err = app
        .services
        .previews
        .get_thumbnail(&app.ctx(), &file.file_code)
        .await
        .expect_err("no thumbnail for pdf");
    assert!(err.is(ErrorKind::InvalidParam));

    let err = app
        .services
        .previews
        .regenerate(&app.ctx(), file.id)
        .await
        .expect_err("no derivatives");
    assert!(err.is(ErrorKind::InvalidParam));
}

#[tokio::test]
async fn test_disabled_pipeline_spawns_nothing() {
    let app = TestApp::with_pipeline(|p| p.enabled = false).await;
    let (file, report) = app.upload("root", "a.png", "image/png", png(8, 8)).await;
    assert!(report.is_none());
    assert!(file.is_previewable);
    assert!(app.service_keys().await.is_empty());
}

#[tokio::test]
async fn test_concurrent_uploads_share_a_single_permit() {
    let app = TestApp::with_pipeline(|p| p.max_concurrent = 1).await;
    let ctx = app.ctx();

    let mut handles = Vec::new();
    for i in 0..4 {
        let (_, handle) = app
            .services
            .uploads
            .process_upload(
                &ctx,
                "root",
                helpers::part(&format!("p{i}.png"), "image/png", png(20 + i, 10)),
            )
            .await
            .expect("upload");
        handles.push(handle.expect("pipeline started"));
    }

    for handle in handles {
        let report = handle.await.expect("join");
        assert_eq!(report.state, PipelineState::Done);
    }
    assert_eq!(app.db.thumbnail_count().await, 4);
    assert!(app.temp_entries().is_empty());
}

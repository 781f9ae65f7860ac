//! Integration tests for permanent deletion.

mod helpers;

use gallery_core::error::ErrorKind;
use gallery_storage::keys;
use gallery_worker::PipelineState;

use helpers::{TestApp, png, video};

#[tokio::test]
async fn test_purge_returns_every_descendant_and_removes_all_blobs() {
    let app = TestApp::new().await;
    let ctx = app.ctx();

    // Survives the purge.
    let (keeper, _) = app.upload("root", "keeper.png", "image/png", png(10, 10)).await;

    let a = app.create_folder("root", "A").await;
    let b = app.create_folder(a.code_or_empty(), "B").await;
    let c = app.create_folder(b.code_or_empty(), "C").await;

    let (img, report) = app.upload(a.code_or_empty(), "a.png", "image/png", png(30, 20)).await;
    assert_eq!(report.expect("image pipeline").state, PipelineState::Done);
    let (clip, report) = app.upload(b.code_or_empty(), "clip.mp4", "video/mp4", video(512)).await;
    assert_eq!(report.expect("video pipeline").state, PipelineState::Done);
    let (doc, report) = app.upload(c.code_or_empty(), "notes.txt", "text/plain", "hi".into()).await;
    assert!(report.is_none());
    let (trashed, _) = app.upload(a.code_or_empty(), "old.png", "image/png", png(5, 5)).await;
    app.services
        .files
        .delete_file_temp(&ctx, trashed.id)
        .await
        .expect("trash file");
    app.services
        .folders
        .delete_folder_temp(&ctx, c.code_or_empty())
        .await
        .expect("trash C");

    assert!(app.service_keys().await.contains(&keys::hls_playlist_key(&clip.file_code)));

    let deleted = app
        .services
        .folders
        .delete_folder_permanent(&ctx, a.code_or_empty())
        .await
        .expect("purge");

    let mut files = deleted.deleted_files.clone();
    files.sort();
    let mut expected = vec![
        img.file_code.clone(),
        clip.file_code.clone(),
        doc.file_code.clone(),
        trashed.file_code.clone(),
    ];
    expected.sort();
    assert_eq!(files, expected);

    let mut folders = deleted.deleted_folders.clone();
    folders.sort();
    let mut expected_folders = vec![
        a.code_or_empty().to_string(),
        b.code_or_empty().to_string(),
        c.code_or_empty().to_string(),
    ];
    expected_folders.sort();
    assert_eq!(folders, expected_folders);
    // Children are removed before their parents.
    assert_eq!(deleted.deleted_folders.last().map(String::as_str), Some(a.code_or_empty()));

    assert_eq!(app.primary_keys().await, vec![keys::primary_key(&keeper.file_code)]);
    assert_eq!(app.service_keys().await, vec![keys::thumbnail_key(&keeper.file_code)]);
    assert_eq!(app.db.folder_count().await, 1);
    assert_eq!(app.db.file_count().await, 1);
    assert_eq!(app.db.thumbnail_count().await, 1);

    let root = app
        .services
        .folders
        .list_folders(&ctx, "root")
        .await
        .expect("root");
    assert!(root.folders.is_empty());
    assert!(!root.folder.has_child);
}

#[tokio::test]
async fn test_purge_of_trashed_folder() {
    let app = TestApp::new().await;
    let ctx = app.ctx();
    let a = app.create_folder("root", "A").await;
    app.upload_only(a.code_or_empty(), "f.bin", "application/octet-stream", "x".into())
        .await;
    app.services
        .folders
        .delete_folder_temp(&ctx, a.code_or_empty())
        .await
        .expect("trash");

    let deleted = app
        .services
        .folders
        .delete_folder_permanent(&ctx, a.code_or_empty())
        .await
        .expect("purge");
    assert_eq!(deleted.deleted_files.len(), 1);
    assert!(app.primary_keys().await.is_empty());

    let trash = app
        .services
        .folders
        .list_trash_folders(&ctx)
        .await
        .expect("trash");
    assert!(trash.is_empty());
}

#[tokio::test]
async fn test_purge_rejects_root_and_unknown_codes() {
    let app = TestApp::new().await;

    let err = app
        .services
        .folders
        .delete_folder_permanent(&app.ctx(), "root")
        .await
        .expect_err("root");
    assert!(err.is(ErrorKind::InvalidParam));

    let err = app
        .services
        .folders
        .delete_folder_permanent(&app.ctx(), "nope")
        .await
        .expect_err("unknown");
    assert!(err.is(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_storage_failure_aborts_and_retry_completes() {
    let app = TestApp::new().await;
    let ctx = app.ctx();
    let a = app.create_folder("root", "A").await;
    let b = app.create_folder(a.code_or_empty(), "B").await;
    app.upload(a.code_or_empty(), "a.png", "image/png", png(6, 6)).await;
    app.upload(b.code_or_empty(), "b.png", "image/png", png(6, 6)).await;

    app.objects.set_fail_removals(true);
    let err = app
        .services
        .folders
        .delete_folder_permanent(&ctx, a.code_or_empty())
        .await
        .expect_err("removal failure");
    assert!(err.is(ErrorKind::Storage));
    assert!(err.kind.is_server_error());

    // Nothing above the failing folder was touched.
    app.services
        .folders
        .list_folders(&ctx, a.code_or_empty())
        .await
        .expect("A survives the aborted walk");

    app.objects.set_fail_removals(false);
    let deleted = app
        .services
        .folders
        .delete_folder_permanent(&ctx, a.code_or_empty())
        .await
        .expect("retry");
    assert!(deleted.deleted_folders.contains(&a.code_or_empty().to_string()));
    assert_eq!(app.db.folder_count().await, 1);
    assert_eq!(app.db.file_count().await, 0);
}

#[tokio::test]
async fn test_delete_file_permanent_removes_every_blob() {
    let app = TestApp::new().await;
    let ctx = app.ctx();
    let (clip, report) = app.upload("root", "clip.mp4", "video/mp4", video(256)).await;
    assert_eq!(report.expect("pipeline").state, PipelineState::Done);
    assert_eq!(app.service_keys().await.len(), 4);

    let code = app
        .services
        .files
        .delete_file_permanent(&ctx, clip.id)
        .await
        .expect("delete");
    assert_eq!(code, clip.file_code);

    assert!(app.primary_keys().await.is_empty());
    assert!(app.service_keys().await.is_empty());
    assert_eq!(app.db.thumbnail_count().await, 0);
    assert_eq!(app.db.file_count().await, 0);

    // Already gone.
    let err = app
        .services
        .files
        .delete_file_permanent(&ctx, clip.id)
        .await
        .expect_err("second delete");
    assert!(err.is(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_empty_trash_can_only_removes_trashed_files() {
    let app = TestApp::new().await;
    let ctx = app.ctx();
    let (keep, _) = app.upload("root", "keep.png", "image/png", png(4, 4)).await;
    let (gone1, _) = app.upload("root", "gone1.png", "image/png", png(4, 4)).await;
    let gone2 = app.upload_only("root", "gone2.txt", "text/plain", "x".into()).await;

    for id in [gone1.id, gone2.id] {
        app.services
            .files
            .delete_file_temp(&ctx, id)
            .await
            .expect("trash");
    }

    let mut removed = app
        .services
        .files
        .empty_trash_can(&ctx)
        .await
        .expect("empty");
    removed.sort();
    let mut expected = vec![gone1.file_code.clone(), gone2.file_code.clone()];
    expected.sort();
    assert_eq!(removed, expected);

    assert_eq!(app.primary_keys().await, vec![keys::primary_key(&keep.file_code)]);
    assert_eq!(app.service_keys().await, vec![keys::thumbnail_key(&keep.file_code)]);
    let trash = app
        .services
        .files
        .list_trashcan_files(&ctx)
        .await
        .expect("trash");
    assert!(trash.is_empty());
}

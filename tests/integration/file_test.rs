//! Integration tests for file records, uploads and presigned access.

mod helpers;

use std::sync::Arc;

use async_trait::async_trait;

use gallery_core::error::{AppError, ErrorKind};
use gallery_core::result::AppResult;
use gallery_database::{FileStore, MemoryStore};
use gallery_entity::Scope;
use gallery_entity::file::{CreateFile, File, FileListFilter, FilePatch, FileUpdate, Thumbnail};
use gallery_service::UploadService;
use gallery_storage::keys;

use helpers::{TestApp, part, png, video};

/// Delegates to a [`MemoryStore`] but rejects every insert.
#[derive(Debug)]
struct RejectingInserts(Arc<MemoryStore>);

#[async_trait]
impl FileStore for RejectingInserts {
    async fn find_by_id(&self, user_id: i64, id: i64, scope: Scope) -> AppResult<Option<File>> {
        FileStore::find_by_id(self.0.as_ref(), user_id, id, scope).await
    }

    async fn find_by_code(&self, user_id: i64, code: &str, scope: Scope) -> AppResult<Option<File>> {
        FileStore::find_by_code(self.0.as_ref(), user_id, code, scope).await
    }

    async fn list_in_folders(&self, user_id: i64, folder_ids: &[i64], scope: Scope) -> AppResult<Vec<File>> {
        self.0.list_in_folders(user_id, folder_ids, scope).await
    }

    async fn list(&self, user_id: i64, filter: FileListFilter) -> AppResult<Vec<File>> {
        self.0.list(user_id, filter).await
    }

    async fn insert(&self, _data: &CreateFile) -> AppResult<File> {
        Err(AppError::database("insert rejected"))
    }

    async fn update(&self, file: &File) -> AppResult<File> {
        FileStore::update(self.0.as_ref(), file).await
    }

    async fn set_previewable(&self, id: i64, previewable: bool) -> AppResult<bool> {
        self.0.set_previewable(id, previewable).await
    }

    async fn soft_delete(&self, user_id: i64, id: i64) -> AppResult<bool> {
        FileStore::soft_delete(self.0.as_ref(), user_id, id).await
    }

    async fn restore(&self, user_id: i64, id: i64) -> AppResult<bool> {
        FileStore::restore(self.0.as_ref(), user_id, id).await
    }

    async fn delete_many(&self, user_id: i64, ids: &[i64]) -> AppResult<u64> {
        self.0.delete_many(user_id, ids).await
    }

    async fn find_thumbnail(&self, file_id: i64) -> AppResult<Option<Thumbnail>> {
        self.0.find_thumbnail(file_id).await
    }

    async fn find_thumbnails(&self, file_ids: &[i64]) -> AppResult<Vec<Thumbnail>> {
        self.0.find_thumbnails(file_ids).await
    }

    async fn upsert_thumbnail(&self, file_id: i64, file_path: &str) -> AppResult<Thumbnail> {
        self.0.upsert_thumbnail(file_id, file_path).await
    }

    async fn delete_thumbnails(&self, ids: &[i64]) -> AppResult<u64> {
        self.0.delete_thumbnails(ids).await
    }
}

#[tokio::test]
async fn test_image_upload_is_previewable_and_thumbnail_follows_pipeline() {
    let app = TestApp::new().await;
    let ctx = app.ctx();

    let file = app
        .upload_only("root", "photo.png", "image/png", png(300, 200))
        .await;
    assert!(file.is_previewable);
    assert_eq!(file.file_type, "image/png");
    assert_eq!(app.primary_keys().await, vec![keys::primary_key(&file.file_code)]);

    let err = app
        .services
        .previews
        .get_thumbnail(&ctx, &file.file_code)
        .await
        .expect_err("pipeline has not run");
    assert!(err.is(ErrorKind::ResourceNotReady));

    let report = app
        .services
        .previews
        .regenerate(&ctx, file.id)
        .await
        .expect("pipeline");
    assert_eq!(report.state, gallery_worker::PipelineState::Done);

    let jpeg = app
        .services
        .previews
        .get_thumbnail(&ctx, &file.file_code)
        .await
        .expect("thumbnail");
    let decoded = image::load_from_memory(&jpeg).expect("jpeg");
    assert_eq!(decoded.height(), 150);
    assert_eq!(decoded.width(), 225);
}

#[tokio::test]
async fn test_upload_row_matches_payload() {
    let app = TestApp::new().await;
    let folder = app.create_folder("root", "Docs").await;
    let payload = bytes::Bytes::from_static(b"plain text body");

    let (file, data) = app
        .services
        .uploads
        .upload_file(&app.ctx(), folder.code_or_empty(), part(" notes.txt ", "text/plain", payload.clone()))
        .await
        .expect("upload");

    assert_eq!(data, payload);
    assert_eq!(file.file_name, "notes.txt");
    assert_eq!(file.file_size, payload.len() as i64);
    assert_eq!(file.folder_id, folder.id);
    assert!(!file.is_previewable);

    let stored = app
        .objects
        .content_type(&app.ctx().bucket.buckets().primary, &file.file_code)
        .await;
    assert_eq!(stored.as_deref(), Some("text/plain"));
}

#[tokio::test]
async fn test_video_upload_is_not_previewable_until_transcoded() {
    let app = TestApp::new().await;
    let file = app.upload_only("root", "clip.mp4", "video/mp4", video(64)).await;
    assert!(!file.is_previewable);
}

#[tokio::test]
async fn test_upload_validation() {
    let app = TestApp::new().await;
    let ctx = app.ctx();

    let err = app
        .services
        .uploads
        .upload_file(&ctx, "no-such-folder", part("a.png", "image/png", png(2, 2)))
        .await
        .expect_err("unknown folder");
    assert!(err.is(ErrorKind::NotFound));

    let small = UploadService::new(app.db.clone(), app.db.clone(), app.services.pipeline.clone(), 4);
    let err = small
        .upload_file(&ctx, "root", part("big.bin", "application/octet-stream", video(5)))
        .await
        .expect_err("too large");
    assert!(err.is(ErrorKind::InvalidParam));

    assert!(app.primary_keys().await.is_empty());
}

#[tokio::test]
async fn test_failed_insert_removes_the_blob() {
    let app = TestApp::new().await;
    let rejecting = Arc::new(RejectingInserts(app.db.clone()));
    let uploads = UploadService::new(app.db.clone(), rejecting, app.services.pipeline.clone(), 1 << 20);

    let err = uploads
        .upload_file(&app.ctx(), "root", part("a.png", "image/png", png(4, 4)))
        .await
        .expect_err("insert rejected");
    assert!(err.is(ErrorKind::Database));
    assert!(app.primary_keys().await.is_empty());
    assert_eq!(app.db.file_count().await, 0);
}

#[tokio::test]
async fn test_favorite_and_trash_filters_are_exclusive() {
    let app = TestApp::new().await;
    let err = app
        .services
        .files
        .list_files(
            &app.ctx(),
            FileListFilter {
                is_favorite: true,
                is_trash: true,
            },
        )
        .await
        .expect_err("both filters");
    assert!(err.is(ErrorKind::InvalidParam));
}

#[tokio::test]
async fn test_patch_renames_favorites_and_moves() {
    let app = TestApp::new().await;
    let ctx = app.ctx();
    let target = app.create_folder("root", "Target").await;
    let file = app.upload_only("root", "a.txt", "text/plain", "a".into()).await;

    let patched = app
        .services
        .files
        .patch_file(
            &ctx,
            file.id,
            FilePatch {
                file_name: Some("b.txt".into()),
                folder_code: Some(target.code_or_empty().to_string()),
                is_favorite: Some(true),
                restore: false,
            },
        )
        .await
        .expect("patch");
    assert_eq!(patched.file_name, "b.txt");
    assert_eq!(patched.folder_id, target.id);
    assert!(patched.is_favorite);
    assert_eq!(patched.file_code, file.file_code);

    let favorites = app
        .services
        .files
        .list_favorite_files(&ctx)
        .await
        .expect("favorites");
    assert_eq!(favorites.len(), 1);

    let in_target = app
        .services
        .folders
        .fetch_folder_files(&ctx, target.code_or_empty())
        .await
        .expect("folder files");
    assert_eq!(in_target.len(), 1);
    let in_root = app
        .services
        .folders
        .fetch_folder_files(&ctx, "root")
        .await
        .expect("root files");
    assert!(in_root.is_empty());
}

#[tokio::test]
async fn test_update_requires_a_name_and_can_restore() {
    let app = TestApp::new().await;
    let ctx = app.ctx();
    let file = app.upload_only("root", "a.txt", "text/plain", "a".into()).await;

    let err = app
        .services
        .files
        .update_file(
            &ctx,
            file.id,
            FileUpdate {
                file_name: "  ".into(),
                is_favorite: false,
                restore: false,
            },
        )
        .await
        .expect_err("empty name");
    assert!(err.is(ErrorKind::InvalidParam));

    app.services
        .files
        .delete_file_temp(&ctx, file.id)
        .await
        .expect("trash");
    assert_eq!(
        app.services
            .files
            .list_trashcan_files(&ctx)
            .await
            .expect("trash")
            .len(),
        1
    );

    let updated = app
        .services
        .files
        .update_file(
            &ctx,
            file.id,
            FileUpdate {
                file_name: "renamed.txt".into(),
                is_favorite: true,
                restore: true,
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.file_name, "renamed.txt");
    assert!(updated.is_favorite);
    assert!(!updated.is_deleted());
    assert!(
        app.services
            .files
            .list_trashcan_files(&ctx)
            .await
            .expect("trash")
            .is_empty()
    );
}

#[tokio::test]
async fn test_presigned_url_is_an_attachment() {
    let app = TestApp::new().await;
    let ctx = app.ctx();
    let file = app.upload_only("root", "readme.txt", "text/plain", "hello".into()).await;

    let url = app
        .services
        .downloads
        .presigned_url(&ctx, &file.file_code)
        .await
        .expect("url");

    let bucket = &ctx.bucket.buckets().primary;
    assert!(url.starts_with(&format!("http://objects.test/{bucket}/{}", file.file_code)));
    assert!(url.contains("X-Gallery-Expires="));
    assert!(url.contains("response-content-disposition=attachment"));
    assert!(url.contains("readme.txt"));
    assert!(url.contains("response-content-type=text%2Fplain%3B+charset%3Dutf-8"));

    let err = app
        .services
        .downloads
        .presigned_url(&ctx, "missing")
        .await
        .expect_err("missing");
    assert!(err.is(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_trashed_file_is_only_patched_through_restore() {
    let app = TestApp::new().await;
    let ctx = app.ctx();
    let file = app.upload_only("root", "a.txt", "text/plain", "a".into()).await;
    app.services
        .files
        .delete_file_temp(&ctx, file.id)
        .await
        .expect("trash");

    let err = app
        .services
        .files
        .patch_file(
            &ctx,
            file.id,
            FilePatch {
                is_favorite: Some(true),
                ..FilePatch::default()
            },
        )
        .await
        .expect_err("trashed file");
    assert!(err.is(ErrorKind::NotFound));

    let err = app
        .services
        .files
        .update_file(
            &ctx,
            file.id,
            FileUpdate {
                file_name: "b.txt".into(),
                is_favorite: false,
                restore: false,
            },
        )
        .await
        .expect_err("trashed file");
    assert!(err.is(ErrorKind::NotFound));

    let stored = app.services.files.get_file(&ctx, file.id).await.expect("file");
    assert!(stored.is_deleted());
    assert!(!stored.is_favorite);
}

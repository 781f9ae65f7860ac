//! File listing, updates, trash and permanent deletion.

use std::sync::Arc;

use tracing::info;

use gallery_core::error::AppError;
use gallery_core::result::AppResult;
use gallery_database::{FileStore, FolderStore};
use gallery_entity::Scope;
use gallery_entity::file::{File, FileListFilter, FilePatch, FileUpdate};
use gallery_storage::keys;

use crate::cleanup::derivative_keys;
use crate::context::RequestContext;
use crate::folder::hierarchy::{resolve_folder, restore_upwards};
use crate::lock::SubtreeLocks;

/// Manages file records and their blobs.
#[derive(Debug, Clone)]
pub struct FileService {
    folders: Arc<dyn FolderStore>,
    files: Arc<dyn FileStore>,
    locks: SubtreeLocks,
}

impl FileService {
    pub fn new(folders: Arc<dyn FolderStore>, files: Arc<dyn FileStore>, locks: SubtreeLocks) -> Self {
        Self {
            folders,
            files,
            locks,
        }
    }

    /// Favorites or trash, per the filter. Both at once is rejected.
    pub async fn list_files(&self, ctx: &RequestContext, filter: FileListFilter) -> AppResult<Vec<File>> {
        if filter.is_favorite && filter.is_trash {
            return Err(AppError::invalid_param(
                "Favorite and trash listings cannot be combined",
            ));
        }
        self.files.list(ctx.user_id, filter).await
    }

    pub async fn list_favorite_files(&self, ctx: &RequestContext) -> AppResult<Vec<File>> {
        self.list_files(
            ctx,
            FileListFilter {
                is_favorite: true,
                is_trash: false,
            },
        )
        .await
    }

    pub async fn list_trashcan_files(&self, ctx: &RequestContext) -> AppResult<Vec<File>> {
        self.list_files(
            ctx,
            FileListFilter {
                is_favorite: false,
                is_trash: true,
            },
        )
        .await
    }

    /// A file by id, trashed or not.
    pub async fn get_file(&self, ctx: &RequestContext, file_id: i64) -> AppResult<File> {
        self.files
            .find_by_id(ctx.user_id, file_id, Scope::WithDeleted)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File not found: {file_id}")))
    }

    /// Full update: every field of `update` is applied.
    pub async fn update_file(&self, ctx: &RequestContext, file_id: i64, update: FileUpdate) -> AppResult<File> {
        let name = update.file_name.trim();
        if name.is_empty() {
            return Err(AppError::invalid_param("File name cannot be empty"));
        }

        let mut file = self.find_for_update(ctx, file_id, update.restore).await?;
        file.file_name = name.to_string();
        file.is_favorite = update.is_favorite;
        let file = self.files.update(&file).await?;

        if update.restore {
            return self.restore_file(ctx, file).await;
        }
        Ok(file)
    }

    /// Partial update: rename, favorite flag, move to another folder and
    /// restore. A restore also restores every trashed ancestor folder.
    pub async fn patch_file(&self, ctx: &RequestContext, file_id: i64, patch: FilePatch) -> AppResult<File> {
        let mut file = self.find_for_update(ctx, file_id, patch.restore).await?;

        if patch.file_name.is_some() {
            let name = patch
                .effective_name()
                .ok_or_else(|| AppError::invalid_param("File name cannot be empty"))?;
            file.file_name = name.to_string();
        }
        if let Some(is_favorite) = patch.is_favorite {
            file.is_favorite = is_favorite;
        }
        if let Some(folder_code) = patch.folder_code.as_deref() {
            let target =
                resolve_folder(self.folders.as_ref(), ctx.user_id, folder_code, Scope::Active).await?;
            if target.id != file.folder_id {
                info!(
                    user_id = ctx.user_id,
                    file_id,
                    from = file.folder_id,
                    to = target.id,
                    "File moved"
                );
                file.folder_id = target.id;
            }
        }

        let file = self.files.update(&file).await?;

        if patch.restore {
            return self.restore_file(ctx, file).await;
        }
        Ok(file)
    }

    /// Move a file to the trash.
    pub async fn delete_file_temp(&self, ctx: &RequestContext, file_id: i64) -> AppResult<File> {
        let file = self
            .files
            .find_by_id(ctx.user_id, file_id, Scope::Active)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File not found: {file_id}")))?;

        self.files.soft_delete(ctx.user_id, file.id).await?;
        info!(user_id = ctx.user_id, file_id, code = %file.file_code, "File moved to trash");
        self.get_file(ctx, file_id).await
    }

    /// Remove a file, its thumbnail, its HLS rendition and its primary blob.
    /// Returns the removed file code.
    pub async fn delete_file_permanent(&self, ctx: &RequestContext, file_id: i64) -> AppResult<String> {
        let _guard = self.locks.acquire(ctx.user_id).await;
        let file = self.get_file(ctx, file_id).await?;
        self.purge_file(ctx, &file).await?;
        Ok(file.file_code)
    }

    /// Permanently delete every trashed file. Returns the removed codes.
    pub async fn empty_trash_can(&self, ctx: &RequestContext) -> AppResult<Vec<String>> {
        let _guard = self.locks.acquire(ctx.user_id).await;
        let trashed = self
            .files
            .list(
                ctx.user_id,
                FileListFilter {
                    is_favorite: false,
                    is_trash: true,
                },
            )
            .await?;

        let mut removed = Vec::with_capacity(trashed.len());
        for file in &trashed {
            self.purge_file(ctx, file).await?;
            removed.push(file.file_code.clone());
        }

        info!(user_id = ctx.user_id, count = removed.len(), "Trash emptied");
        Ok(removed)
    }

    async fn purge_file(&self, ctx: &RequestContext, file: &File) -> AppResult<()> {
        let thumbnail = self.files.find_thumbnail(file.id).await?;
        let service_keys = derivative_keys(&ctx.bucket, file, thumbnail.as_ref()).await?;

        if let Some(thumb) = &thumbnail {
            self.files.delete_thumbnails(&[thumb.id]).await?;
        }
        ctx.bucket.remove_service_many(&service_keys).await?;
        self.files.delete_many(ctx.user_id, &[file.id]).await?;
        ctx.bucket
            .remove_primary(&keys::primary_key(&file.file_code))
            .await?;

        info!(
            user_id = ctx.user_id,
            file_id = file.id,
            code = %file.file_code,
            derivatives = service_keys.len(),
            "File permanently deleted"
        );
        Ok(())
    }

    /// Trashed files are only editable as part of a restore.
    async fn find_for_update(&self, ctx: &RequestContext, file_id: i64, restore: bool) -> AppResult<File> {
        let scope = if restore { Scope::WithDeleted } else { Scope::Active };
        self.files
            .find_by_id(ctx.user_id, file_id, scope)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File not found: {file_id}")))
    }

    async fn restore_file(&self, ctx: &RequestContext, file: File) -> AppResult<File> {
        let _guard = self.locks.acquire(ctx.user_id).await;
        self.files.restore(ctx.user_id, file.id).await?;
        restore_upwards(self.folders.as_ref(), ctx.user_id, file.folder_id).await?;
        info!(user_id = ctx.user_id, file_id = file.id, "File restored");
        self.get_file(ctx, file.id).await
    }
}

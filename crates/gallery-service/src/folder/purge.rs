//! Permanent folder deletion.
//!
//! The whole subtree (trashed rows included) is loaded into a
//! [`FolderArena`] and walked children-first. For each folder: thumbnail
//! rows, then file rows, then every blob of those files, then the folder row
//! itself. An object-store failure aborts the walk; whatever was removed
//! stays removed, and a retry skips rows and keys that are already gone.

use std::collections::HashMap;

use tracing::{info, warn};

use gallery_core::error::AppError;
use gallery_core::result::AppResult;
use gallery_core::types::FolderRef;
use gallery_entity::Scope;
use gallery_entity::file::{File, Thumbnail};
use gallery_entity::folder::{DeletedFilesAndFoldersList, Folder, FolderArena};
use gallery_storage::keys;

use crate::cleanup::derivative_keys;
use crate::context::RequestContext;

use super::hierarchy::refresh_has_child;
use super::service::FolderService;

impl FolderService {
    /// Remove a folder, its descendants, their files and every blob they
    /// own. Returns the codes of every removed file and folder.
    pub async fn delete_folder_permanent(
        &self,
        ctx: &RequestContext,
        folder_code: &str,
    ) -> AppResult<DeletedFilesAndFoldersList> {
        let code = match FolderRef::parse(folder_code) {
            FolderRef::Root => return Err(AppError::invalid_param("The root folder cannot be deleted")),
            FolderRef::Code(code) => code,
        };

        let _guard = self.locks.acquire(ctx.user_id).await;

        let folder = self
            .folders
            .find_by_code(ctx.user_id, code, Scope::WithDeleted)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder not found: {code}")))?;
        if folder.is_root() {
            return Err(AppError::invalid_param("The root folder cannot be deleted"));
        }
        let parent_id = folder.parent_id;

        let arena = self.load_subtree(ctx.user_id, folder).await?;
        let thumbnails = self.load_thumbnails(&arena).await?;

        info!(
            user_id = ctx.user_id,
            code,
            folders = arena.len(),
            files = arena.file_count(),
            "Permanently deleting folder subtree"
        );

        let mut deleted = DeletedFilesAndFoldersList::default();
        for id in arena.post_order() {
            let Some(node) = arena.get(id) else {
                continue;
            };
            self.purge_files(ctx, &node.files, &thumbnails).await?;
            self.folders.delete(ctx.user_id, id).await?;

            deleted
                .deleted_files
                .extend(node.files.iter().map(|f| f.file_code.clone()));
            deleted
                .deleted_folders
                .push(node.folder.code_or_empty().to_string());
        }

        if let Some(parent_id) = parent_id {
            refresh_has_child(self.folders.as_ref(), ctx.user_id, parent_id).await?;
        }

        info!(
            user_id = ctx.user_id,
            code,
            files = deleted.deleted_files.len(),
            folders = deleted.deleted_folders.len(),
            "Folder subtree deleted"
        );
        Ok(deleted)
    }

    async fn load_subtree(&self, user_id: i64, folder: Folder) -> AppResult<FolderArena> {
        let root_id = folder.id;
        let subtree = self.folders.find_subtree(user_id, root_id).await?;

        let mut arena = FolderArena::new(folder);
        for descendant in subtree.into_iter().filter(|f| f.id != root_id) {
            let id = descendant.id;
            if !arena.attach_folder(descendant) {
                warn!(user_id, folder_id = id, "Skipping folder with unreachable parent");
            }
        }

        let ids = arena.post_order();
        let files = self
            .files
            .list_in_folders(user_id, &ids, Scope::WithDeleted)
            .await?;

        let mut by_folder: HashMap<i64, Vec<File>> = HashMap::new();
        for file in files {
            by_folder.entry(file.folder_id).or_default().push(file);
        }
        for (folder_id, files) in by_folder {
            arena.attach_files(folder_id, files);
        }

        Ok(arena)
    }

    async fn load_thumbnails(&self, arena: &FolderArena) -> AppResult<HashMap<i64, Thumbnail>> {
        let file_ids: Vec<i64> = arena
            .post_order()
            .into_iter()
            .filter_map(|id| arena.get(id))
            .flat_map(|node| node.files.iter().map(|f| f.id))
            .collect();

        let thumbnails = self.files.find_thumbnails(&file_ids).await?;
        Ok(thumbnails.into_iter().map(|t| (t.file_id, t)).collect())
    }

    /// Remove the rows and blobs of the files directly inside one folder.
    async fn purge_files(
        &self,
        ctx: &RequestContext,
        files: &[File],
        thumbnails: &HashMap<i64, Thumbnail>,
    ) -> AppResult<()> {
        if files.is_empty() {
            return Ok(());
        }

        let mut thumbnail_ids = Vec::new();
        let mut service_keys = Vec::new();
        let mut primary_keys = Vec::with_capacity(files.len());
        for file in files {
            let thumbnail = thumbnails.get(&file.id);
            if let Some(thumb) = thumbnail {
                thumbnail_ids.push(thumb.id);
            }
            service_keys.extend(derivative_keys(&ctx.bucket, file, thumbnail).await?);
            primary_keys.push(keys::primary_key(&file.file_code));
        }
        let file_ids: Vec<i64> = files.iter().map(|f| f.id).collect();

        self.files.delete_thumbnails(&thumbnail_ids).await?;
        self.files.delete_many(ctx.user_id, &file_ids).await?;
        ctx.bucket.remove_service_many(&service_keys).await?;
        ctx.bucket.remove_primary_many(&primary_keys).await?;
        Ok(())
    }
}

//! Folder CRUD, listing and soft delete.

use std::sync::Arc;

use tracing::{info, warn};

use gallery_core::error::{AppError, ErrorKind};
use gallery_core::result::AppResult;
use gallery_core::types::{FolderRef, generate_folder_code};
use gallery_database::{FileStore, FolderStore};
use gallery_entity::Scope;
use gallery_entity::file::File;
use gallery_entity::folder::{CreateFolder, Folder, FolderListing, FolderPatch};

use crate::context::RequestContext;
use crate::lock::SubtreeLocks;

use super::hierarchy::{breadcrumb, refresh_has_child, resolve_folder, restore_upwards};

/// Attempts at drawing an unused folder code before giving up.
const MAX_CODE_ATTEMPTS: usize = 3;

/// Manages the folder tree of every user.
#[derive(Debug, Clone)]
pub struct FolderService {
    pub(crate) folders: Arc<dyn FolderStore>,
    pub(crate) files: Arc<dyn FileStore>,
    pub(crate) locks: SubtreeLocks,
}

impl FolderService {
    pub fn new(folders: Arc<dyn FolderStore>, files: Arc<dyn FileStore>, locks: SubtreeLocks) -> Self {
        Self {
            folders,
            files,
            locks,
        }
    }

    /// Return the user's root folder, creating it on first use.
    pub async fn ensure_root(&self, ctx: &RequestContext) -> AppResult<Folder> {
        if let Some(root) = self.folders.find_root(ctx.user_id).await? {
            return Ok(root);
        }

        match self.folders.insert(&CreateFolder::root(ctx.user_id)).await {
            Ok(root) => {
                info!(user_id = ctx.user_id, folder_id = root.id, "Root folder created");
                Ok(root)
            }
            // Lost a race against another first request.
            Err(e) if e.is(ErrorKind::Conflict) => self
                .folders
                .find_root(ctx.user_id)
                .await?
                .ok_or_else(|| AppError::internal("Root folder vanished after conflict")),
            Err(e) => Err(e),
        }
    }

    /// Children of a folder plus its breadcrumb.
    ///
    /// The target itself may be trashed; only active children are listed.
    pub async fn list_folders(&self, ctx: &RequestContext, folder_code: &str) -> AppResult<FolderListing> {
        let folder =
            resolve_folder(self.folders.as_ref(), ctx.user_id, folder_code, Scope::WithDeleted).await?;
        let hierarchy = breadcrumb(self.folders.as_ref(), &folder).await?;
        let folders = self
            .folders
            .list_children(ctx.user_id, folder.id, Scope::Active)
            .await?;

        Ok(FolderListing {
            folder,
            hierarchy,
            folders,
        })
    }

    pub async fn list_favorite_folders(&self, ctx: &RequestContext) -> AppResult<Vec<Folder>> {
        self.folders.list_favorites(ctx.user_id).await
    }

    pub async fn list_trash_folders(&self, ctx: &RequestContext) -> AppResult<Vec<Folder>> {
        self.folders.list_trashed(ctx.user_id).await
    }

    /// Active files directly inside a folder.
    pub async fn fetch_folder_files(&self, ctx: &RequestContext, folder_code: &str) -> AppResult<Vec<File>> {
        let folder =
            resolve_folder(self.folders.as_ref(), ctx.user_id, folder_code, Scope::WithDeleted).await?;
        self.files
            .list_in_folders(ctx.user_id, &[folder.id], Scope::Active)
            .await
    }

    /// Create a folder named `name` under `parent_code`.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        parent_code: &str,
        name: &str,
    ) -> AppResult<Folder> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::invalid_param("Folder name cannot be empty"));
        }

        let parent =
            resolve_folder(self.folders.as_ref(), ctx.user_id, parent_code, Scope::Active).await?;

        let mut attempt = 0;
        let folder = loop {
            attempt += 1;
            let data = CreateFolder {
                user_id: ctx.user_id,
                parent_id: Some(parent.id),
                name: name.to_string(),
                code: Some(generate_folder_code()),
            };
            match self.folders.insert(&data).await {
                Ok(folder) => break folder,
                Err(e) if e.is(ErrorKind::Conflict) && attempt < MAX_CODE_ATTEMPTS => {
                    warn!(user_id = ctx.user_id, attempt, "Folder code collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        };

        if !parent.has_child {
            self.folders
                .set_has_child(ctx.user_id, parent.id, true)
                .await?;
        }

        info!(
            user_id = ctx.user_id,
            folder_id = folder.id,
            code = folder.code_or_empty(),
            parent_id = parent.id,
            "Folder created"
        );
        Ok(folder)
    }

    /// Partial update: rename, favorite flag, move and restore.
    ///
    /// Trashed folders are only found when the patch restores them. A
    /// restore also restores every trashed ancestor.
    pub async fn patch_folder(
        &self,
        ctx: &RequestContext,
        folder_code: &str,
        patch: FolderPatch,
    ) -> AppResult<Folder> {
        let structural = patch.restore || patch.parent_folder_code.is_some();
        let _guard = if structural {
            Some(self.locks.acquire(ctx.user_id).await)
        } else {
            None
        };

        let scope = if patch.restore { Scope::WithDeleted } else { Scope::Active };
        let mut folder = resolve_folder(self.folders.as_ref(), ctx.user_id, folder_code, scope).await?;

        if patch.name.is_some() {
            if folder.is_root() {
                return Err(AppError::invalid_param("The root folder cannot be renamed"));
            }
            let name = patch
                .effective_name()
                .ok_or_else(|| AppError::invalid_param("Folder name cannot be empty"))?;
            folder.name = name.to_string();
        }

        if let Some(is_favorite) = patch.is_favorite {
            folder.is_favorite = is_favorite;
        }

        let mut moved_from = None;
        if let Some(target_code) = patch.parent_folder_code.as_deref() {
            let new_parent =
                resolve_folder(self.folders.as_ref(), ctx.user_id, target_code, Scope::Active).await?;
            if folder.parent_id != Some(new_parent.id) {
                self.check_reparent(&folder, &new_parent).await?;
                moved_from = folder.parent_id;
                folder.parent_id = Some(new_parent.id);
            }
        }

        let mut folder = self.folders.update(&folder).await?;

        if let (Some(old_parent), Some(new_parent)) = (moved_from, folder.parent_id) {
            self.folders
                .set_has_child(ctx.user_id, new_parent, true)
                .await?;
            refresh_has_child(self.folders.as_ref(), ctx.user_id, old_parent).await?;
            info!(
                user_id = ctx.user_id,
                folder_id = folder.id,
                from = old_parent,
                to = new_parent,
                "Folder moved"
            );
        }

        if patch.restore && !folder.is_root() {
            self.folders.restore(ctx.user_id, folder.id).await?;
            if let Some(parent_id) = folder.parent_id {
                restore_upwards(self.folders.as_ref(), ctx.user_id, parent_id).await?;
            }
            folder = self
                .folders
                .find_by_id(ctx.user_id, folder.id, Scope::WithDeleted)
                .await?
                .ok_or_else(|| AppError::not_found("Folder not found"))?;
        }

        Ok(folder)
    }

    /// Move a folder to the trash. Only the folder row is flagged.
    pub async fn delete_folder_temp(&self, ctx: &RequestContext, folder_code: &str) -> AppResult<Folder> {
        let code = match FolderRef::parse(folder_code) {
            FolderRef::Root => return Err(AppError::invalid_param("The root folder cannot be trashed")),
            FolderRef::Code(code) => code,
        };
        let folder = self
            .folders
            .find_by_code(ctx.user_id, code, Scope::Active)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder not found: {code}")))?;

        self.folders.soft_delete(ctx.user_id, folder.id).await?;
        info!(user_id = ctx.user_id, folder_id = folder.id, code, "Folder moved to trash");

        self.folders
            .find_by_id(ctx.user_id, folder.id, Scope::WithDeleted)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    /// Reject moves of the root and moves into the folder's own subtree.
    async fn check_reparent(&self, folder: &Folder, new_parent: &Folder) -> AppResult<()> {
        if folder.is_root() {
            return Err(AppError::invalid_param("The root folder cannot be moved"));
        }
        let subtree = self.folders.find_subtree(folder.user_id, folder.id).await?;
        if subtree.iter().any(|f| f.id == new_parent.id) {
            return Err(AppError::invalid_param(
                "A folder cannot be moved into itself or one of its descendants",
            ));
        }
        Ok(())
    }
}

//! Store traits for folder and file rows.
//!
//! Every query is scoped to the owning user. Lookups take a [`Scope`] so the
//! caller decides explicitly whether trashed rows are visible. Delete and
//! restore operations report whether a row was affected instead of failing
//! on a missing row, which keeps retries of partial purges harmless.

use async_trait::async_trait;

use gallery_core::result::AppResult;
use gallery_entity::Scope;
use gallery_entity::file::{CreateFile, File, FileListFilter, Thumbnail};
use gallery_entity::folder::{CreateFolder, Folder};

/// Folder hierarchy persistence.
#[async_trait]
pub trait FolderStore: Send + Sync + std::fmt::Debug + 'static {
    /// The user's root folder, trashed or not.
    async fn find_root(&self, user_id: i64) -> AppResult<Option<Folder>>;

    async fn find_by_id(&self, user_id: i64, id: i64, scope: Scope) -> AppResult<Option<Folder>>;

    async fn find_by_code(
        &self,
        user_id: i64,
        code: &str,
        scope: Scope,
    ) -> AppResult<Option<Folder>>;

    /// Direct children ordered by name.
    async fn list_children(
        &self,
        user_id: i64,
        parent_id: i64,
        scope: Scope,
    ) -> AppResult<Vec<Folder>>;

    /// Non-trashed folders marked as favorite.
    async fn list_favorites(&self, user_id: i64) -> AppResult<Vec<Folder>>;

    /// Folders that are themselves trashed.
    async fn list_trashed(&self, user_id: i64) -> AppResult<Vec<Folder>>;

    /// The folder followed by each ancestor up to the root, trashed rows
    /// included.
    async fn find_ancestors(&self, user_id: i64, id: i64) -> AppResult<Vec<Folder>>;

    /// The folder and all its descendants, trashed rows included, with each
    /// parent listed before its children.
    async fn find_subtree(&self, user_id: i64, id: i64) -> AppResult<Vec<Folder>>;

    /// Insert a folder. Fails with `ErrorKind::Conflict` when the code (or a
    /// second root) already exists for the user.
    async fn insert(&self, data: &CreateFolder) -> AppResult<Folder>;

    /// Persist `name`, `parent_id`, `has_child`, and `is_favorite`.
    async fn update(&self, folder: &Folder) -> AppResult<Folder>;

    async fn set_has_child(&self, user_id: i64, id: i64, has_child: bool) -> AppResult<bool>;

    /// Set `deleted_at` on this row only.
    async fn soft_delete(&self, user_id: i64, id: i64) -> AppResult<bool>;

    /// Clear `deleted_at` on this row only.
    async fn restore(&self, user_id: i64, id: i64) -> AppResult<bool>;

    /// Physically remove the row.
    async fn delete(&self, user_id: i64, id: i64) -> AppResult<bool>;
}

/// File and thumbnail persistence.
#[async_trait]
pub trait FileStore: Send + Sync + std::fmt::Debug + 'static {
    async fn find_by_id(&self, user_id: i64, id: i64, scope: Scope) -> AppResult<Option<File>>;

    async fn find_by_code(&self, user_id: i64, code: &str, scope: Scope)
    -> AppResult<Option<File>>;

    /// Files directly inside any of the given folders.
    async fn list_in_folders(
        &self,
        user_id: i64,
        folder_ids: &[i64],
        scope: Scope,
    ) -> AppResult<Vec<File>>;

    /// Trashed files when `filter.is_trash`, else non-trashed favorites when
    /// `filter.is_favorite`, else every non-trashed file.
    async fn list(&self, user_id: i64, filter: FileListFilter) -> AppResult<Vec<File>>;

    async fn insert(&self, data: &CreateFile) -> AppResult<File>;

    /// Persist `file_name`, `folder_id`, and `is_favorite`.
    async fn update(&self, file: &File) -> AppResult<File>;

    async fn set_previewable(&self, id: i64, previewable: bool) -> AppResult<bool>;

    async fn soft_delete(&self, user_id: i64, id: i64) -> AppResult<bool>;

    async fn restore(&self, user_id: i64, id: i64) -> AppResult<bool>;

    /// Physically remove rows; returns how many existed.
    async fn delete_many(&self, user_id: i64, ids: &[i64]) -> AppResult<u64>;

    async fn find_thumbnail(&self, file_id: i64) -> AppResult<Option<Thumbnail>>;

    async fn find_thumbnails(&self, file_ids: &[i64]) -> AppResult<Vec<Thumbnail>>;

    /// Record the thumbnail of a file, replacing any earlier one.
    async fn upsert_thumbnail(&self, file_id: i64, file_path: &str) -> AppResult<Thumbnail>;

    async fn delete_thumbnails(&self, ids: &[i64]) -> AppResult<u64>;
}

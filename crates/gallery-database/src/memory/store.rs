use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use gallery_core::error::AppError;
use gallery_core::result::AppResult;
use gallery_entity::Scope;
use gallery_entity::file::{CreateFile, File, FileListFilter, Thumbnail};
use gallery_entity::folder::{CreateFolder, Folder};

use crate::store::{FileStore, FolderStore};

#[derive(Debug, Default)]
struct Tables {
    folders: BTreeMap<i64, Folder>,
    files: BTreeMap<i64, File>,
    thumbnails: BTreeMap<i64, Thumbnail>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn folder(&self, user_id: i64, id: i64, scope: Scope) -> Option<&Folder> {
        self.folders
            .get(&id)
            .filter(|f| f.user_id == user_id && scope.admits(f.is_deleted()))
    }

    fn file(&self, user_id: i64, id: i64, scope: Scope) -> Option<&File> {
        self.files
            .get(&id)
            .filter(|f| f.user_id == user_id && scope.admits(f.is_deleted()))
    }
}

/// Memory-backed [`FolderStore`] and [`FileStore`].
///
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of folder rows, trashed included.
    pub async fn folder_count(&self) -> usize {
        self.tables.read().await.folders.len()
    }

    /// Number of file rows, trashed included.
    pub async fn file_count(&self) -> usize {
        self.tables.read().await.files.len()
    }

    pub async fn thumbnail_count(&self) -> usize {
        self.tables.read().await.thumbnails.len()
    }
}

#[async_trait]
impl FolderStore for MemoryStore {
    async fn find_root(&self, user_id: i64) -> AppResult<Option<Folder>> {
        let tables = self.tables.read().await;
        Ok(tables
            .folders
            .values()
            .find(|f| f.user_id == user_id && f.is_root())
            .cloned())
    }

    async fn find_by_id(&self, user_id: i64, id: i64, scope: Scope) -> AppResult<Option<Folder>> {
        Ok(self.tables.read().await.folder(user_id, id, scope).cloned())
    }

    async fn find_by_code(
        &self,
        user_id: i64,
        code: &str,
        scope: Scope,
    ) -> AppResult<Option<Folder>> {
        let tables = self.tables.read().await;
        Ok(tables
            .folders
            .values()
            .find(|f| {
                f.user_id == user_id
                    && f.code.as_deref() == Some(code)
                    && scope.admits(f.is_deleted())
            })
            .cloned())
    }

    async fn list_children(
        &self,
        user_id: i64,
        parent_id: i64,
        scope: Scope,
    ) -> AppResult<Vec<Folder>> {
        let tables = self.tables.read().await;
        let mut children: Vec<Folder> = tables
            .folders
            .values()
            .filter(|f| {
                f.user_id == user_id
                    && f.parent_id == Some(parent_id)
                    && scope.admits(f.is_deleted())
            })
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(children)
    }

    async fn list_favorites(&self, user_id: i64) -> AppResult<Vec<Folder>> {
        let tables = self.tables.read().await;
        let mut folders: Vec<Folder> = tables
            .folders
            .values()
            .filter(|f| f.user_id == user_id && f.is_favorite && !f.is_deleted())
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(folders)
    }

    async fn list_trashed(&self, user_id: i64) -> AppResult<Vec<Folder>> {
        let tables = self.tables.read().await;
        let mut folders: Vec<Folder> = tables
            .folders
            .values()
            .filter(|f| f.user_id == user_id && f.is_deleted())
            .cloned()
            .collect();
        folders.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at).then(a.id.cmp(&b.id)));
        Ok(folders)
    }

    async fn find_ancestors(&self, user_id: i64, id: i64) -> AppResult<Vec<Folder>> {
        let tables = self.tables.read().await;
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(id);

        while let Some(current) = next {
            if !seen.insert(current) {
                break;
            }
            let Some(folder) = tables.folder(user_id, current, Scope::WithDeleted) else {
                break;
            };
            next = folder.parent_id;
            chain.push(folder.clone());
        }

        Ok(chain)
    }

    async fn find_subtree(&self, user_id: i64, id: i64) -> AppResult<Vec<Folder>> {
        let tables = self.tables.read().await;
        let Some(start) = tables.folder(user_id, id, Scope::WithDeleted) else {
            return Ok(Vec::new());
        };

        let mut subtree = vec![start.clone()];
        let mut seen = HashSet::from([id]);
        let mut cursor = 0;
        while cursor < subtree.len() {
            let parent_id = subtree[cursor].id;
            let mut children: Vec<&Folder> = tables
                .folders
                .values()
                .filter(|f| f.user_id == user_id && f.parent_id == Some(parent_id))
                .collect();
            children.sort_by_key(|f| f.id);
            for child in children {
                if seen.insert(child.id) {
                    subtree.push(child.clone());
                }
            }
            cursor += 1;
        }

        Ok(subtree)
    }

    async fn insert(&self, data: &CreateFolder) -> AppResult<Folder> {
        let mut tables = self.tables.write().await;
        let duplicate = tables.folders.values().any(|f| {
            f.user_id == data.user_id
                && match (&data.code, &f.code) {
                    (Some(new), Some(existing)) => new == existing,
                    _ => data.parent_id.is_none() && f.is_root(),
                }
        });
        if duplicate {
            return Err(AppError::conflict("Failed to create folder: duplicate key"));
        }

        let now = Utc::now();
        let folder = Folder {
            id: tables.next_id(),
            user_id: data.user_id,
            parent_id: data.parent_id,
            name: data.name.clone(),
            code: data.code.clone(),
            has_child: false,
            is_favorite: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.folders.insert(folder.id, folder.clone());
        Ok(folder)
    }

    async fn update(&self, folder: &Folder) -> AppResult<Folder> {
        let mut tables = self.tables.write().await;
        let row = tables
            .folders
            .get_mut(&folder.id)
            .filter(|f| f.user_id == folder.user_id)
            .ok_or_else(|| AppError::not_found(format!("Folder {} not found", folder.id)))?;
        row.name = folder.name.clone();
        row.parent_id = folder.parent_id;
        row.has_child = folder.has_child;
        row.is_favorite = folder.is_favorite;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn set_has_child(&self, user_id: i64, id: i64, has_child: bool) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.folders.get_mut(&id).filter(|f| f.user_id == user_id) {
            Some(row) => {
                row.has_child = has_child;
                row.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn soft_delete(&self, user_id: i64, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .folders
            .get_mut(&id)
            .filter(|f| f.user_id == user_id && !f.is_deleted())
        {
            Some(row) => {
                row.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn restore(&self, user_id: i64, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .folders
            .get_mut(&id)
            .filter(|f| f.user_id == user_id && f.is_deleted())
        {
            Some(row) => {
                row.deleted_at = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, user_id: i64, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.folder(user_id, id, Scope::WithDeleted).is_none() {
            return Ok(false);
        }
        Ok(tables.folders.remove(&id).is_some())
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn find_by_id(&self, user_id: i64, id: i64, scope: Scope) -> AppResult<Option<File>> {
        Ok(self.tables.read().await.file(user_id, id, scope).cloned())
    }

    async fn find_by_code(
        &self,
        user_id: i64,
        code: &str,
        scope: Scope,
    ) -> AppResult<Option<File>> {
        let tables = self.tables.read().await;
        Ok(tables
            .files
            .values()
            .find(|f| f.user_id == user_id && f.file_code == code && scope.admits(f.is_deleted()))
            .cloned())
    }

    async fn list_in_folders(
        &self,
        user_id: i64,
        folder_ids: &[i64],
        scope: Scope,
    ) -> AppResult<Vec<File>> {
        let tables = self.tables.read().await;
        let mut files: Vec<File> = tables
            .files
            .values()
            .filter(|f| {
                f.user_id == user_id
                    && folder_ids.contains(&f.folder_id)
                    && scope.admits(f.is_deleted())
            })
            .cloned()
            .collect();
        files.sort_by(|a, b| a.file_name.cmp(&b.file_name).then(a.id.cmp(&b.id)));
        Ok(files)
    }

    async fn list(&self, user_id: i64, filter: FileListFilter) -> AppResult<Vec<File>> {
        let tables = self.tables.read().await;
        let mut files: Vec<File> = tables
            .files
            .values()
            .filter(|f| f.user_id == user_id)
            .filter(|f| {
                if filter.is_trash {
                    f.is_deleted()
                } else {
                    !f.is_deleted() && (!filter.is_favorite || f.is_favorite)
                }
            })
            .cloned()
            .collect();
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(files)
    }

    async fn insert(&self, data: &CreateFile) -> AppResult<File> {
        let mut tables = self.tables.write().await;
        if tables.files.values().any(|f| f.file_code == data.file_code) {
            return Err(AppError::conflict("Failed to create file: duplicate key"));
        }
        if tables
            .folder(data.user_id, data.folder_id, Scope::WithDeleted)
            .is_none()
        {
            return Err(AppError::database(format!(
                "Failed to create file: folder {} does not exist",
                data.folder_id
            )));
        }

        let now = Utc::now();
        let file = File {
            id: tables.next_id(),
            user_id: data.user_id,
            folder_id: data.folder_id,
            file_name: data.file_name.clone(),
            file_code: data.file_code.clone(),
            file_size: data.file_size,
            file_type: data.file_type.clone(),
            is_favorite: false,
            is_previewable: data.is_previewable,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.files.insert(file.id, file.clone());
        Ok(file)
    }

    async fn update(&self, file: &File) -> AppResult<File> {
        let mut tables = self.tables.write().await;
        let row = tables
            .files
            .get_mut(&file.id)
            .filter(|f| f.user_id == file.user_id)
            .ok_or_else(|| AppError::not_found(format!("File {} not found", file.id)))?;
        row.file_name = file.file_name.clone();
        row.folder_id = file.folder_id;
        row.is_favorite = file.is_favorite;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn set_previewable(&self, id: i64, previewable: bool) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.files.get_mut(&id) {
            Some(row) => {
                row.is_previewable = previewable;
                row.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn soft_delete(&self, user_id: i64, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .files
            .get_mut(&id)
            .filter(|f| f.user_id == user_id && !f.is_deleted())
        {
            Some(row) => {
                row.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn restore(&self, user_id: i64, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .files
            .get_mut(&id)
            .filter(|f| f.user_id == user_id && f.is_deleted())
        {
            Some(row) => {
                row.deleted_at = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_many(&self, user_id: i64, ids: &[i64]) -> AppResult<u64> {
        let mut tables = self.tables.write().await;
        let mut removed = 0;
        for id in ids {
            if tables.file(user_id, *id, Scope::WithDeleted).is_some() {
                tables.files.remove(id);
                tables.thumbnails.retain(|_, t| t.file_id != *id);
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn find_thumbnail(&self, file_id: i64) -> AppResult<Option<Thumbnail>> {
        let tables = self.tables.read().await;
        Ok(tables
            .thumbnails
            .values()
            .find(|t| t.file_id == file_id)
            .cloned())
    }

    async fn find_thumbnails(&self, file_ids: &[i64]) -> AppResult<Vec<Thumbnail>> {
        let tables = self.tables.read().await;
        Ok(tables
            .thumbnails
            .values()
            .filter(|t| file_ids.contains(&t.file_id))
            .cloned()
            .collect())
    }

    async fn upsert_thumbnail(&self, file_id: i64, file_path: &str) -> AppResult<Thumbnail> {
        let mut tables = self.tables.write().await;
        if !tables.files.contains_key(&file_id) {
            return Err(AppError::database(format!(
                "Failed to record thumbnail: file {file_id} does not exist"
            )));
        }

        if let Some(existing) = tables.thumbnails.values_mut().find(|t| t.file_id == file_id) {
            existing.file_path = file_path.to_string();
            return Ok(existing.clone());
        }

        let thumbnail = Thumbnail {
            id: tables.next_id(),
            file_id,
            file_path: file_path.to_string(),
            created_at: Utc::now(),
        };
        tables.thumbnails.insert(thumbnail.id, thumbnail.clone());
        Ok(thumbnail)
    }

    async fn delete_thumbnails(&self, ids: &[i64]) -> AppResult<u64> {
        let mut tables = self.tables.write().await;
        Ok(ids
            .iter()
            .filter(|id| tables.thumbnails.remove(*id).is_some())
            .count() as u64)
    }
}

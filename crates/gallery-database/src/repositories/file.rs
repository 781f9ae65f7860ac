//! File and thumbnail repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use gallery_core::error::{AppError, ErrorKind};
use gallery_core::result::AppResult;
use gallery_entity::Scope;
use gallery_entity::file::{CreateFile, File, FileListFilter, Thumbnail};

use crate::store::FileStore;

use super::{map_insert_error, scope_clause};

/// Repository for file rows and their thumbnails.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileStore for FileRepository {
    async fn find_by_id(&self, user_id: i64, id: i64, scope: Scope) -> AppResult<Option<File>> {
        let sql = format!(
            "SELECT * FROM files WHERE user_id = $1 AND id = $2{}",
            scope_clause(scope)
        );
        sqlx::query_as::<_, File>(&sql)
            .bind(user_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    async fn find_by_code(
        &self,
        user_id: i64,
        code: &str,
        scope: Scope,
    ) -> AppResult<Option<File>> {
        let sql = format!(
            "SELECT * FROM files WHERE user_id = $1 AND file_code = $2{}",
            scope_clause(scope)
        );
        sqlx::query_as::<_, File>(&sql)
            .bind(user_id)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file by code", e))
    }

    async fn list_in_folders(
        &self,
        user_id: i64,
        folder_ids: &[i64],
        scope: Scope,
    ) -> AppResult<Vec<File>> {
        if folder_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT * FROM files WHERE user_id = $1 AND folder_id = ANY($2){} \
             ORDER BY file_name ASC, id ASC",
            scope_clause(scope)
        );
        sqlx::query_as::<_, File>(&sql)
            .bind(user_id)
            .bind(folder_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list folder files", e))
    }

    async fn list(&self, user_id: i64, filter: FileListFilter) -> AppResult<Vec<File>> {
        let condition = if filter.is_trash {
            "deleted_at IS NOT NULL"
        } else if filter.is_favorite {
            "deleted_at IS NULL AND is_favorite"
        } else {
            "deleted_at IS NULL"
        };
        let sql = format!(
            "SELECT * FROM files WHERE user_id = $1 AND {condition} ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, File>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))
    }

    async fn insert(&self, data: &CreateFile) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "INSERT INTO files (user_id, folder_id, file_name, file_code, file_size, file_type, is_previewable) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(data.user_id)
        .bind(data.folder_id)
        .bind(&data.file_name)
        .bind(&data.file_code)
        .bind(data.file_size)
        .bind(&data.file_type)
        .bind(data.is_previewable)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "Failed to create file"))
    }

    async fn update(&self, file: &File) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET file_name = $3, folder_id = $4, is_favorite = $5, updated_at = NOW() \
             WHERE user_id = $1 AND id = $2 RETURNING *",
        )
        .bind(file.user_id)
        .bind(file.id)
        .bind(&file.file_name)
        .bind(file.folder_id)
        .bind(file.is_favorite)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update file", e))?
        .ok_or_else(|| AppError::not_found(format!("File {} not found", file.id)))
    }

    async fn set_previewable(&self, id: i64, previewable: bool) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE files SET is_previewable = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(previewable)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update previewable flag", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete(&self, user_id: i64, id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE files SET deleted_at = NOW() \
             WHERE user_id = $1 AND id = $2 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to trash file", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn restore(&self, user_id: i64, id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE files SET deleted_at = NULL \
             WHERE user_id = $1 AND id = $2 AND deleted_at IS NOT NULL",
        )
        .bind(user_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to restore file", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_many(&self, user_id: i64, ids: &[i64]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM files WHERE user_id = $1 AND id = ANY($2)")
            .bind(user_id)
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete files", e))?;
        Ok(result.rows_affected())
    }

    async fn find_thumbnail(&self, file_id: i64) -> AppResult<Option<Thumbnail>> {
        sqlx::query_as::<_, Thumbnail>("SELECT * FROM thumbnails WHERE file_id = $1")
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find thumbnail", e))
    }

    async fn find_thumbnails(&self, file_ids: &[i64]) -> AppResult<Vec<Thumbnail>> {
        if file_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Thumbnail>("SELECT * FROM thumbnails WHERE file_id = ANY($1)")
            .bind(file_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list thumbnails", e))
    }

    async fn upsert_thumbnail(&self, file_id: i64, file_path: &str) -> AppResult<Thumbnail> {
        sqlx::query_as::<_, Thumbnail>(
            "INSERT INTO thumbnails (file_id, file_path) VALUES ($1, $2) \
             ON CONFLICT (file_id) DO UPDATE SET file_path = EXCLUDED.file_path \
             RETURNING *",
        )
        .bind(file_id)
        .bind(file_path)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record thumbnail", e))
    }

    async fn delete_thumbnails(&self, ids: &[i64]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM thumbnails WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete thumbnails", e)
            })?;
        Ok(result.rows_affected())
    }
}

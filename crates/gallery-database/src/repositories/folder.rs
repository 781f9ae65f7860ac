//! Folder repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use gallery_core::error::{AppError, ErrorKind};
use gallery_core::result::AppResult;
use gallery_entity::Scope;
use gallery_entity::folder::{CreateFolder, Folder};

use crate::store::FolderStore;

use super::{map_insert_error, scope_clause};

/// Upper bound on tree depth walked by the recursive queries.
const MAX_TREE_DEPTH: i32 = 4096;

/// Repository for folder CRUD and tree queries.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FolderStore for FolderRepository {
    async fn find_root(&self, user_id: i64) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE user_id = $1 AND parent_id IS NULL")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find root folder", e))
    }

    async fn find_by_id(&self, user_id: i64, id: i64, scope: Scope) -> AppResult<Option<Folder>> {
        let sql = format!(
            "SELECT * FROM folders WHERE user_id = $1 AND id = $2{}",
            scope_clause(scope)
        );
        sqlx::query_as::<_, Folder>(&sql)
            .bind(user_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    async fn find_by_code(
        &self,
        user_id: i64,
        code: &str,
        scope: Scope,
    ) -> AppResult<Option<Folder>> {
        let sql = format!(
            "SELECT * FROM folders WHERE user_id = $1 AND code = $2{}",
            scope_clause(scope)
        );
        sqlx::query_as::<_, Folder>(&sql)
            .bind(user_id)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find folder by code", e)
            })
    }

    async fn list_children(
        &self,
        user_id: i64,
        parent_id: i64,
        scope: Scope,
    ) -> AppResult<Vec<Folder>> {
        let sql = format!(
            "SELECT * FROM folders WHERE user_id = $1 AND parent_id = $2{} ORDER BY name ASC, id ASC",
            scope_clause(scope)
        );
        sqlx::query_as::<_, Folder>(&sql)
            .bind(user_id)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))
    }

    async fn list_favorites(&self, user_id: i64) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE user_id = $1 AND is_favorite AND deleted_at IS NULL \
             ORDER BY name ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list favorite folders", e))
    }

    async fn list_trashed(&self, user_id: i64) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE user_id = $1 AND deleted_at IS NOT NULL \
             ORDER BY deleted_at DESC, id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list trashed folders", e))
    }

    async fn find_ancestors(&self, user_id: i64, id: i64) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "WITH RECURSIVE ancestors AS ( \
                SELECT folders.*, 0 AS lvl FROM folders WHERE user_id = $1 AND id = $2 \
                UNION ALL \
                SELECT f.*, a.lvl + 1 FROM folders f \
                INNER JOIN ancestors a ON f.id = a.parent_id \
                WHERE f.user_id = $1 AND a.lvl < $3 \
             ) SELECT * FROM ancestors ORDER BY lvl ASC",
        )
        .bind(user_id)
        .bind(id)
        .bind(MAX_TREE_DEPTH)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find ancestors", e))
    }

    async fn find_subtree(&self, user_id: i64, id: i64) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "WITH RECURSIVE tree AS ( \
                SELECT folders.*, 0 AS lvl FROM folders WHERE user_id = $1 AND id = $2 \
                UNION ALL \
                SELECT f.*, t.lvl + 1 FROM folders f \
                INNER JOIN tree t ON f.parent_id = t.id \
                WHERE f.user_id = $1 AND t.lvl < $3 \
             ) SELECT * FROM tree ORDER BY lvl ASC, id ASC",
        )
        .bind(user_id)
        .bind(id)
        .bind(MAX_TREE_DEPTH)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load folder subtree", e))
    }

    async fn insert(&self, data: &CreateFolder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (user_id, parent_id, name, code) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(data.user_id)
        .bind(data.parent_id)
        .bind(&data.name)
        .bind(&data.code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "Failed to create folder"))
    }

    async fn update(&self, folder: &Folder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET name = $3, parent_id = $4, has_child = $5, is_favorite = $6, \
             updated_at = NOW() WHERE user_id = $1 AND id = $2 RETURNING *",
        )
        .bind(folder.user_id)
        .bind(folder.id)
        .bind(&folder.name)
        .bind(folder.parent_id)
        .bind(folder.has_child)
        .bind(folder.is_favorite)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update folder", e))?
        .ok_or_else(|| AppError::not_found(format!("Folder {} not found", folder.id)))
    }

    async fn set_has_child(&self, user_id: i64, id: i64, has_child: bool) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE folders SET has_child = $3, updated_at = NOW() WHERE user_id = $1 AND id = $2",
        )
        .bind(user_id)
        .bind(id)
        .bind(has_child)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update has_child", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete(&self, user_id: i64, id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE folders SET deleted_at = NOW() \
             WHERE user_id = $1 AND id = $2 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to trash folder", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn restore(&self, user_id: i64, id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE folders SET deleted_at = NULL \
             WHERE user_id = $1 AND id = $2 AND deleted_at IS NOT NULL",
        )
        .bind(user_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to restore folder", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, user_id: i64, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete folder", e))?;
        Ok(result.rows_affected() > 0)
    }
}

//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Name carried by every user's root folder.
pub const ROOT_FOLDER_NAME: &str = "/";

/// A folder in a user's gallery tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: i64,
    /// The owning user.
    pub user_id: i64,
    /// Parent folder ID (null for the root).
    pub parent_id: Option<i64>,
    /// Display name.
    pub name: String,
    /// Client-facing handle, unique per user. Null for the root.
    pub code: Option<String>,
    /// Whether at least one folder was ever created under this one.
    pub has_child: bool,
    /// Whether the user marked this folder as a favorite.
    pub is_favorite: bool,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
    /// When the folder was moved to the trash.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Folder {
    /// Check if this is the user's root folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check if the folder is in the trash.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// The code as it appears in breadcrumbs and responses; empty for the root.
    pub fn code_or_empty(&self) -> &str {
        self.code.as_deref().unwrap_or_default()
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// The owning user.
    pub user_id: i64,
    /// Parent folder (None only for the root).
    pub parent_id: Option<i64>,
    /// Display name.
    pub name: String,
    /// Client-facing handle (None only for the root).
    pub code: Option<String>,
}

impl CreateFolder {
    /// The root folder every user owns exactly one of.
    pub fn root(user_id: i64) -> Self {
        Self {
            user_id,
            parent_id: None,
            name: ROOT_FOLDER_NAME.to_string(),
            code: None,
        }
    }
}

//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: i64,
    /// The owning user.
    pub user_id: i64,
    /// The containing folder.
    pub folder_id: i64,
    /// Display name as uploaded.
    pub file_name: String,
    /// Key of the primary blob. Never changes.
    pub file_code: String,
    /// Size in bytes.
    pub file_size: i64,
    /// MIME type as declared by the uploader.
    pub file_type: String,
    /// Whether the user marked this file as a favorite.
    pub is_favorite: bool,
    /// Whether a preview (image, or finished HLS rendition) is available.
    pub is_previewable: bool,
    /// When the file was uploaded.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
    /// When the file was moved to the trash.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Broad media class derived from the MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    pub fn from_mime(mime: &str) -> Self {
        let top = mime.split('/').next().unwrap_or_default();
        if top.eq_ignore_ascii_case("image") {
            Self::Image
        } else if top.eq_ignore_ascii_case("video") {
            Self::Video
        } else {
            Self::Other
        }
    }
}

impl File {
    pub fn media_kind(&self) -> MediaKind {
        MediaKind::from_mime(&self.file_type)
    }

    pub fn is_image(&self) -> bool {
        self.media_kind() == MediaKind::Image
    }

    pub fn is_video(&self) -> bool {
        self.media_kind() == MediaKind::Video
    }

    /// Check if the file is in the trash.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether HLS derivatives are expected to exist for this file.
    pub fn has_hls_rendition(&self) -> bool {
        self.is_video() && self.is_previewable
    }
}

/// Data required to insert a file row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    pub user_id: i64,
    pub folder_id: i64,
    pub file_name: String,
    pub file_code: String,
    pub file_size: i64,
    pub file_type: String,
    pub is_previewable: bool,
}

//! Thumbnail entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A generated thumbnail, stored in the owner's service bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Thumbnail {
    pub id: i64,
    /// The file this thumbnail was generated from (at most one per file).
    pub file_id: i64,
    /// Object key within the service bucket.
    pub file_path: String,
    pub created_at: DateTime<Utc>,
}

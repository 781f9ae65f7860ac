//! File update bodies and listing filters.

use serde::{Deserialize, Serialize};

/// Full update: both fields are always written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUpdate {
    pub file_name: String,
    pub is_favorite: bool,
    /// Take the file out of the trash, along with trashed ancestors.
    #[serde(default)]
    pub restore: bool,
}

/// Partial update: absent fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilePatch {
    /// New name; ignored when empty.
    #[serde(default)]
    pub file_name: Option<String>,
    /// Code of the destination folder (`"root"` for the root folder).
    #[serde(default)]
    pub folder_code: Option<String>,
    #[serde(default)]
    pub is_favorite: Option<bool>,
    #[serde(default)]
    pub restore: bool,
}

impl FilePatch {
    /// The name to apply, if any non-blank name was supplied.
    pub fn effective_name(&self) -> Option<&str> {
        self.file_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// Which slice of a user's files to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileListFilter {
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_trash: bool,
}

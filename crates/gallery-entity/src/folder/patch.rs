//! Partial folder update body.

use serde::{Deserialize, Serialize};

/// Fields a caller may change on a folder. Absent fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderPatch {
    /// New name; ignored when empty.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_favorite: Option<bool>,
    /// Take the folder out of the trash, along with trashed ancestors.
    #[serde(default)]
    pub restore: bool,
    /// Code of the new parent (`"root"` for the root folder).
    #[serde(default)]
    pub parent_folder_code: Option<String>,
}

impl FolderPatch {
    /// The name to apply, if any non-blank name was supplied.
    pub fn effective_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

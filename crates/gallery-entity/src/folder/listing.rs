//! Folder listing and deletion result shapes.

use serde::{Deserialize, Serialize};

use super::model::Folder;

/// One breadcrumb entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderHierarchy {
    pub name: String,
    /// Empty for the root folder.
    pub code: String,
}

impl From<&Folder> for FolderHierarchy {
    fn from(folder: &Folder) -> Self {
        Self {
            name: folder.name.clone(),
            code: folder.code_or_empty().to_string(),
        }
    }
}

/// The children of a folder together with the path leading to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderListing {
    /// The folder that was listed.
    pub folder: Folder,
    /// Root first, listed folder last.
    pub hierarchy: Vec<FolderHierarchy>,
    /// Non-trashed child folders.
    pub folders: Vec<Folder>,
}

/// Everything a permanent folder delete removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedFilesAndFoldersList {
    /// Codes of every removed file.
    pub deleted_files: Vec<String>,
    /// Codes of every removed folder, descendants before ancestors.
    pub deleted_folders: Vec<String>,
}

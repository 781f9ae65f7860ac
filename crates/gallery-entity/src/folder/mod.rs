//! Folder entities.

pub mod listing;
pub mod model;
pub mod patch;
pub mod tree;

pub use listing::{DeletedFilesAndFoldersList, FolderHierarchy, FolderListing};
pub use model::{CreateFolder, Folder};
pub use patch::FolderPatch;
pub use tree::{ArenaNode, FolderArena};

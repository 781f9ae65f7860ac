//! Core value types used across the gallery workspace.

pub mod buckets;
pub mod code;

pub use buckets::UserBuckets;
pub use code::{FolderRef, ROOT_SENTINEL, generate_folder_code};

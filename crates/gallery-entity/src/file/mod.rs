//! File and thumbnail entities.

pub mod model;
pub mod patch;
pub mod thumbnail;

pub use model::{CreateFile, File, MediaKind};
pub use patch::{FileListFilter, FilePatch, FileUpdate};
pub use thumbnail::Thumbnail;

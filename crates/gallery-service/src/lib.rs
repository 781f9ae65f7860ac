//! # gallery-service
//!
//! Business logic for the gallery. Each service is built once from `Arc`
//! store handles and receives the acting user and their bucket handle
//! explicitly through a [`RequestContext`] on every call.

pub mod cleanup;
pub mod context;
pub mod file;
pub mod folder;
pub mod lock;
pub mod state;

pub use context::RequestContext;
pub use file::{DownloadService, FileService, PreviewService, UploadService, UploadedPart};
pub use folder::FolderService;
pub use lock::{SubtreeGuard, SubtreeLocks};
pub use state::GalleryServices;

//! File records, uploads, presigned downloads and derivative previews.

pub mod download;
pub mod preview;
pub mod service;
pub mod upload;

pub use download::DownloadService;
pub use preview::PreviewService;
pub use service::FileService;
pub use upload::{UploadService, UploadedPart};

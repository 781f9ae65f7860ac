//! Folder hierarchy operations and the cascading delete/restore engine.

pub mod hierarchy;
pub mod purge;
pub mod service;

pub use service::FolderService;

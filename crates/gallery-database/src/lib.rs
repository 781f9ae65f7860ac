//! # gallery-database
//!
//! PostgreSQL connection management, the folder/file store traits the
//! services are written against, and two implementations of them: sqlx
//! repositories and an in-process memory store.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::{FileStore, FolderStore};

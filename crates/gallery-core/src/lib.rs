//! # gallery-core
//!
//! Core crate for the web gallery. Contains the unified error system,
//! configuration schemas, the object store trait, and the small value
//! types (bucket pairs, folder codes) shared by every other crate.
//!
//! This crate has **no** internal dependencies on other gallery crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;

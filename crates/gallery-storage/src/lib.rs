//! # gallery-storage
//!
//! Object store providers for the gallery (local filesystem, in-memory and
//! S3-compatible) plus [`BucketClient`], the per-user handle through which
//! every service and the derivative pipeline reach blob storage.

pub mod bucket;
pub mod keys;
pub mod presign;
pub mod providers;

pub use bucket::BucketClient;
pub use providers::build_object_store;

//! Per-user bucket naming.

use serde::{Deserialize, Serialize};

/// The pair of buckets that make up one user's storage namespace.
///
/// Primary blobs live in `primary`; thumbnails and HLS renditions live in
/// `service`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserBuckets {
    pub primary: String,
    pub service: String,
}

impl UserBuckets {
    pub fn new(primary: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            service: service.into(),
        }
    }

    /// Derive the bucket names for a user from the configured prefix.
    ///
    /// Names stay within the S3 rules (lowercase, digits, hyphens).
    pub fn for_user(prefix: &str, user_id: i64) -> Self {
        let prefix = prefix.trim_end_matches('-').to_ascii_lowercase();
        Self {
            primary: format!("{prefix}-user-{user_id}"),
            service: format!("{prefix}-user-{user_id}-service"),
        }
    }
}

//! Soft-delete visibility for store queries.

use serde::{Deserialize, Serialize};

/// Which rows a lookup may return with respect to soft deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// Only rows whose `deleted_at` is null.
    Active,
    /// Every row, trashed or not.
    WithDeleted,
}

impl Scope {
    /// Whether a row with the given deletion state is visible in this scope.
    pub fn admits(self, deleted: bool) -> bool {
        match self {
            Self::Active => !deleted,
            Self::WithDeleted => true,
        }
    }
}

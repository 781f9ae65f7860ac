//! Per-user advisory locks for structural tree changes.
//!
//! Permanent deletes, restores and moves all take the owning user's lock,
//! so a restore can never resurrect an ancestor chain that a concurrent
//! purge is tearing down. Plain reads and soft deletes do not lock.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<i64, Arc<Mutex<()>>>;

/// Per-user mutex registry. An entry lives only while someone holds or
/// waits for it.
#[derive(Debug, Clone, Default)]
pub struct SubtreeLocks {
    locks: Arc<LockMap>,
}

/// Held lock of one user. Dropping it releases the lock and forgets the
/// entry when nobody else is queued on it.
#[derive(Debug)]
pub struct SubtreeGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
    user_id: i64,
}

impl SubtreeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and hold the lock of `user_id` until the guard drops.
    pub async fn acquire(&self, user_id: i64) -> SubtreeGuard {
        let lock = self
            .locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        SubtreeGuard {
            guard: Some(lock.lock_owned().await),
            locks: Arc::clone(&self.locks),
            user_id,
        }
    }

    /// Number of users with a live entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for SubtreeGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold a clone of the Arc, so a count of one means only the
        // map still refers to it.
        self.locks
            .remove_if(&self.user_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

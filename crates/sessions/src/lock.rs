//! Per-identifier single-flight locks.
//!
//! Held across the read-decide-write section of session resolution so
//! that concurrent requests for the same identifier in one process mint at
//! most one remote session.  Requests for different identifiers never
//! wait on each other.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Guard for one identifier; the lock is released on drop.
pub type IdentifierGuard = OwnedMutexGuard<()>;

#[derive(Default)]
pub struct SessionLockMap {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SessionLockMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other task holds `identifier`, then hold it.
    pub async fn acquire(&self, identifier: &str) -> IdentifierGuard {
        let lock = {
            let mut locks = self.locks.lock();
            locks
                .entry(identifier.to_owned())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of tracked identifiers (for monitoring).
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }

    /// Forget identifiers nobody holds or waits on.
    pub fn prune_idle(&self) {
        let mut locks = self.locks.lock();
        // The map's own reference is the only one left when idle.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}

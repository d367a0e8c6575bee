//! Session store adapter.
//!
//! The store maps an external identifier to an encoded
//! [`SessionRecord`](crate::record::SessionRecord).  It is the only durable
//! owner of affinity state; nothing here caches values between calls.
//!
//! Values are written as strings but read back as bytes: a shared store can
//! hold anything another writer put there, and judging it is the decoder's
//! job.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use sb_domain::error::Result;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Keyed storage shared by every SessionBridge replica.
///
/// Failures are reported as `Error::StoreUnavailable`.  No atomicity is
/// promised across calls.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The stored value, byte for byte.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`.  Returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Every key currently resident.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Delete every key and return how many were removed.
    ///
    /// Keys written while this runs may or may not be removed.
    async fn delete_all(&self) -> Result<u64> {
        let mut deleted = 0;
        for key in self.keys().await? {
            if self.delete(&key).await? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process-local store.  Used in tests and single-instance local runs.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Store `value` as is, bypassing the string-only `set`.
    pub fn insert_raw(&self, key: &str, value: impl Into<Vec<u8>>) {
        self.entries.write().insert(key.to_owned(), value.into());
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().insert(key.to_owned(), value.as_bytes().to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }

    async fn delete_all(&self) -> Result<u64> {
        let mut entries = self.entries.write();
        let deleted = entries.len() as u64;
        entries.clear();
        Ok(deleted)
    }
}

//! Maintenance sweeper: empties the session store.
//!
//! Deletes every key without looking at it, so the store must hold nothing
//! but affinity records.  Runs out-of-band (admin endpoint, CLI, or a
//! timer); concurrent requests may recreate keys mid-sweep.

use std::sync::Arc;
use std::time::Duration;

use sb_domain::error::Result;
use sb_domain::trace::TraceEvent;

use crate::store::SessionStore;

pub struct Sweeper {
    store: Arc<dyn SessionStore>,
}

impl Sweeper {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Delete every key in the store and return how many were removed.
    pub async fn flush_all(&self) -> Result<u64> {
        let deleted = self.store.delete_all().await?;
        TraceEvent::StoreFlushed { deleted }.emit();
        Ok(deleted)
    }

    /// Flush the store every `every` until the task is aborted.  The first
    /// flush happens one full interval after start.
    pub fn spawn_periodic(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
            loop {
                interval.tick().await;
                match self.flush_all().await {
                    Ok(deleted) => tracing::info!(deleted, "scheduled store flush completed"),
                    Err(e) => tracing::warn!(error = %e, "scheduled store flush failed"),
                }
            }
        })
    }
}

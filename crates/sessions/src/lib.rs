//! Session affinity for SessionBridge.
//!
//! Maps external user identifiers to dialog engine sessions kept in an
//! external key-value store: the record codec, the store adapters, the
//! affinity cache that mints and renews sessions, and the sweeper that
//! empties the store.

pub mod affinity;
pub mod lock;
pub mod record;
pub mod redis_store;
pub mod reply;
pub mod store;
pub mod sweeper;

pub use affinity::{AffinityCache, Resolution, ResolvedSession};
pub use lock::SessionLockMap;
pub use record::{SessionRecord, SESSION_TTL_SECS};
pub use redis_store::{RedisOptions, RedisSessionStore};
pub use reply::{ReplyEnvelope, ReplyMessage, FALLBACK_TEXT};
pub use store::{MemorySessionStore, SessionStore};
pub use sweeper::Sweeper;

use std::sync::Arc;

use sb_domain::config::{StoreBackend, StoreConfig};
use sb_domain::error::{Error, Result};

/// Build the configured store.
///
/// `root_cert_pem` takes precedence over `cfg.ca_cert_path`; it is how a
/// certificate decoded from a credentials file is passed in.
pub fn create_store(
    cfg: &StoreConfig,
    root_cert_pem: Option<Vec<u8>>,
) -> Result<Arc<dyn SessionStore>> {
    match cfg.backend {
        StoreBackend::Memory => {
            tracing::warn!("using in-process session store; affinity is not shared or persisted");
            Ok(Arc::new(MemorySessionStore::new()))
        }
        StoreBackend::Redis => {
            let root_cert_pem = match (root_cert_pem, &cfg.ca_cert_path) {
                (Some(pem), _) => Some(pem),
                (None, Some(path)) => Some(std::fs::read(path).map_err(|e| {
                    Error::Config(format!("reading CA certificate {}: {e}", path.display()))
                })?),
                (None, None) => None,
            };

            tracing::info!(
                tls = cfg.url.starts_with("rediss://"),
                custom_ca = root_cert_pem.is_some(),
                key_expiry_secs = ?cfg.key_expiry_secs,
                "redis session store configured"
            );

            let store = RedisSessionStore::new(RedisOptions {
                url: cfg.url.clone(),
                root_cert_pem,
                key_expiry_secs: cfg.key_expiry_secs,
                scan_batch: cfg.scan_batch,
            })?;
            Ok(Arc::new(store))
        }
    }
}

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session store connection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "d_backend")]
    pub backend: StoreBackend,
    /// `redis://` or `rediss://` connection URL.
    #[serde(default = "d_redis_url")]
    pub url: String,
    /// PEM root certificate used to verify a `rediss://` server.
    #[serde(default)]
    pub ca_cert_path: Option<PathBuf>,
    /// IBM Cloud Databases credentials JSON.  When set, the URL and root
    /// certificate are read from it and override `url` / `ca_cert_path`.
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
    /// Server-side expiry applied to every write (`SET .. EX`).  Keys are
    /// never expired by the store when `None`.
    #[serde(default)]
    pub key_expiry_secs: Option<u64>,
    /// `COUNT` hint for `SCAN` during a full flush.
    #[serde(default = "d_500")]
    pub scan_batch: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    /// Process-local map.  Only suitable for a single instance.
    Memory,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Redis,
            url: d_redis_url(),
            ca_cert_path: None,
            credentials_file: None,
            key_expiry_secs: None,
            scan_batch: 500,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_backend() -> StoreBackend {
    StoreBackend::Redis
}
fn d_redis_url() -> String {
    "redis://127.0.0.1:6379".into()
}
fn d_500() -> usize {
    500
}

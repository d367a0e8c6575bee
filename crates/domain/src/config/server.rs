use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Server
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_5000")]
    pub port: u16,
    #[serde(default = "d_host")]
    pub host: String,
    /// Redirect plain-HTTP requests to `https://`.  The scheme is taken from
    /// `X-Forwarded-Proto`, so this only makes sense behind a TLS-terminating
    /// proxy.
    #[serde(default)]
    pub require_https: bool,
    /// Environment variable holding the admin bearer token for maintenance
    /// endpoints (`/clean_redis`).
    /// If unset, the server logs a warning and leaves them open.
    #[serde(default = "d_admin_token_env")]
    pub admin_token_env: String,
    /// Upper bound on in-flight requests (backpressure).
    #[serde(default = "d_256")]
    pub max_concurrent_requests: usize,
    /// Per-IP token-bucket rate limiting configuration.
    /// When `None` (the default), rate limiting is disabled.
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "127.0.0.1".into(),
            require_https: false,
            admin_token_env: d_admin_token_env(),
            max_concurrent_requests: 256,
            rate_limit: None,
        }
    }
}

/// Per-IP token-bucket rate limiting configuration.
///
/// `requests_per_second` controls the replenishment rate, while `burst_size`
/// sets the maximum number of requests a single IP can send in a quick burst
/// before being throttled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_second: u64,
    pub burst_size: u32,
}

// ── serde default helpers ───────────────────────────────────────────

fn d_5000() -> u16 {
    5000
}
fn d_host() -> String {
    "127.0.0.1".into()
}
fn d_admin_token_env() -> String {
    "SB_ADMIN_TOKEN".into()
}
fn d_256() -> usize {
    256
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

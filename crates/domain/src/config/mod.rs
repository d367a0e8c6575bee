mod affinity;
mod engine;
mod observability;
mod server;
mod store;

pub use affinity::*;
pub use engine::*;
pub use observability::*;
pub use server::*;
pub use store::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub affinity: AffinityConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn error(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Credential files are not opened here; an engine with neither an
    /// inline assistant id nor a credentials file is reported.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }
        if self.server.max_concurrent_requests == 0 {
            errors.push(ConfigError::error(
                "server.max_concurrent_requests",
                "must be greater than 0",
            ));
        }
        if let Some(rl) = &self.server.rate_limit {
            if rl.requests_per_second == 0 || rl.burst_size == 0 {
                errors.push(ConfigError::error(
                    "server.rate_limit",
                    "requests_per_second and burst_size must be > 0",
                ));
            }
        }

        if self.store.backend == StoreBackend::Redis
            && self.store.credentials_file.is_none()
            && !(self.store.url.starts_with("redis://") || self.store.url.starts_with("rediss://"))
        {
            errors.push(ConfigError::error(
                "store.url",
                "must start with redis:// or rediss://",
            ));
        }
        if self.store.backend == StoreBackend::Redis
            && self.store.credentials_file.is_none()
            && self.store.url.starts_with("redis://")
        {
            errors.push(ConfigError::warning(
                "store.url",
                "plain redis:// connection is not encrypted",
            ));
        }
        if self.store.backend == StoreBackend::Memory {
            errors.push(ConfigError::warning(
                "store.backend",
                "memory backend is process-local; affinity is lost on restart and not shared across replicas",
            ));
        }
        if self.store.scan_batch == 0 {
            errors.push(ConfigError::error("store.scan_batch", "must be greater than 0"));
        }
        if self.store.key_expiry_secs == Some(0) {
            errors.push(ConfigError::error("store.key_expiry_secs", "must be greater than 0"));
        }

        if self.engine.credentials_file.is_none() {
            if self.engine.assistant_id.is_empty() {
                errors.push(ConfigError::error(
                    "engine.assistant_id",
                    "assistant_id must be set (inline or via engine.credentials_file)",
                ));
            }
            if self.engine.base_url.is_empty() {
                errors.push(ConfigError::error("engine.base_url", "base_url must not be empty"));
            }
            if self.engine.resolve_api_key().is_none() {
                errors.push(ConfigError::warning(
                    "engine.api_key",
                    format!(
                        "no API key inline and {} is unset; requests will be unauthenticated",
                        self.engine.api_key_env
                    ),
                ));
            }
        }
        if self.engine.timeout_ms == 0 {
            errors.push(ConfigError::error("engine.timeout_ms", "must be greater than 0"));
        }

        if self.maintenance.sweep_interval_secs == Some(0) {
            errors.push(ConfigError::error(
                "maintenance.sweep_interval_secs",
                "must be greater than 0",
            ));
        }

        errors
    }
}

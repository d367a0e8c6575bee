//! AppState construction and background-task spawning extracted from `main.rs`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sha2::{Digest, Sha256};

use sb_domain::clock::SystemClock;
use sb_domain::config::{Config, EngineConfig, ServerConfig, StoreConfig};
use sb_engine::DialogEngine;
use sb_sessions::{AffinityCache, SessionStore, Sweeper};

use crate::credentials::{EngineCredentials, StoreCredentials};
use crate::state::AppState;

/// Idle per-identifier locks are dropped on this period.
const LOCK_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Open the session store, folding in `store.credentials_file` if set.
///
/// The connection itself is lazy; an unreachable store surfaces on the
/// first request, not here.
pub fn open_store(cfg: &StoreConfig) -> anyhow::Result<Arc<dyn SessionStore>> {
    let mut cfg = cfg.clone();
    let root_cert_pem = match cfg.credentials_file.clone() {
        Some(path) => {
            let creds = StoreCredentials::load(&path)?;
            creds.apply(&mut cfg);
            tracing::info!(path = %path.display(), "store credentials loaded");
            creds.root_cert_pem
        }
        None => None,
    };
    sb_sessions::create_store(&cfg, root_cert_pem).context("building session store")
}

/// Build the dialog engine client, folding in `engine.credentials_file` if set.
pub fn open_engine(cfg: &EngineConfig) -> anyhow::Result<Arc<dyn DialogEngine>> {
    let mut cfg = cfg.clone();
    if let Some(path) = cfg.credentials_file.clone() {
        EngineCredentials::load(&path)?.apply(&mut cfg);
        tracing::info!(path = %path.display(), "engine credentials loaded");
    }
    sb_engine::create_engine(&cfg).context("building dialog engine client")
}

/// Read the admin token once and keep only its digest.
pub fn admin_token_hash(server: &ServerConfig) -> Option<Vec<u8>> {
    let env_var = &server.admin_token_env;
    match std::env::var(env_var).ok().filter(|t| !t.is_empty()) {
        Some(token) => {
            tracing::info!(source = %format!("env:{env_var}"), "admin bearer-token auth enabled");
            Some(Sha256::digest(token.as_bytes()).to_vec())
        }
        None => {
            tracing::warn!(
                "admin bearer-token auth DISABLED; set the {env_var} env var to protect /clean_redis"
            );
            None
        }
    }
}

/// Assemble the shared state for the HTTP server.
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    let store = open_store(&config.store)?;
    let engine = open_engine(&config.engine)?;

    let cache = AffinityCache::new(store.clone(), engine, Arc::new(SystemClock))
        .with_single_flight(config.affinity.single_flight);
    tracing::info!(
        single_flight = config.affinity.single_flight,
        "session affinity cache ready"
    );

    Ok(AppState {
        admin_token_hash: admin_token_hash(&config.server),
        cache: Arc::new(cache),
        sweeper: Arc::new(Sweeper::new(store)),
        config,
    })
}

/// Spawn the long-running background tokio tasks (lock pruning and the
/// optional scheduled sweep).
pub fn spawn_background_tasks(state: &AppState) {
    // ── Periodic session lock pruning ────────────────────────────────
    if let Some(locks) = state.cache.lock_map() {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(LOCK_PRUNE_INTERVAL);
            loop {
                interval.tick().await;
                locks.prune_idle();
            }
        });
    }

    // ── Scheduled store sweep ────────────────────────────────────────
    match state.config.maintenance.sweep_interval_secs.filter(|s| *s > 0) {
        Some(secs) => {
            tracing::info!(every_secs = secs, "scheduled store sweep enabled");
            state.sweeper.clone().spawn_periodic(Duration::from_secs(secs));
        }
        None => tracing::info!("scheduled store sweep disabled"),
    }

    tracing::info!("background tasks spawned");
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_domain::config::StoreBackend;

    #[test]
    fn admin_token_is_hashed_when_set() {
        let server = ServerConfig {
            admin_token_env: "SB_TEST_ADMIN_TOKEN_BOOTSTRAP".into(),
            ..Default::default()
        };
        std::env::set_var(&server.admin_token_env, "hunter2");
        let hash = admin_token_hash(&server).unwrap();
        std::env::remove_var(&server.admin_token_env);

        assert_eq!(hash, Sha256::digest(b"hunter2").to_vec());
    }

    #[test]
    fn admin_token_absent_means_open() {
        let server = ServerConfig {
            admin_token_env: "SB_TEST_ADMIN_TOKEN_UNSET".into(),
            ..Default::default()
        };
        assert!(admin_token_hash(&server).is_none());
    }

    #[test]
    fn engine_requires_assistant_id() {
        assert!(open_engine(&EngineConfig::default()).is_err());
    }

    #[test]
    fn memory_store_opens_without_credentials() {
        let cfg = StoreConfig {
            backend: StoreBackend::Memory,
            ..Default::default()
        };
        assert!(open_store(&cfg).is_ok());
    }

    #[test]
    fn store_credentials_file_must_exist() {
        let cfg = StoreConfig {
            credentials_file: Some("/nonexistent/iredis_credentials.json".into()),
            ..Default::default()
        };
        assert!(open_store(&cfg).is_err());
    }
}

//! Redis-backed [`SessionStore`].
//!
//! One multiplexed connection is shared by all requests.  It is opened on
//! first use, so the gateway starts even when Redis is down, and dropped
//! after connection-level failures so the next call reconnects.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError, TlsCertificates};
use tokio::sync::Mutex;

use sb_domain::error::{Error, Result};

use crate::store::SessionStore;

/// Connection settings for [`RedisSessionStore`].
#[derive(Debug, Clone)]
pub struct RedisOptions {
    /// `redis://` or `rediss://` URL.
    pub url: String,
    /// PEM root certificate for `rediss://` servers with a private CA.
    pub root_cert_pem: Option<Vec<u8>>,
    /// Expiry applied to every `set`, in seconds.
    pub key_expiry_secs: Option<u64>,
    /// `COUNT` hint for `SCAN`.
    pub scan_batch: usize,
}

pub struct RedisSessionStore {
    client: Client,
    conn: Mutex<Option<MultiplexedConnection>>,
    key_expiry_secs: Option<u64>,
    scan_batch: usize,
}

impl RedisSessionStore {
    /// Build the client.  No network I/O happens here.
    pub fn new(opts: RedisOptions) -> Result<Self> {
        let client = match opts.root_cert_pem {
            Some(root_cert) => Client::build_with_tls(
                opts.url.as_str(),
                TlsCertificates {
                    client_tls: None,
                    root_cert: Some(root_cert),
                },
            ),
            None => Client::open(opts.url.as_str()),
        }
        .map_err(|e| Error::Config(format!("invalid store url: {e}")))?;

        Ok(Self {
            client,
            conn: Mutex::new(None),
            key_expiry_secs: opts.key_expiry_secs,
            scan_batch: opts.scan_batch.max(1),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("connecting to redis: {e}")))?;
        tracing::info!("redis connection established");
        *guard = Some(conn.clone());
        Ok(conn)
    }

    /// Map a command failure, forgetting the shared connection when the
    /// failure means it is no longer usable.
    async fn fail(&self, op: &str, e: RedisError) -> Error {
        if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
            tracing::warn!(op, error = %e, "redis connection lost, will reconnect");
            *self.conn.lock().await = None;
        }
        Error::StoreUnavailable(format!("redis {op}: {e}"))
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        // Bytes, not String: a non-UTF-8 value is the decoder's problem,
        // not a store failure.
        let value: redis::RedisResult<Option<Vec<u8>>> = conn.get(key).await;
        match value {
            Ok(value) => Ok(value),
            Err(e) => Err(self.fail("GET", e).await),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let result: redis::RedisResult<()> = match self.key_expiry_secs {
            Some(secs) => conn.set_ex(key, value, secs).await,
            None => conn.set(key, value).await,
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail("SET", e).await),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let removed: redis::RedisResult<u64> = conn.del(key).await;
        match removed {
            Ok(n) => Ok(n > 0),
            Err(e) => Err(self.fail("DEL", e).await),
        }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;
        let mut cursor: u64 = 0;
        let mut all = Vec::new();
        loop {
            let page: redis::RedisResult<(u64, Vec<String>)> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("COUNT")
                .arg(self.scan_batch)
                .query_async(&mut conn)
                .await;
            let (next, keys) = match page {
                Ok(page) => page,
                Err(e) => return Err(self.fail("SCAN", e).await),
            };
            all.extend(keys);
            if next == 0 {
                return Ok(all);
            }
            cursor = next;
        }
    }

    /// Walk the keyspace with `SCAN` and delete each page as it arrives.
    ///
    /// `SCAN` may return a key more than once; the count only includes
    /// keys `DEL` actually removed.
    async fn delete_all(&self) -> Result<u64> {
        let mut conn = self.connection().await?;
        let mut cursor: u64 = 0;
        let mut deleted = 0;
        loop {
            let page: redis::RedisResult<(u64, Vec<String>)> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("COUNT")
                .arg(self.scan_batch)
                .query_async(&mut conn)
                .await;
            let (next, keys) = match page {
                Ok(page) => page,
                Err(e) => return Err(self.fail("SCAN", e).await),
            };

            if !keys.is_empty() {
                let removed: redis::RedisResult<u64> = conn.del(&keys).await;
                match removed {
                    Ok(n) => deleted += n,
                    Err(e) => return Err(self.fail("DEL", e).await),
                }
            }

            if next == 0 {
                return Ok(deleted);
            }
            cursor = next;
        }
    }
}

//! Session affinity cache.
//!
//! Maps an external identifier to a live dialog engine session.  Every call
//! reloads the record from the store: a fresh record is reused as is (no
//! sliding renewal on use), while a missing, undecodable or expired one is
//! replaced by a newly minted session before anything is sent.
//!
//! The read-decide-write section is not atomic against the store.  With
//! single-flight enabled, concurrent calls for one identifier in this
//! process are serialized so they mint one session between them; replicas
//! can still race, and the last write wins.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use sb_domain::clock::Clock;
use sb_domain::error::{Error, Result};
use sb_domain::trace::TraceEvent;
use sb_engine::{check_session_id, DialogEngine, OutputSegment};

use crate::lock::SessionLockMap;
use crate::record::{self, session_ttl, DecodeError, SessionRecord};
use crate::reply::{self, ReplyEnvelope};
use crate::store::SessionStore;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Resolution outcome
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How the session for a request was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A fresh record was found and reused.
    Hit,
    /// No record existed.
    Created,
    /// The stored record had expired.
    Renewed { previous_session_id: String },
    /// The stored value could not be decoded and was overwritten.
    Replaced { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSession {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub resolution: Resolution,
}

impl ResolvedSession {
    /// Whether a new remote session was minted for this request.
    pub fn is_new(&self) -> bool {
        self.resolution != Resolution::Hit
    }
}

/// Why the stored value cannot be used.
enum Stale {
    Missing,
    Undecodable(DecodeError),
    Expired(SessionRecord),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Cache
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct AffinityCache {
    store: Arc<dyn SessionStore>,
    engine: Arc<dyn DialogEngine>,
    clock: Arc<dyn Clock>,
    locks: Option<Arc<SessionLockMap>>,
    ttl: Duration,
}

impl AffinityCache {
    /// Build a cache over the given collaborators, with single-flight on.
    pub fn new(
        store: Arc<dyn SessionStore>,
        engine: Arc<dyn DialogEngine>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            engine,
            clock,
            locks: Some(Arc::new(SessionLockMap::new())),
            ttl: session_ttl(),
        }
    }

    /// Turn the per-identifier guard on or off.  Off reproduces the
    /// unguarded read-decide-write behaviour.
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.locks = enabled.then(|| Arc::new(SessionLockMap::new()));
        self
    }

    /// The per-identifier lock map, if single-flight is on.
    pub fn lock_map(&self) -> Option<Arc<SessionLockMap>> {
        self.locks.clone()
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Return a live session for `identifier`, minting one if needed.
    pub async fn resolve(&self, identifier: &str) -> Result<ResolvedSession> {
        if identifier.is_empty() {
            return Err(Error::InvalidInput("identifier must not be empty".into()));
        }

        let _guard = match &self.locks {
            Some(locks) => Some(locks.acquire(identifier).await),
            None => None,
        };

        let stale = match self.store.get(identifier).await? {
            None => Stale::Missing,
            Some(raw) => match record::decode_bytes(&raw) {
                Ok(record) if record.is_fresh(self.clock.now(), self.ttl) => {
                    tracing::debug!(identifier, session_id = %record.session_id, "session cache hit");
                    return Ok(ResolvedSession {
                        session_id: record.session_id,
                        created_at: record.created_at,
                        resolution: Resolution::Hit,
                    });
                }
                Ok(record) => Stale::Expired(record),
                Err(e) => Stale::Undecodable(e),
            },
        };

        self.mint(identifier, stale).await
    }

    /// Resolve the session, then forward `message` (if any) and render the
    /// engine's reply.  Without a message only the session is resolved and
    /// the envelope is empty.
    pub async fn resolve_and_send(
        &self,
        identifier: &str,
        message: Option<&str>,
    ) -> Result<ReplyEnvelope> {
        let resolved = self.resolve(identifier).await?;
        match message {
            Some(text) => {
                let segments = self.engine.send_message(&resolved.session_id, text).await?;
                Ok(reply::render(&segments))
            }
            None => Ok(ReplyEnvelope::default()),
        }
    }

    /// Resolve the session and forward `message`, returning the engine's
    /// segments untouched.
    pub async fn send_raw(
        &self,
        identifier: &str,
        message: &str,
    ) -> Result<(ResolvedSession, Vec<OutputSegment>)> {
        let resolved = self.resolve(identifier).await?;
        let segments = self.engine.send_message(&resolved.session_id, message).await?;
        Ok((resolved, segments))
    }

    /// Forward `message` to a session id the caller already holds.  The
    /// store is not consulted, and ids that are not a single path segment
    /// are rejected before the engine is called.
    pub async fn send_to_session(&self, session_id: &str, message: &str) -> Result<Vec<OutputSegment>> {
        check_session_id(session_id)?;
        self.engine.send_message(session_id, message).await
    }

    async fn mint(&self, identifier: &str, stale: Stale) -> Result<ResolvedSession> {
        let session_id = self.engine.create_session().await?;
        let record = SessionRecord::new(session_id, self.clock.now());
        let encoded = record.encode().map_err(|e| {
            Error::EngineUnavailable(format!("engine returned an unusable session id: {e}"))
        })?;
        self.store.set(identifier, &encoded).await?;

        let resolution = match stale {
            Stale::Missing => Resolution::Created,
            Stale::Expired(previous) => {
                TraceEvent::SessionRenewed {
                    identifier: identifier.to_owned(),
                    old_session_id: previous.session_id.clone(),
                    new_session_id: record.session_id.clone(),
                    age_secs: previous.age(record.created_at).num_seconds(),
                }
                .emit();
                Resolution::Renewed {
                    previous_session_id: previous.session_id,
                }
            }
            Stale::Undecodable(e) => {
                let reason = e.to_string();
                TraceEvent::StoredRecordDiscarded {
                    identifier: identifier.to_owned(),
                    reason: reason.clone(),
                }
                .emit();
                Resolution::Replaced { reason }
            }
        };

        TraceEvent::SessionResolved {
            identifier: identifier.to_owned(),
            session_id: record.session_id.clone(),
            is_new: true,
        }
        .emit();

        Ok(ResolvedSession {
            session_id: record.session_id,
            created_at: record.created_at,
            resolution,
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySessionStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use parking_lot::Mutex;
    use sb_domain::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Engine double that hands out `s1`, `s2`, ... and replies with a
    /// fixed script.
    #[derive(Default)]
    struct ScriptedEngine {
        created: AtomicUsize,
        sent: Mutex<Vec<(String, String)>>,
        reply: Vec<OutputSegment>,
        fail_create: bool,
        fail_send: bool,
        session_id_override: Option<String>,
    }

    #[async_trait]
    impl DialogEngine for ScriptedEngine {
        async fn create_session(&self) -> Result<String> {
            if self.fail_create {
                return Err(Error::EngineUnavailable("create failed".into()));
            }
            let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
            // Let concurrent callers interleave.
            tokio::task::yield_now().await;
            Ok(self
                .session_id_override
                .clone()
                .unwrap_or_else(|| format!("s{n}")))
        }

        async fn send_message(&self, session_id: &str, text: &str) -> Result<Vec<OutputSegment>> {
            if self.fail_send {
                return Err(Error::EngineUnavailable("send failed".into()));
            }
            self.sent.lock().push((session_id.to_owned(), text.to_owned()));
            Ok(self.reply.clone())
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    struct Harness {
        store: Arc<MemorySessionStore>,
        engine: Arc<ScriptedEngine>,
        clock: Arc<ManualClock>,
        cache: AffinityCache,
    }

    fn harness(engine: ScriptedEngine) -> Harness {
        let store = Arc::new(MemorySessionStore::new());
        let engine = Arc::new(engine);
        let clock = Arc::new(ManualClock::new(t0()));
        let cache = AffinityCache::new(store.clone(), engine.clone(), clock.clone());
        Harness {
            store,
            engine,
            clock,
            cache,
        }
    }

    fn hello_engine() -> ScriptedEngine {
        ScriptedEngine {
            reply: vec![OutputSegment::text("hello")],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn first_contact_creates_and_persists() {
        let h = harness(hello_engine());

        let envelope = h.cache.resolve_and_send("u1", Some("hi")).await.unwrap();

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            serde_json::json!({ "messages": [{ "text": "hello" }] })
        );
        assert_eq!(h.engine.created.load(Ordering::SeqCst), 1);
        assert_eq!(
            h.engine.sent.lock().clone(),
            vec![("s1".to_string(), "hi".to_string())]
        );
        assert_eq!(
            h.store.get("u1").await.unwrap().as_deref(),
            Some(&b"s1$2026-03-01T12:00:00Z"[..])
        );
    }

    #[tokio::test]
    async fn fresh_record_is_reused_without_renewal() {
        let h = harness(hello_engine());
        let first = h.cache.resolve("u1").await.unwrap();
        assert_eq!(first.resolution, Resolution::Created);

        for minutes in [1, 3, 5] {
            h.clock.set(t0() + Duration::minutes(minutes));
            let again = h.cache.resolve("u1").await.unwrap();
            assert_eq!(again.session_id, "s1");
            assert_eq!(again.resolution, Resolution::Hit);
            assert!(!again.is_new());
        }

        assert_eq!(h.engine.created.load(Ordering::SeqCst), 1);
        // Reads never touch the stored timestamp.
        assert_eq!(
            h.store.get("u1").await.unwrap().as_deref(),
            Some(&b"s1$2026-03-01T12:00:00Z"[..])
        );
    }

    #[tokio::test]
    async fn expired_record_is_renewed_once() {
        let h = harness(hello_engine());
        h.cache.resolve("u1").await.unwrap();

        h.clock.advance(Duration::minutes(5) + Duration::seconds(1));
        let renewed = h.cache.resolve("u1").await.unwrap();
        assert_eq!(renewed.session_id, "s2");
        assert_eq!(
            renewed.resolution,
            Resolution::Renewed {
                previous_session_id: "s1".into()
            }
        );
        assert_eq!(renewed.created_at, h.clock.now());
        assert_eq!(
            h.store.get("u1").await.unwrap().as_deref(),
            Some(&b"s2$2026-03-01T12:05:01Z"[..])
        );

        let after = h.cache.resolve("u1").await.unwrap();
        assert_eq!(after.session_id, "s2");
        assert_eq!(h.engine.created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn malformed_values_are_misses() {
        let h = harness(hello_engine());
        for (i, raw) in ["garbage", "s9$Thu Jun 20 04:00:11 2019", "$2026-03-01T12:00:00Z"]
            .into_iter()
            .enumerate()
        {
            h.store.set("u1", raw).await.unwrap();
            let resolved = h.cache.resolve("u1").await.unwrap();
            assert!(matches!(resolved.resolution, Resolution::Replaced { .. }));
            assert_eq!(resolved.session_id, format!("s{}", i + 1));
        }
    }

    #[tokio::test]
    async fn non_utf8_value_is_replaced_not_an_outage() {
        let h = harness(hello_engine());
        h.store.insert_raw("u1", b"s1$\xff\xfe2026".to_vec());

        let resolved = h.cache.resolve("u1").await.unwrap();
        match &resolved.resolution {
            Resolution::Replaced { reason } => assert!(reason.contains("UTF-8"), "{reason}"),
            other => panic!("expected Replaced, got {other:?}"),
        }
        assert_eq!(
            h.store.get("u1").await.unwrap().as_deref(),
            Some(&b"s1$2026-03-01T12:00:00Z"[..])
        );
    }

    #[tokio::test]
    async fn resolve_only_sends_nothing() {
        let h = harness(hello_engine());
        let envelope = h.cache.resolve_and_send("u1", None).await.unwrap();
        assert!(envelope.messages.is_empty());
        assert_eq!(h.engine.created.load(Ordering::SeqCst), 1);
        assert!(h.engine.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn empty_identifier_is_rejected_before_any_io() {
        let h = harness(hello_engine());
        assert!(matches!(
            h.cache.resolve_and_send("", Some("hi")).await,
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(h.engine.created.load(Ordering::SeqCst), 0);
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn create_failure_propagates_and_stores_nothing() {
        let h = harness(ScriptedEngine {
            fail_create: true,
            ..Default::default()
        });
        assert!(matches!(
            h.cache.resolve_and_send("u1", Some("hi")).await,
            Err(Error::EngineUnavailable(_))
        ));
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn send_failure_is_not_masked_as_fallback() {
        let h = harness(ScriptedEngine {
            fail_send: true,
            ..Default::default()
        });
        assert!(matches!(
            h.cache.resolve_and_send("u1", Some("hi")).await,
            Err(Error::EngineUnavailable(_))
        ));
        // The session was still established.
        assert!(h.store.get("u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn session_id_with_separator_is_refused() {
        let h = harness(ScriptedEngine {
            session_id_override: Some("bad$id".into()),
            ..Default::default()
        });
        assert!(matches!(
            h.cache.resolve("u1").await,
            Err(Error::EngineUnavailable(_))
        ));
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn concurrent_first_contact_mints_once() {
        let h = harness(hello_engine());
        let cache = Arc::new(h.cache);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.resolve("u1").await.unwrap().session_id })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap(), "s1");
        }
        assert_eq!(h.engine.created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unguarded_first_contact_can_mint_twice() {
        let h = harness(hello_engine());
        let cache = Arc::new(h.cache.with_single_flight(false));
        assert!(cache.lock_map().is_none());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.resolve("u1").await.unwrap().session_id })
            })
            .collect();

        let mut session_ids = Vec::new();
        for task in tasks {
            session_ids.push(task.await.unwrap());
        }
        session_ids.sort();
        session_ids.dedup();

        // Every caller read the empty slot before any mint landed.
        let created = h.engine.created.load(Ordering::SeqCst);
        assert!(created > 1, "created {created}");
        assert!(session_ids.len() > 1, "{session_ids:?}");
        // Last write wins; the stored record names one of the minted ids.
        let stored = h.store.get("u1").await.unwrap().unwrap();
        let record = record::decode_bytes(&stored).unwrap();
        assert!(session_ids.contains(&record.session_id));
    }

    #[tokio::test]
    async fn send_to_session_rejects_ids_that_leave_the_path() {
        let h = harness(hello_engine());
        for id in ["", "..", "../../v1/workspaces", "s1?version=x", "s1#x", "a/b"] {
            assert!(
                matches!(
                    h.cache.send_to_session(id, "hi").await,
                    Err(Error::InvalidInput(_))
                ),
                "{id}"
            );
        }
        assert!(h.engine.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn send_to_session_bypasses_store() {
        let h = harness(hello_engine());
        let segments = h.cache.send_to_session("given", "hi").await.unwrap();
        assert_eq!(segments.len(), 1);
        assert!(h.store.is_empty());
        assert_eq!(h.engine.created.load(Ordering::SeqCst), 0);
    }
}

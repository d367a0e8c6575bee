//! REST implementation of [`DialogEngine`] for Watson Assistant v2.
//!
//! `WatsonAssistantClient` wraps a `reqwest::Client`.  Every operation is a
//! single HTTP call: failures are reported to the caller, never retried.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use sb_domain::config::EngineConfig;
use sb_domain::error::{Error, Result};
use sb_domain::trace::TraceEvent;
use uuid::Uuid;

use crate::provider::{check_session_id, DialogEngine};
use crate::types::{CreateSessionResponse, MessageRequest, MessageResponse, OutputSegment};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A REST client for one Watson Assistant.
///
/// Created once and shared for the lifetime of the process.  The
/// underlying `reqwest::Client` keeps a connection pool.
#[derive(Debug, Clone)]
pub struct WatsonAssistantClient {
    http: Client,
    base_url: Url,
    assistant_id: String,
    version: String,
    api_key: Option<String>,
}

impl WatsonAssistantClient {
    /// Build a new client from the engine section of the config.
    pub fn new(cfg: &EngineConfig) -> Result<Self> {
        if cfg.assistant_id.is_empty() {
            return Err(Error::Config("engine.assistant_id must be set".into()));
        }
        let base_url = Url::parse(&cfg.base_url)
            .map_err(|e| Error::Config(format!("engine.base_url {:?}: {e}", cfg.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "engine.base_url {:?} cannot carry a path",
                cfg.base_url
            )));
        }

        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            assistant_id: cfg.assistant_id.clone(),
            version: cfg.version.clone(),
            api_key: cfg.resolve_api_key(),
        })
    }

    // ── request helpers ──────────────────────────────────────────────

    /// `base_url` with `segments` appended, each percent-encoded as a
    /// single path segment.
    fn url_with<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Config("engine.base_url cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn sessions_url(&self) -> Result<Url> {
        self.url_with(["v2", "assistants", self.assistant_id.as_str(), "sessions"])
    }

    fn message_url(&self, session_id: &str) -> Result<Url> {
        check_session_id(session_id)?;
        self.url_with([
            "v2",
            "assistants",
            self.assistant_id.as_str(),
            "sessions",
            session_id,
            "message",
        ])
    }

    /// Attach auth, the API version and a trace id.
    fn decorate(&self, rb: RequestBuilder) -> RequestBuilder {
        let rb = rb
            .query(&[("version", self.version.as_str())])
            .header("X-Request-Id", Uuid::new_v4().to_string());

        match &self.api_key {
            Some(key) => rb.basic_auth("apikey", Some(key)),
            None => rb,
        }
    }

    /// Send once, emit a `DialogEngineCall` event, and turn non-2xx
    /// responses into errors.
    async fn execute(&self, endpoint: &str, rb: RequestBuilder) -> Result<Response> {
        let start = Instant::now();
        let result = self.decorate(rb).send().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                TraceEvent::DialogEngineCall {
                    endpoint: endpoint.to_owned(),
                    status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                    duration_ms,
                }
                .emit();
                return Err(from_reqwest(e));
            }
        };

        let status = resp.status();
        TraceEvent::DialogEngineCall {
            endpoint: endpoint.to_owned(),
            status: status.as_u16(),
            duration_ms,
        }
        .emit();

        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Auth(format!("{endpoint} auth failed ({status}): {body}")));
        }
        Err(Error::EngineUnavailable(format!(
            "{endpoint} returned {status}: {body}"
        )))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
impl DialogEngine for WatsonAssistantClient {
    async fn create_session(&self) -> Result<String> {
        let resp = self
            .execute("POST /v2/assistants/{id}/sessions", self.http.post(self.sessions_url()?))
            .await?;

        let body = resp.text().await.map_err(from_reqwest)?;
        let parsed: CreateSessionResponse = serde_json::from_str(&body).map_err(|e| {
            Error::EngineUnavailable(format!("failed to parse session response: {e}: {body}"))
        })?;

        if parsed.session_id.is_empty() {
            return Err(Error::EngineUnavailable("engine returned an empty session_id".into()));
        }
        tracing::debug!(session_id = %parsed.session_id, "dialog session created");
        Ok(parsed.session_id)
    }

    async fn send_message(&self, session_id: &str, text: &str) -> Result<Vec<OutputSegment>> {
        let url = self.message_url(session_id)?;
        let req = MessageRequest::text(text);
        let resp = self
            .execute(
                "POST /v2/assistants/{id}/sessions/{sid}/message",
                self.http.post(url).json(&req),
            )
            .await?;

        let body = resp.text().await.map_err(from_reqwest)?;
        let parsed: MessageResponse = serde_json::from_str(&body).map_err(|e| {
            Error::EngineUnavailable(format!("failed to parse message response: {e}: {body}"))
        })?;
        Ok(parsed.output.generic)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error conversion helper
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Convert a `reqwest::Error` into a domain `Error`.
///
/// Timeouts become `Error::Timeout`; everything else is treated as the
/// engine being unreachable.
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::EngineUnavailable(e.to_string())
    }
}

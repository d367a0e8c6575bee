use serde::Serialize;

/// Structured trace events emitted across all SessionBridge crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionResolved {
        identifier: String,
        session_id: String,
        is_new: bool,
    },
    SessionRenewed {
        identifier: String,
        old_session_id: String,
        new_session_id: String,
        age_secs: i64,
    },
    StoredRecordDiscarded {
        identifier: String,
        reason: String,
    },
    DialogEngineCall {
        endpoint: String,
        status: u16,
        duration_ms: u64,
    },
    StoreFlushed {
        deleted: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "sb_event");
    }
}

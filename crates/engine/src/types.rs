//! Wire types for the Watson Assistant v2 API.
//!
//! Only the fields SessionBridge reads are modelled.  Output segments are
//! the exception: each keeps its full JSON so it can be passed on verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// POST /v2/assistants/{id}/sessions response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Messages
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// POST /v2/assistants/{id}/sessions/{sid}/message request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    pub input: MessageInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageInput {
    pub message_type: String,
    pub text: String,
}

impl MessageRequest {
    /// A plain user utterance.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            input: MessageInput {
                message_type: "text".into(),
                text: text.into(),
            },
        }
    }
}

/// POST /v2/assistants/{id}/sessions/{sid}/message response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub output: MessageOutput,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageOutput {
    #[serde(default)]
    pub generic: Vec<OutputSegment>,
}

/// One element of `output.generic`.
///
/// Keeps the segment exactly as the engine sent it, unknown fields and
/// unknown `response_type`s included, next to the typed view this crate
/// renders from.  Serializes back to the original JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct OutputSegment {
    kind: SegmentKind,
    raw: Value,
}

impl OutputSegment {
    /// Wrap a segment as received.  A segment whose known `response_type`
    /// is missing required fields is typed as `Unsupported`.
    pub fn from_raw(raw: Value) -> Self {
        let kind = SegmentKind::deserialize(&raw).unwrap_or(SegmentKind::Unsupported);
        Self { kind, raw }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::from_raw(json!({ "response_type": "text", "text": text.into() }))
    }

    pub fn kind(&self) -> &SegmentKind {
        &self.kind
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

impl From<Value> for OutputSegment {
    fn from(raw: Value) -> Self {
        Self::from_raw(raw)
    }
}

impl From<OutputSegment> for Value {
    fn from(segment: OutputSegment) -> Self {
        segment.raw
    }
}

/// Typed view of a segment, discriminated by `response_type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "response_type", rename_all = "snake_case")]
pub enum SegmentKind {
    Text {
        text: String,
    },
    Image {
        #[serde(default)]
        source: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
    #[serde(rename = "option")]
    Choice {
        #[serde(default)]
        title: String,
        #[serde(default)]
        options: Vec<OptionChoice>,
    },
    /// Any `response_type` this crate does not know about (`pause`,
    /// `connect_to_agent`, `suggestion`, ...).
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OptionChoice {
    pub label: String,
}

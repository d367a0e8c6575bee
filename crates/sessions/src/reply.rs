//! Rendering of dialog engine output into caller-facing reply messages.
//!
//! Only text segments carry through.  Every other segment type becomes a
//! fixed fallback message in its place so the caller still sees one reply
//! per segment, in order.

use serde::{Deserialize, Serialize};

use sb_engine::{OutputSegment, SegmentKind};

/// Reply text used for segment types that are not rendered.
pub const FALLBACK_TEXT: &str = "service unavailable";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyMessage {
    pub text: String,
}

/// `{"messages": [...]}`, the body returned to the messaging platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    pub messages: Vec<ReplyMessage>,
}

impl ReplyMessage {
    pub fn from_segment(segment: &OutputSegment) -> Self {
        let text = match segment.kind() {
            SegmentKind::Text { text } => text.clone(),
            SegmentKind::Image { .. } => FALLBACK_TEXT.to_owned(),
            SegmentKind::Choice { .. } => FALLBACK_TEXT.to_owned(),
            SegmentKind::Unsupported => FALLBACK_TEXT.to_owned(),
        };
        Self { text }
    }
}

pub fn render(segments: &[OutputSegment]) -> ReplyEnvelope {
    ReplyEnvelope {
        messages: segments.iter().map(ReplyMessage::from_segment).collect(),
    }
}

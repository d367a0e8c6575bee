//! Session records and their string encoding in the store.
//!
//! A record is stored as `"<session_id>$<created_at>"` under the external
//! identifier.  `created_at` is RFC 3339 in UTC with only as many fractional
//! digits as needed, so encoding never loses precision.  The session id must
//! not contain `$`: decoding splits on the first separator.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Separator between the session id and the timestamp.
pub const SEPARATOR: char = '$';

/// How long a record stays fresh after it was minted, in seconds.
pub const SESSION_TTL_SECS: i64 = 5 * 60;

/// [`SESSION_TTL_SECS`] as a `Duration`.
pub fn session_ttl() -> Duration {
    Duration::seconds(SESSION_TTL_SECS)
}

/// A remote session id and the time it was minted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(session_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            created_at,
        }
    }

    /// Time elapsed since the record was minted.  Negative when `now` is
    /// behind `created_at` (clock skew between replicas).
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.created_at)
    }

    /// A record is fresh while its age is at most `ttl`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) <= ttl
    }

    pub fn encode(&self) -> Result<String, CodecError> {
        encode(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("session id {0:?} contains the '$' separator")]
    SeparatorInSessionId(String),
    #[error("session id is empty")]
    EmptySessionId,
}

/// Why a stored value could not be read back as a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("stored value is not valid UTF-8: {0}")]
    InvalidUtf8(String),
    #[error("no '$' separator in stored value")]
    MissingSeparator,
    #[error("empty session id in stored value")]
    EmptySessionId,
    #[error("unparsable timestamp {raw:?}: {reason}")]
    InvalidTimestamp { raw: String, reason: String },
}

pub fn encode(record: &SessionRecord) -> Result<String, CodecError> {
    if record.session_id.is_empty() {
        return Err(CodecError::EmptySessionId);
    }
    if record.session_id.contains(SEPARATOR) {
        return Err(CodecError::SeparatorInSessionId(record.session_id.clone()));
    }
    Ok(format!(
        "{}{SEPARATOR}{}",
        record.session_id,
        record.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    ))
}

/// Decode a value as read from the store.
pub fn decode_bytes(raw: &[u8]) -> Result<SessionRecord, DecodeError> {
    let raw = std::str::from_utf8(raw).map_err(|e| DecodeError::InvalidUtf8(e.to_string()))?;
    decode(raw)
}

pub fn decode(raw: &str) -> Result<SessionRecord, DecodeError> {
    let (session_id, timestamp) = raw
        .split_once(SEPARATOR)
        .ok_or(DecodeError::MissingSeparator)?;

    if session_id.is_empty() {
        return Err(DecodeError::EmptySessionId);
    }

    let created_at = DateTime::parse_from_rfc3339(timestamp)
        .map_err(|e| DecodeError::InvalidTimestamp {
            raw: timestamp.to_owned(),
            reason: e.to_string(),
        })?
        .with_timezone(&Utc);

    Ok(SessionRecord::new(session_id, created_at))
}

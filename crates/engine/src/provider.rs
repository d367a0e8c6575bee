//! The `DialogEngine` trait: the contract SessionBridge needs from a
//! conversational service (REST client, test double).

use async_trait::async_trait;
use sb_domain::error::{Error, Result};

use crate::types::OutputSegment;

/// Abstraction over the remote dialog engine.
///
/// Both operations are all-or-nothing: a failure leaves no partial state
/// behind that the caller must clean up.
#[async_trait]
pub trait DialogEngine: Send + Sync {
    /// Allocate a new remote conversation and return its id.
    async fn create_session(&self) -> Result<String>;

    /// Send one user utterance to `session_id` and return the engine's
    /// output segments in order.
    async fn send_message(&self, session_id: &str, text: &str) -> Result<Vec<OutputSegment>>;
}

/// Reject session ids that cannot name a single URL path segment.
///
/// Session ids can arrive straight from a caller's query string.  Delimiters
/// and dot segments would move the engine request off the session's path.
pub fn check_session_id(session_id: &str) -> Result<()> {
    if session_id.is_empty() {
        return Err(Error::InvalidInput("session_id must not be empty".into()));
    }
    if session_id.contains(&['/', '\\', '?', '#'][..]) || session_id.contains("..") || session_id == "." {
        return Err(Error::InvalidInput(format!(
            "session_id {session_id:?} is not a valid session id"
        )));
    }
    Ok(())
}

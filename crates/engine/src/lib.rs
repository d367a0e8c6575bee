//! `sb-engine`: dialog engine client crate for SessionBridge.
//!
//! Provides the [`DialogEngine`] trait that the session affinity cache talks
//! to, a production REST implementation for Watson Assistant v2
//! ([`WatsonAssistantClient`]), and the wire types of that API.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use sb_domain::config::EngineConfig;
//! use sb_engine::{DialogEngine, WatsonAssistantClient};
//!
//! # async fn example() -> sb_domain::error::Result<()> {
//! let cfg = EngineConfig {
//!     assistant_id: "my-assistant".into(),
//!     ..Default::default()
//! };
//! let engine = WatsonAssistantClient::new(&cfg)?;
//!
//! let session_id = engine.create_session().await?;
//! let segments = engine.send_message(&session_id, "olá").await?;
//! println!("{} segments", segments.len());
//! # Ok(())
//! # }
//! ```

pub mod provider;
pub mod rest;
pub mod types;

pub use provider::{check_session_id, DialogEngine};
pub use rest::{from_reqwest, WatsonAssistantClient};
pub use types::{MessageRequest, MessageResponse, OptionChoice, OutputSegment, SegmentKind};

use std::sync::Arc;

use sb_domain::config::EngineConfig;
use sb_domain::error::Result;

/// Build the shared dialog engine handle from config.
pub fn create_engine(cfg: &EngineConfig) -> Result<Arc<dyn DialogEngine>> {
    let client = WatsonAssistantClient::new(cfg)?;
    tracing::info!(
        base_url = %cfg.base_url,
        assistant_id = %cfg.assistant_id,
        version = %cfg.version,
        authenticated = cfg.resolve_api_key().is_some(),
        "dialog engine client ready"
    );
    Ok(Arc::new(client))
}

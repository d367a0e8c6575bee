use std::sync::Arc;

use sb_domain::config::Config;
use sb_sessions::{AffinityCache, Sweeper};

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<AffinityCache>,
    pub sweeper: Arc<Sweeper>,
    /// SHA-256 of the admin bearer token; `None` leaves maintenance routes open.
    pub admin_token_hash: Option<Vec<u8>>,
}

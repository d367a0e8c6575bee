use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::api::auth::AdminGuard;
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /clean_redis: flush every key in the session store (admin)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Plain-text responses, for operators hitting the route from a browser.
pub async fn clean_redis(_guard: AdminGuard, State(state): State<AppState>) -> Response {
    match state.sweeper.flush_all().await {
        Ok(deleted) => (StatusCode::OK, format!("Deleted {deleted} Redis keys.")).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "store flush failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Failed to flush Redis: {e}"),
            )
                .into_response()
        }
    }
}

//! Debug-oriented entry point that exposes the session and the raw engine
//! output instead of the rendered reply.
//!
//! - `?fb_user_id=<id>` resolves the session only.
//! - `?fb_user_id=<id>&msg=<text>` resolves and sends.
//! - `?session_id=<sid>&msg=<text>` sends to a session the caller already
//!   holds, without touching the store.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use sb_engine::OutputSegment;
use sb_sessions::{Resolution, ResolvedSession};

use crate::api::{api_error, error_response, non_empty};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ParseInputQuery {
    #[serde(default)]
    pub fb_user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /parse_input
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn parse_input(
    State(state): State<AppState>,
    Query(query): Query<ParseInputQuery>,
) -> Response {
    let user = non_empty(query.fb_user_id);
    let session_id = non_empty(query.session_id);
    let msg = non_empty(query.msg);

    let result = match (user, session_id, msg) {
        (Some(user), _, None) => state
            .cache
            .resolve(&user)
            .await
            .map(|resolved| session_status(&resolved)),
        (Some(user), _, Some(msg)) => state
            .cache
            .send_raw(&user, &msg)
            .await
            .map(|(resolved, segments)| raw_output(&resolved.session_id, &segments)),
        (None, Some(session_id), Some(msg)) => state
            .cache
            .send_to_session(&session_id, &msg)
            .await
            .map(|segments| raw_output(&session_id, &segments)),
        _ => {
            return api_error(
                StatusCode::BAD_REQUEST,
                "expected fb_user_id, or session_id together with msg",
            )
        }
    };

    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => error_response(e),
    }
}

fn session_status(resolved: &ResolvedSession) -> serde_json::Value {
    serde_json::json!({
        "session_id": resolved.session_id,
        "status": if resolved.is_new() { "established" } else { "active" },
        "renewed": matches!(resolved.resolution, Resolution::Renewed { .. }),
    })
}

fn raw_output(session_id: &str, segments: &[OutputSegment]) -> serde_json::Value {
    serde_json::json!({
        "session_id": session_id,
        "output": { "generic": segments },
    })
}

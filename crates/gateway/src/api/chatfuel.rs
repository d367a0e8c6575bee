//! Messaging-platform webhook.
//!
//! The platform calls `GET /chatfuel?fb_user_id=<id>&msg=<text>` for every
//! user message and renders the returned `{"messages": [{"text": ...}]}`.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use crate::api::{api_error, error_response, non_empty};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatfuelQuery {
    #[serde(default)]
    pub fb_user_id: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /chatfuel
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn chatfuel(
    State(state): State<AppState>,
    Query(query): Query<ChatfuelQuery>,
) -> Response {
    let (Some(user), Some(msg)) = (non_empty(query.fb_user_id), non_empty(query.msg)) else {
        return api_error(
            StatusCode::BAD_REQUEST,
            "fb_user_id and msg query parameters are required",
        );
    };

    match state.cache.resolve_and_send(&user, Some(&msg)).await {
        Ok(envelope) => Json(envelope).into_response(),
        Err(e) => error_response(e),
    }
}

pub mod auth;
pub mod chatfuel;
pub mod health;
pub mod https;
pub mod maintenance;
pub mod parse_input;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;

use sb_domain::error::Error;

use crate::state::AppState;

/// Build the full API router.
///
/// The HTTPS redirect is applied to every route when
/// `server.require_https` is set.  `/clean_redis` additionally requires the
/// admin bearer token through [`auth::AdminGuard`].
pub fn router(state: AppState) -> Router<AppState> {
    let router = Router::new()
        .route("/health", get(health::health))
        .route("/chatfuel", get(chatfuel::chatfuel))
        .route("/parse_input", get(parse_input::parse_input))
        .route("/clean_redis", get(maintenance::clean_redis));

    if state.config.server.require_https {
        tracing::info!("plain-HTTP requests will be redirected to https");
        router.layer(middleware::from_fn(https::redirect_to_https))
    } else {
        router
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error responses
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Build a standardized JSON error response: `{ "error": "<message>" }`.
pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

pub(crate) fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::Auth(_) => StatusCode::SERVICE_UNAVAILABLE,
        e if e.is_upstream() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map a domain error onto the HTTP response the caller sees.
pub(crate) fn error_response(err: Error) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::warn!(error = %err, status = status.as_u16(), "request failed");
    }
    api_error(status, err.to_string())
}

/// Treat empty query values like missing ones.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_statuses() {
        let cases = [
            (Error::InvalidInput("x".into()), 400),
            (Error::StoreUnavailable("x".into()), 503),
            (Error::EngineUnavailable("x".into()), 503),
            (Error::Timeout("x".into()), 503),
            (Error::Http("x".into()), 503),
            (Error::Auth("x".into()), 503),
            (Error::Config("x".into()), 500),
        ];
        for (err, expected) in cases {
            assert_eq!(status_for(&err).as_u16(), expected, "{err}");
        }
    }

    #[test]
    fn empty_values_are_missing() {
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("u1".into())).as_deref(), Some("u1"));
        assert_eq!(non_empty(None), None);
    }
}

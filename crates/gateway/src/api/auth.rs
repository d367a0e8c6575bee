//! `AdminGuard`: bearer-token gate for the maintenance routes.
//!
//! `AppState` holds only the SHA-256 digest of the token named by
//! `server.admin_token_env`, computed once at startup.  With no token
//! configured the guard lets every request through.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::Response;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::api::api_error;
use crate::state::AppState;

pub struct AdminGuard;

fn bearer(parts: &Parts) -> &str {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("")
}

#[async_trait]
impl FromRequestParts<AppState> for AdminGuard {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Response> {
        let Some(expected) = &state.admin_token_hash else {
            return Ok(AdminGuard);
        };

        // Digests have a fixed length, so the comparison does not leak it.
        let provided = Sha256::digest(bearer(parts).as_bytes());
        if bool::from(provided.ct_eq(expected.as_slice())) {
            Ok(AdminGuard)
        } else {
            tracing::warn!(path = %parts.uri.path(), "admin token rejected");
            Err(api_error(StatusCode::UNAUTHORIZED, "invalid admin token"))
        }
    }
}

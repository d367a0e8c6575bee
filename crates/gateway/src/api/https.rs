//! Plain-HTTP to HTTPS redirect for deployments behind a TLS-terminating
//! proxy.  The client-facing scheme is read from `X-Forwarded-Proto`.

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Axum middleware: `301` to the `https://` URL unless the request already
/// arrived over HTTPS.  Attach via `axum::middleware::from_fn`.
pub async fn redirect_to_https(req: Request<Body>, next: Next) -> Response {
    if forwarded_https(req.headers()) {
        return next.run(req).await;
    }

    let Some(host) = req.headers().get(header::HOST).and_then(|v| v.to_str().ok()) else {
        return (StatusCode::BAD_REQUEST, "missing Host header").into_response();
    };
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let location = format!("https://{host}{path}");

    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}

fn forwarded_https(headers: &HeaderMap) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

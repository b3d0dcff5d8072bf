use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::ServerError;

/// Log one line per request: method, path, status, and time to response head.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    tracing::info!(
        target: "tracebox::access",
        "{method} {path} -> {} ({elapsed_ms:.1} ms)",
        response.status().as_u16(),
    );
    response
}

/// Replace the body limit layer's plain-text 413 with the JSON error body.
pub async fn json_payload_too_large(response: Response) -> Response {
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ServerError::PayloadTooLarge.into_response();
    }
    response
}

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, map_response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler;
use crate::middleware;
use crate::state::AppState;

/// Build the axum router with all trace endpoints and cross-cutting layers.
pub fn build_router(state: AppState, config: &ServerConfig) -> ServerResult<Router> {
    let mut router = Router::new()
        .route("/health", get(handler::health_handler))
        .route("/trace", post(handler::upload_trace))
        .route("/trace/:trace_id", get(handler::download_trace))
        // Uploads are streamed; the only size cap is the configured one.
        .layer(DefaultBodyLimit::disable());

    if let Some(limit) = config.max_upload_bytes {
        router = router
            .layer(RequestBodyLimitLayer::new(limit))
            .layer(map_response(middleware::json_payload_too_large));
    }

    Ok(router
        .layer(cors_layer(config)?)
        .layer(from_fn(middleware::log_requests))
        .with_state(state))
}

fn cors_layer(config: &ServerConfig) -> ServerResult<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if config.allows_any_origin() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = config
        .cors_allow_origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o)
                .map_err(|_| ServerError::Config(format!("invalid CORS origin: {o:?}")))
        })
        .collect::<ServerResult<Vec<_>>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

use std::io;

use axum::body::Body;
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::io::{ReaderStream, StreamReader};
use tracebox_store::{StoredTrace, TraceId, TraceStore};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Multipart field carrying the trace bytes.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub id: TraceId,
}

/// Liveness probe.
pub async fn health_handler() -> &'static str {
    "ok"
}

/// `POST /trace`: store the request payload and return its identifier.
///
/// Accepts either `multipart/form-data` with a `file` field or a raw body.
/// Both are streamed to disk without buffering the whole payload.
pub async fn upload_trace(
    State(state): State<AppState>,
    request: Request,
) -> ServerResult<Json<UploadResponse>> {
    let stored = if is_multipart(request.headers()) {
        let mut multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ServerError::InvalidUpload(e.to_string()))?;
        store_file_field(&state.store, &mut multipart).await?
    } else {
        let body = request.into_body().into_data_stream().map_err(io::Error::other);
        let reader = StreamReader::new(body);
        tokio::pin!(reader);
        state.store.write(&mut reader).await?
    };

    Ok(Json(UploadResponse { id: stored.id }))
}

async fn store_file_field(
    store: &TraceStore,
    multipart: &mut Multipart,
) -> ServerResult<StoredTrace> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::InvalidUpload(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let reader = StreamReader::new(field.map_err(io::Error::other));
        tokio::pin!(reader);
        return Ok(store.write(&mut reader).await?);
    }
    Err(ServerError::InvalidUpload(format!(
        "missing multipart field `{UPLOAD_FIELD}`"
    )))
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"))
}

/// `GET /trace/:trace_id`: stream a stored trace back as an attachment.
pub async fn download_trace(
    State(state): State<AppState>,
    Path(trace_id): Path<String>,
) -> ServerResult<Response> {
    let trace = state
        .store
        .resolve(&trace_id)
        .await
        .ok_or(ServerError::NotFound)?;
    let (file, len) = state.store.open_blob(&trace).await?;

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (header::CACHE_CONTROL, "no-cache".to_string()),
        (header::CONTENT_LENGTH, len.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", trace.download_name),
        ),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

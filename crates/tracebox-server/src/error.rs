use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracebox_store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("trace not found")]
    NotFound,

    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("upload exceeds the configured size limit")]
    PayloadTooLarge,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidUpload(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Store(StoreError::Upload { .. }) => StatusCode::BAD_REQUEST,
            Self::Store(_) | Self::Config(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        let detail = match &self {
            Self::NotFound => "Trace not found".to_string(),
            Self::InvalidUpload(_)
            | Self::PayloadTooLarge
            | Self::Store(StoreError::Upload { .. }) => self.to_string(),
            _ => "An internal error occurred".to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else if status != StatusCode::NOT_FOUND {
            tracing::warn!(error = %self, "rejected request");
        }

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

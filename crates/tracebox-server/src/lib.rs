//! HTTP service for tracebox.
//!
//! Accepts trace uploads on `POST /trace`, returns the assigned identifier,
//! and serves the stored bytes back on `GET /trace/:trace_id`. All storage
//! semantics live in `tracebox-store`; this crate is transport, request
//! logging, CORS, and error-to-status mapping.

pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{UploadResponse, UPLOAD_FIELD};
pub use server::TraceServer;
pub use state::AppState;

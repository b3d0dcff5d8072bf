use tokio::net::TcpListener;
use tracebox_store::TraceStore;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Trace upload/download server.
pub struct TraceServer {
    config: ServerConfig,
    store: TraceStore,
}

impl TraceServer {
    /// Prepare the storage root and validate the configuration.
    ///
    /// An unusable storage root is a configuration error: the server must not start.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let store =
            TraceStore::open(&config.storage_root).map_err(|e| ServerError::Config(e.to_string()))?;
        let server = Self { config, store };
        let _router = server.router()?;
        Ok(server)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn store(&self) -> &TraceStore {
        &self.store
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> ServerResult<axum::Router> {
        build_router(AppState::new(self.store.clone()), &self.config)
    }

    /// Serve requests until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router()?;
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            root = %self.store.root().path().display(),
            "tracebox server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!("tracebox server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &tempfile::TempDir) -> ServerConfig {
        ServerConfig {
            storage_root: dir.path().join("traces"),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn server_construction_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let server = TraceServer::new(config_in(&dir)).unwrap();
        assert_eq!(server.config().bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert!(dir.path().join("traces").is_dir());
        assert_eq!(server.store().root().path(), dir.path().join("traces"));
    }

    #[test]
    fn unusable_root_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let config = ServerConfig {
            storage_root: blocker,
            ..ServerConfig::default()
        };
        assert!(matches!(TraceServer::new(config), Err(ServerError::Config(_))));
    }

    #[test]
    fn bad_cors_origin_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            cors_allow_origins: vec!["bad\norigin".into()],
            ..config_in(&dir)
        };
        assert!(matches!(TraceServer::new(config), Err(ServerError::Config(_))));
    }

    #[test]
    fn router_builds() {
        let dir = tempfile::tempdir().unwrap();
        let server = TraceServer::new(config_in(&dir)).unwrap();
        server.router().unwrap();
    }
}

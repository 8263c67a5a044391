//! # HTTP Server
//!
//! Combines the storage and health routers, applies CORS, request tracing
//! and the body limit, and serves until Ctrl-C.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::config::HttpServerConfig;
use super::health_routes::health_routes;
use super::storage_routes::{storage_routes, StorageState};
use crate::observability::Event;

/// HTTP server for the file API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server over an already-built storage state
    pub fn new(config: HttpServerConfig, state: StorageState) -> Self {
        let router = Self::build_router(&config, Arc::new(state));
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    pub fn build_router(config: &HttpServerConfig, state: Arc<StorageState>) -> Router {
        Router::new()
            .merge(health_routes())
            .merge(storage_routes(state))
            .layer(DefaultBodyLimit::max(config.max_upload_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(config.cors_layer())
    }

    pub fn bind_addr(&self) -> io::Result<SocketAddr> {
        self.config.bind_addr().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid bind address {}:{}: {}", self.config.host, self.config.port, e),
            )
        })
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind the configured address and run until Ctrl-C
    pub async fn start(self) -> io::Result<()> {
        let listener = TcpListener::bind(self.bind_addr()?).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        info!(event = %Event::Serving, addr = %addr, "aerofiles listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(event = %Event::ShutdownStart);
}

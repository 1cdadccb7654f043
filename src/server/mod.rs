//! HTTP surfaces: the cached metrics API and the static dashboard server.

mod api;
mod cache;
mod static_files;

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;

pub use api::{router as api_router, run_api_server};
pub use cache::{CachedMetrics, EMPTY_SOURCE, MetricsCache, Summary};
pub use static_files::{run_static_server, static_router};

/// Errors raised while starting or running a server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("invalid CORS origin: {origin}")]
    InvalidOrigin { origin: String },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Binds a listener on `addr`.
///
/// # Errors
///
/// [`ServerError::Bind`] when the address is unavailable.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Serves `app` on an already bound listener until the process exits.
///
/// # Errors
///
/// [`ServerError::Serve`] when accepting connections fails.
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), ServerError> {
    axum::serve(listener, app).await.map_err(ServerError::Serve)
}

//! Server lifecycle
//!
//! Binds the listener, spawns the background refresher, and serves until a
//! shutdown signal arrives. The refresher is tied to the server lifetime
//! through a broadcast channel rather than detached fire-and-forget.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::config::Config;
use crate::item::spawn_refresher;
use crate::router::{AppState, create_router};
use crate::{Error, Result};

/// Demo server
pub struct Server {
    /// Configuration
    config: Config,
}

impl Server {
    /// Create a new server
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the server until shutdown
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);

        let state = Arc::new(AppState::new());
        let refresher = spawn_refresher(Arc::clone(&state.item), shutdown_tx.subscribe());

        let app = create_router(state);
        let listener = TcpListener::bind(addr).await?;

        info!(host = %self.config.server.host, port = self.config.server.port, "Listening");
        info!("Caching demo endpoints:");
        for path in [
            "/ping",
            "/5_sec_expires",
            "/pragma",
            "/cache_control_5_sec",
            "/cache_control_no_store",
            "/cache_control_no_cache",
            "/cache_control_must_revalidate",
            "/cache_control_last_modified",
        ] {
            info!("  GET {path}");
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown_tx))
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        let _ = refresher.await;
        info!("Refresher stopped");

        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal(shutdown_tx: tokio::sync::broadcast::Sender<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}

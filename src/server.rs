//! Server start-up and shutdown

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::api::{self, AppState};
use crate::config::ServerConfig;

/// Bind, serve, and block until Ctrl+C or SIGTERM.
pub async fn run(config: ServerConfig, state: AppState) -> Result<()> {
	let addr = config.socket_addr();
	let app = api::router(state, &config);

	let listener = TcpListener::bind(addr)
		.await
		.with_context(|| format!("Failed to bind {}", addr))?;

	info!("Listening on http://{}", listener.local_addr()?);
	info!("Max upload: {}MB", config.max_upload_mb);

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await
		.context("Server error")?;

	info!("Server shutdown complete");
	Ok(())
}

async fn shutdown_signal() {
	use tokio::signal;

	let ctrl_c = async {
		if let Err(e) = signal::ctrl_c().await {
			tracing::error!("Failed to listen for Ctrl+C: {}", e);
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut sig) => {
				sig.recv().await;
			}
			Err(e) => {
				tracing::error!("Failed to listen for SIGTERM: {}", e);
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => info!("Received Ctrl+C, shutting down"),
		_ = terminate => info!("Received SIGTERM, shutting down"),
	}
}

//! HTTP API
//!
//! - `health`: liveness probe
//! - `embed`: image upload to embedding
//! - `search`: ranking caller-supplied embeddings against a query

pub mod embed;
pub mod error;
pub mod health;
pub mod search;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::models::ImageEncoder;

pub use error::{ApiError, ApiResult};

/// Shared request state. The encoder is the only long-lived resource.
#[derive(Clone)]
pub struct AppState {
	pub encoder: Arc<dyn ImageEncoder>,
}

impl AppState {
	pub fn new(encoder: Arc<dyn ImageEncoder>) -> Self {
		Self { encoder }
	}
}

/// Build the router with all routes and middleware
pub fn router(state: AppState, config: &ServerConfig) -> Router {
	let cors = CorsLayer::new()
		.allow_origin(Any)
		.allow_methods(Any)
		.allow_headers(Any);

	Router::new()
		.route("/health", get(health::health_check))
		.route("/embed-image", post(embed::embed_image))
		.route("/search", post(search::search))
		.fallback(not_found)
		.layer(DefaultBodyLimit::max(config.max_upload_bytes()))
		.layer(cors)
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

async fn not_found() -> ApiError {
	ApiError::NotFound
}

//! Vista - image embedding and similarity ranking service
//!
//! Loads the vision model once, then serves `/health`, `/embed-image`, and
//! `/search` until shut down.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use vista::api::AppState;
use vista::config::{ServerConfig, ENV_MODELS_DIR, ENV_VISION_MODEL, VISION_MODEL};
use vista::models::VisionModel;
use vista::{logger, server};

#[tokio::main]
async fn main() -> Result<()> {
	if let Ok(path) = dotenvy::dotenv() {
		eprintln!("Loaded environment from {}", path.display());
	}

	let config = ServerConfig::from_env()?;
	logger::init(config.verbose);

	info!("Vista v{}", env!("CARGO_PKG_VERSION"));

	let model_path = config.vision_model_path().with_context(|| {
		format!(
			"Vision model not found. Place {} in ./models or set {} / {}",
			VISION_MODEL, ENV_MODELS_DIR, ENV_VISION_MODEL
		)
	})?;

	info!("Loading vision model: {}", model_path.display());
	let load_start = Instant::now();
	let provider = config.provider;
	let model = tokio::task::spawn_blocking(move || VisionModel::load(&model_path, provider)).await??;
	info!("Model ready in {:.2}s", load_start.elapsed().as_secs_f32());

	let state = AppState::new(Arc::new(model));
	server::run(config, state).await
}

//! Application configuration and constants

use anyhow::{Context, Result};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::runtime::Provider;

// === Model Files ===
pub const VISION_MODEL: &str = "vision_model.onnx";
pub const MODELS_DIR: &str = "models";

// === Model Parameters ===
pub const INPUT_SIZE: u32 = 224;
pub const EMBEDDING_DIM: usize = 512;
pub const INPUT_NAME: &str = "pixel_values";
pub const OUTPUT_NAME: &str = "image_embeds";
pub const PIXEL_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
pub const PIXEL_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

// === Server Defaults ===
pub const DEFAULT_PORT: u16 = 8200;
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
pub const DEFAULT_MAX_UPLOAD_MB: usize = 32;

// === Search Defaults ===
pub const DEFAULT_K: i64 = 12;

// === Environment ===
pub const ENV_PORT: &str = "PORT";
pub const ENV_HOST: &str = "VISTA_HOST";
pub const ENV_MODELS_DIR: &str = "VISTA_MODELS_DIR";
pub const ENV_VISION_MODEL: &str = "VISTA_VISION_MODEL";
pub const ENV_PROVIDER: &str = "VISTA_PROVIDER";
pub const ENV_MAX_UPLOAD_MB: &str = "VISTA_MAX_UPLOAD_MB";
pub const ENV_VERBOSE: &str = "VISTA_VERBOSE";

/// Runtime settings for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub host: IpAddr,
	pub port: u16,
	pub max_upload_mb: usize,
	pub provider: Provider,
	pub models_dir: Option<PathBuf>,
	pub vision_model: Option<PathBuf>,
	pub verbose: bool,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: DEFAULT_HOST,
			port: DEFAULT_PORT,
			max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
			provider: Provider::default(),
			models_dir: None,
			vision_model: None,
			verbose: false,
		}
	}
}

impl ServerConfig {
	/// Reads the process environment. Unset variables keep their defaults.
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Builds a config from an arbitrary key lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
		let mut config = Self::default();

		if let Some(port) = get(ENV_PORT) {
			config.port = port
				.parse()
				.with_context(|| format!("{} must be a port number, got '{}'", ENV_PORT, port))?;
		}
		if let Some(host) = get(ENV_HOST) {
			config.host = host
				.parse()
				.with_context(|| format!("{} must be an IP address, got '{}'", ENV_HOST, host))?;
		}
		if let Some(mb) = get(ENV_MAX_UPLOAD_MB) {
			config.max_upload_mb = mb
				.parse()
				.with_context(|| format!("{} must be a whole number of megabytes, got '{}'", ENV_MAX_UPLOAD_MB, mb))?;
		}
		if let Some(provider) = get(ENV_PROVIDER) {
			config.provider = provider
				.parse()
				.map_err(|e| anyhow::anyhow!("{}: {}", ENV_PROVIDER, e))?;
		}

		config.models_dir = get(ENV_MODELS_DIR).map(PathBuf::from);
		config.vision_model = get(ENV_VISION_MODEL).map(PathBuf::from);
		config.verbose = get(ENV_VERBOSE).is_some_and(|v| is_truthy(&v));

		Ok(config)
	}

	pub fn socket_addr(&self) -> SocketAddr {
		SocketAddr::new(self.host, self.port)
	}

	pub fn max_upload_bytes(&self) -> usize {
		self.max_upload_mb.saturating_mul(1024 * 1024)
	}

	/// Get models directory (VISTA_MODELS_DIR, next to executable, or working directory)
	pub fn models_dir(&self) -> Option<PathBuf> {
		if let Some(custom) = &self.models_dir {
			tracing::debug!("Using {}: {}", ENV_MODELS_DIR, custom.display());
			return Some(custom.clone());
		}

		if let Ok(exe) = std::env::current_exe() {
			if let Some(dir) = exe.parent() {
				let models = dir.join(MODELS_DIR);
				if models.is_dir() {
					tracing::debug!("Found models at: {}", models.display());
					return Some(models);
				}
			}
		}

		let local = PathBuf::from(MODELS_DIR);
		if local.is_dir() {
			return Some(local);
		}

		None
	}

	pub fn vision_model_path(&self) -> Option<PathBuf> {
		if let Some(custom) = &self.vision_model {
			return Some(custom.clone());
		}
		self.models_dir().map(|d| d.join(VISION_MODEL))
	}
}

fn is_truthy(value: &str) -> bool {
	matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

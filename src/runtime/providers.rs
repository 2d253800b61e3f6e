//! Execution provider selection

use anyhow::{Context, Result};
use ort::ep::{self, ExecutionProvider};
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info};

/// Execution provider for ONNX Runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Provider {
	/// Best available from [`AUTO_ORDER`], then CPU
	#[default]
	Auto,
	Cpu,
	Cuda,
	Tensorrt,
	/// macOS only
	CoreML,
	Xnnpack,
}

/// Accelerators tried by [`Provider::Auto`], fastest first.
pub const AUTO_ORDER: [Provider; 4] = [Provider::Tensorrt, Provider::Cuda, Provider::CoreML, Provider::Xnnpack];

impl Provider {
	pub fn name(self) -> &'static str {
		match self {
			Self::Auto => "auto",
			Self::Cpu => "CPU",
			Self::Cuda => "CUDA",
			Self::Tensorrt => "TensorRT",
			Self::CoreML => "CoreML",
			Self::Xnnpack => "XNNPACK",
		}
	}

	/// Registers this accelerator on `builder`. `false` leaves the builder on CPU.
	fn register(self, builder: &mut SessionBuilder) -> bool {
		match self {
			Self::Cuda => register_with(builder, ep::CUDA::default(), self.name()),
			Self::Tensorrt => register_with(builder, ep::TensorRT::default(), self.name()),
			#[cfg(target_os = "macos")]
			Self::CoreML => register_with(builder, ep::CoreML::default(), self.name()),
			Self::Xnnpack => register_with(builder, ep::XNNPACK::default(), self.name()),
			_ => false,
		}
	}
}

impl FromStr for Provider {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"auto" => Ok(Self::Auto),
			"cpu" => Ok(Self::Cpu),
			"cuda" => Ok(Self::Cuda),
			"tensorrt" | "trt" => Ok(Self::Tensorrt),
			"coreml" => Ok(Self::CoreML),
			"xnnpack" => Ok(Self::Xnnpack),
			other => Err(format!(
				"unknown execution provider '{}' (expected auto, cpu, cuda, tensorrt, coreml, xnnpack)",
				other
			)),
		}
	}
}

static PROVIDER_LOGGED: AtomicBool = AtomicBool::new(false);

fn log_once(msg: &str) {
	if !PROVIDER_LOGGED.swap(true, Ordering::Relaxed) {
		info!("{}", msg);
	}
}

pub fn create_session(model_path: &Path, provider: Provider) -> Result<Session> {
	let mut builder = Session::builder().context("Failed to create session builder")?;

	match provider {
		Provider::Auto => {
			if !AUTO_ORDER.iter().any(|p| p.register(&mut builder)) {
				log_once("Using CPU execution provider");
			}
		}
		Provider::Cpu => log_once("Using CPU execution provider (forced)"),
		requested => {
			if !requested.register(&mut builder) {
				error!("{} requested but unavailable, falling back to CPU", requested.name());
			}
		}
	}

	builder
		.with_optimization_level(GraphOptimizationLevel::Level3)?
		.with_intra_threads(4)?
		.commit_from_file(model_path)
		.with_context(|| format!("Failed to load model: {}", model_path.display()))
}

fn register_with(builder: &mut SessionBuilder, provider: impl ExecutionProvider, name: &str) -> bool {
	debug!("Trying provider: {}", name);

	if !provider.is_available().unwrap_or(false) {
		debug!("{} not available", name);
		return false;
	}

	match provider.register(builder) {
		Ok(_) => {
			log_once(&format!("Using {} execution provider", name));
			true
		}
		Err(e) => {
			debug!("{} registration failed: {}", name, e);
			false
		}
	}
}

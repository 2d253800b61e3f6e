//! # ONNX Model Management
//!
//! The image encoder seam and its ONNX-backed implementation.

pub mod vision;

use anyhow::Result;
use image::DynamicImage;

use crate::core::Embedding;

pub use vision::VisionModel;

/// Turns a decoded image into an L2-normalized embedding.
///
/// Shared read-only across requests for the life of the process.
pub trait ImageEncoder: Send + Sync {
	fn encode(&self, image: &DynamicImage) -> Result<Embedding>;
}

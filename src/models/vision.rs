//! Vision model (CLIP ViT-B/32 image tower) for image embeddings

use anyhow::{anyhow, bail, Context, Result};
use image::DynamicImage;
use ort::session::{Session, SessionOutputs};
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, warn};

use super::ImageEncoder;
use crate::config::{EMBEDDING_DIM, INPUT_NAME, OUTPUT_NAME};
use crate::core::Embedding;
use crate::processing::image::preprocess;
use crate::runtime::{create_session, Provider};

/// ONNX image encoder. The session needs exclusive access per run, so
/// concurrent requests take turns on the mutex.
pub struct VisionModel {
	session: Mutex<Session>,
}

impl VisionModel {
	pub fn load(model_path: &Path, provider: Provider) -> Result<Self> {
		if !model_path.exists() {
			bail!("Vision model file does not exist: {}", model_path.display());
		}

		let session = create_session(model_path, provider).context("Failed to load vision model")?;
		Ok(Self { session: Mutex::new(session) })
	}
}

impl ImageEncoder for VisionModel {
	fn encode(&self, image: &DynamicImage) -> Result<Embedding> {
		let start = Instant::now();
		let pixels = preprocess(image);
		let shape = pixels.shape().to_vec();
		let (data, _) = pixels.into_raw_vec_and_offset();
		let input = ort::value::Value::from_array((shape, data))?;

		let mut session = self.session.lock().map_err(|e| anyhow!("Session lock: {}", e))?;
		let outputs = session.run(ort::inputs![INPUT_NAME => input])?;
		let raw = extract_embedding(&outputs)?;
		drop(outputs);
		drop(session);

		if raw.len() != EMBEDDING_DIM {
			warn!("Vision model produced {} dimensions, expected {}", raw.len(), EMBEDDING_DIM);
		}
		debug!("Vision inference took {}ms", start.elapsed().as_millis());

		Ok(Embedding::new(raw))
	}
}

fn extract_embedding(outputs: &SessionOutputs) -> Result<Vec<f32>> {
	let output = match outputs.get(OUTPUT_NAME) {
		Some(value) => value,
		None => {
			let (name, _) = outputs.iter().next().context("Vision model returned no outputs")?;
			debug!("No '{}' output, using '{}'", OUTPUT_NAME, name);
			outputs.get(name).context("Vision model output vanished")?
		}
	};

	let (shape, data) = output.try_extract_tensor::<f32>()?;
	let dims: Vec<usize> = shape.iter().map(|&x| x as usize).collect();
	pool(data, &dims)
}

/// Reduces a raw output tensor to one vector.
/// Handles `[dim]`, `[1, dim]`, and `[1, patches, dim]` (mean pooled).
pub(crate) fn pool(data: &[f32], dims: &[usize]) -> Result<Vec<f32>> {
	match dims {
		[dim] | [1, dim] if data.len() == *dim => Ok(data.to_vec()),
		[1, patches, dim] if *patches > 0 && data.len() == patches * dim => {
			let mut pooled = vec![0.0; *dim];
			for patch in data.chunks_exact(*dim) {
				for (acc, val) in pooled.iter_mut().zip(patch) {
					*acc += val;
				}
			}
			pooled.iter_mut().for_each(|v| *v /= *patches as f32);
			Ok(pooled)
		}
		_ => bail!("Unexpected vision output shape: {:?}", dims),
	}
}

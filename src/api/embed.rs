//! Image embedding endpoint

use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::core::{Embedding, ImageDigest};
use crate::processing;

pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize)]
pub struct EmbedResponse {
	pub success: bool,
	pub embedding: Embedding,
}

/// POST /embed-image
///
/// Multipart form with an `image` file part. Responds with the
/// L2-normalized embedding of the decoded image.
///
/// # Errors
/// - 400 `Image required`: not multipart, or no `image` file part
/// - 400: empty or undecodable image
/// - 413: upload exceeds the body limit
/// - 500: inference failed
pub async fn embed_image(
	State(state): State<AppState>,
	multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<EmbedResponse>> {
	let Ok(mut multipart) = multipart else {
		return Err(ApiError::image_required());
	};

	let bytes = read_image_field(&mut multipart)
		.await?
		.ok_or_else(ApiError::image_required)?;

	if bytes.is_empty() {
		return Err(ApiError::InvalidInput("Image is empty".to_string()));
	}

	let digest = ImageDigest::compute(&bytes);
	debug!("Embedding image {} ({} bytes)", digest.short(), bytes.len());

	let start = Instant::now();
	let encoder = state.encoder.clone();
	let embedding = tokio::task::spawn_blocking(move || -> ApiResult<Embedding> {
		let image = processing::image::decode(&bytes)
			.map_err(|e| ApiError::InvalidInput(format!("Invalid image: {}", e)))?;
		Ok(encoder.encode(&image)?)
	})
	.await??;

	info!(
		"Embedded image {} ({} dims) in {}ms",
		digest.short(),
		embedding.dim(),
		start.elapsed().as_millis()
	);

	Ok(Json(EmbedResponse { success: true, embedding }))
}

/// Returns the first `image` part carrying a filename. Plain form values
/// with that name are skipped like any other field.
async fn read_image_field(multipart: &mut Multipart) -> ApiResult<Option<Bytes>> {
	while let Some(field) = multipart
		.next_field()
		.await
		.map_err(|e| multipart_error("Malformed multipart body", e))?
	{
		if field.name() == Some(IMAGE_FIELD) && field.file_name().is_some() {
			let data = field
				.bytes()
				.await
				.map_err(|e| multipart_error("Failed to read image", e))?;
			return Ok(Some(data));
		}
	}

	Ok(None)
}

fn multipart_error(context: &str, err: MultipartError) -> ApiError {
	if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
		ApiError::PayloadTooLarge(format!("Image exceeds upload limit: {}", err.body_text()))
	} else {
		ApiError::InvalidInput(format!("{}: {}", context, err))
	}
}

//! Similarity search endpoint

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{ApiError, ApiResult};
use crate::config::DEFAULT_K;
use crate::rank::{self, Candidate, ScoredItem};

/// Query string for POST /search
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
	/// Result count. Zero or negative yields an empty list.
	#[serde(default = "default_k")]
	pub k: i64,
}

fn default_k() -> i64 {
	DEFAULT_K
}

/// Request body for POST /search
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
	/// Scored in double precision.
	pub embedding: Vec<f64>,

	/// Absent or `null` means no candidates.
	#[serde(default)]
	pub items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
	/// `productId` and `id` are accepted for older clients; sending more than
	/// one of them is a duplicate-field error.
	#[serde(default, alias = "productId", alias = "id")]
	pub identifier: Option<String>,

	pub embedding: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
	pub success: bool,
	/// Single-element outer list wrapping the ranking.
	pub results: Vec<Vec<ScoredItem>>,
}

impl SearchRequest {
	/// Resolve identifiers into rankable candidates.
	pub fn into_candidates(self) -> ApiResult<(Vec<f64>, Vec<Candidate>)> {
		let candidates = self
			.items
			.unwrap_or_default()
			.into_iter()
			.enumerate()
			.map(|(index, item)| match item.identifier {
				Some(identifier) => Ok(Candidate { identifier, embedding: item.embedding }),
				None => Err(ApiError::MissingIdentifier { index }),
			})
			.collect::<ApiResult<Vec<_>>>()?;

		Ok((self.embedding, candidates))
	}
}

/// POST /search?k=<int>
///
/// Ranks `items` against `embedding` by dot product and returns the top `k`
/// (default 12).
///
/// # Errors
/// - 400: malformed JSON, missing fields, non-integer `k`
/// - 400 `MISSING_IDENTIFIER`: an item has no identifier
/// - 422 `DIMENSION_MISMATCH`: an item's length differs from the query's
pub async fn search(
	params: Result<Query<SearchParams>, QueryRejection>,
	body: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Json<SearchResponse>> {
	let Query(params) = params.map_err(|e| ApiError::InvalidInput(e.body_text()))?;
	let Json(request) = body.map_err(|e| ApiError::InvalidInput(e.body_text()))?;

	let (query, candidates) = request.into_candidates()?;
	debug!(
		"Ranking {} items ({} dims, k={})",
		candidates.len(),
		query.len(),
		params.k
	);

	let ranked = rank::rank(&query, candidates, params.k)?;

	Ok(Json(SearchResponse { success: true, results: vec![ranked] }))
}

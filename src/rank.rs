//! Brute-force similarity ranking
//!
//! Scores every candidate against the query with a plain dot product and
//! orders them by descending score. Vectors are taken as given: callers that
//! want cosine similarity must send unit-length embeddings. Scores are
//! computed in `f64` whatever precision the embeddings were produced in.

use serde::Serialize;
use std::cmp::Ordering;

use crate::core::embedding::dot;

/// A caller-supplied embedding to rank.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
	pub identifier: String,
	pub embedding: Vec<f64>,
}

impl Candidate {
	pub fn new(identifier: impl Into<String>, embedding: Vec<f64>) -> Self {
		Self { identifier: identifier.into(), embedding }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredItem {
	pub identifier: String,
	pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RankError {
	#[error("Embedding dimension mismatch: query has {expected} dimensions, item {index} has {actual}")]
	DimensionMismatch { index: usize, expected: usize, actual: usize },
}

/// Rank `candidates` against `query`, keeping at most `k` results.
///
/// Equal scores keep their input order. `k <= 0` yields no results, but the
/// candidates are still validated.
pub fn rank(query: &[f64], candidates: Vec<Candidate>, k: i64) -> Result<Vec<ScoredItem>, RankError> {
	if let Some((index, c)) = candidates
		.iter()
		.enumerate()
		.find(|(_, c)| c.embedding.len() != query.len())
	{
		return Err(RankError::DimensionMismatch {
			index,
			expected: query.len(),
			actual: c.embedding.len(),
		});
	}

	if k <= 0 {
		return Ok(Vec::new());
	}

	let mut scored: Vec<ScoredItem> = candidates
		.into_iter()
		.map(|c| ScoredItem {
			score: dot(query, &c.embedding),
			identifier: c.identifier,
		})
		.collect();

	// sort_by is stable
	scored.sort_by(|a, b| descending(a.score, b.score));
	scored.truncate(usize::try_from(k).unwrap_or(usize::MAX));

	Ok(scored)
}

/// Descending order with NaN last. `-0.0` and `0.0` tie.
fn descending(a: f64, b: f64) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

//! Embedding vectors and similarity math

use serde::Serialize;
use std::iter::Sum;
use std::ops::Mul;

/// L2-normalized embedding produced by the image encoder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
	/// Create normalized embedding from raw model output
	pub fn new(data: Vec<f32>) -> Self {
		Self(normalize(data))
	}

	pub fn as_slice(&self) -> &[f32] {
		&self.0
	}

	pub fn dim(&self) -> usize {
		self.0.len()
	}
}

/// Scales a vector to unit length. An all-zero vector is returned unchanged.
pub fn normalize(mut v: Vec<f32>) -> Vec<f32> {
	let norm = l2_norm(&v);
	if norm > 0.0 {
		v.iter_mut().for_each(|x| *x /= norm);
	}
	v
}

pub fn l2_norm(v: &[f32]) -> f32 {
	v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Dot product over the common length. Callers check dimensions first.
pub fn dot<T>(a: &[T], b: &[T]) -> T
where
	T: Copy + Mul<Output = T> + Sum<T>,
{
	a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum()
}

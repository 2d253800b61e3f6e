//! Content digests for uploaded media

use xxhash_rust::xxh3::xxh3_64;

/// xxh3 digest of an upload, used to correlate log lines for one image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageDigest(String);

impl ImageDigest {
	pub fn compute(bytes: &[u8]) -> Self {
		Self(format!("{:016x}", xxh3_64(bytes)))
	}

	pub fn short(&self) -> &str {
		&self.0[..8]
	}
}

impl std::fmt::Display for ImageDigest {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

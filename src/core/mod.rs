//! Core domain types

pub mod digest;
pub mod embedding;

pub use digest::ImageDigest;
pub use embedding::Embedding;

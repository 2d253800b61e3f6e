//! # Vista Library
//!
//! Image embeddings from a CLIP vision encoder and brute-force similarity
//! ranking, served over HTTP.

pub mod api;
pub mod config;
pub mod core;
pub mod logger;
pub mod models;
pub mod processing;
pub mod rank;
pub mod runtime;
pub mod server;

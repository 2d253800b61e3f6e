//! Media processing

pub mod image;

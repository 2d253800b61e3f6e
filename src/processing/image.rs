//! Image decoding and CLIP preprocessing

use image::imageops::FilterType;
use image::{DynamicImage, ImageResult};
use ndarray::Array4;

use crate::config::{INPUT_SIZE, PIXEL_MEAN, PIXEL_STD};

/// Decode uploaded bytes, guessing the format from content
pub fn decode(bytes: &[u8]) -> ImageResult<DynamicImage> {
	image::load_from_memory(bytes)
}

/// Resize the short side to `INPUT_SIZE`, center-crop, and normalize into an
/// NCHW tensor of shape `[1, 3, INPUT_SIZE, INPUT_SIZE]`.
pub fn preprocess(img: &DynamicImage) -> Array4<f32> {
	let cropped = img.resize_to_fill(INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom);
	let rgb = cropped.to_rgb8();
	let size = INPUT_SIZE as usize;

	let mut arr = Array4::<f32>::zeros((1, 3, size, size));
	for (x, y, px) in rgb.enumerate_pixels() {
		let (x, y) = (x as usize, y as usize);
		for c in 0..3 {
			arr[[0, c, y, x]] = (px[c] as f32 / 255.0 - PIXEL_MEAN[c]) / PIXEL_STD[c];
		}
	}

	arr
}

// Integration tests for the HTTP API, driven through the router with a stub encoder

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

use vista::api::{self, AppState};
use vista::config::ServerConfig;
use vista::core::Embedding;
use vista::models::ImageEncoder;

const BOUNDARY: &str = "vista-test-boundary";

/// Embeds an image as its (width, height), so results are predictable.
struct SizeEncoder;

impl ImageEncoder for SizeEncoder {
	fn encode(&self, image: &DynamicImage) -> Result<Embedding> {
		Ok(Embedding::new(vec![image.width() as f32, image.height() as f32]))
	}
}

struct ZeroEncoder;

impl ImageEncoder for ZeroEncoder {
	fn encode(&self, _image: &DynamicImage) -> Result<Embedding> {
		Ok(Embedding::new(vec![0.0; 4]))
	}
}

struct BrokenEncoder;

impl ImageEncoder for BrokenEncoder {
	fn encode(&self, _image: &DynamicImage) -> Result<Embedding> {
		anyhow::bail!("accelerator on fire")
	}
}

fn app_with(encoder: impl ImageEncoder + 'static) -> Router {
	api::router(AppState::new(Arc::new(encoder)), &ServerConfig::default())
}

fn app() -> Router {
	app_with(SizeEncoder)
}

fn png(width: u32, height: u32) -> Vec<u8> {
	let img = RgbImage::from_pixel(width, height, Rgb([200, 100, 50]));
	let mut buf = Cursor::new(Vec::new());
	img.write_to(&mut buf, ImageFormat::Png).unwrap();
	buf.into_inner()
}

fn multipart_body(field: &str, data: &[u8]) -> Vec<u8> {
	multipart_part(&format!("name=\"{field}\"; filename=\"query.png\""), data)
}

fn multipart_part(disposition: &str, data: &[u8]) -> Vec<u8> {
	let mut body = Vec::new();
	body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
	body.extend_from_slice(format!("Content-Disposition: form-data; {disposition}\r\n").as_bytes());
	body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
	body.extend_from_slice(data);
	body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
	body
}

fn embed_request(field: &str, data: &[u8]) -> Request<Body> {
	multipart_request(multipart_body(field, data))
}

fn multipart_request(body: Vec<u8>) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri("/embed-image")
		.header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
		.body(Body::from(body))
		.unwrap()
}

fn search_request(uri: &str, body: Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from(body.to_string()))
		.unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
	let response = app.oneshot(request).await.unwrap();
	let status = response.status();
	let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
	let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
	(status, body)
}

fn ranked(body: &Value) -> Vec<(String, f64)> {
	let outer = body["results"].as_array().expect("results array");
	assert_eq!(outer.len(), 1, "results wraps a single ranking");
	outer[0]
		.as_array()
		.expect("inner ranking")
		.iter()
		.map(|r| {
			(
				r["identifier"].as_str().unwrap().to_string(),
				r["score"].as_f64().unwrap(),
			)
		})
		.collect()
}

// ========== /health ==========

#[tokio::test]
async fn health_reports_success() {
	let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
	let (status, body) = send(app(), request).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, json!({ "success": true }));
}

#[tokio::test]
async fn unknown_route_is_json_404() {
	let request = Request::builder().uri("/nope").body(Body::empty()).unwrap();
	let (status, body) = send(app(), request).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["success"], json!(false));
	assert_eq!(body["code"], json!("NOT_FOUND"));
}

// ========== /embed-image ==========

#[tokio::test]
async fn embed_returns_normalized_vector() {
	let (status, body) = send(app(), embed_request("image", &png(3, 4))).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["success"], json!(true));

	let embedding: Vec<f64> = body["embedding"]
		.as_array()
		.unwrap()
		.iter()
		.map(|v| v.as_f64().unwrap())
		.collect();
	assert_eq!(embedding.len(), 2);
	assert!((embedding[0] - 0.6).abs() < 1e-6);
	assert!((embedding[1] - 0.8).abs() < 1e-6);

	let norm: f64 = embedding.iter().map(|x| x * x).sum::<f64>().sqrt();
	assert!((norm - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn embed_zero_vector_passes_through() {
	let (status, body) = send(app_with(ZeroEncoder), embed_request("image", &png(2, 2))).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["embedding"], json!([0.0, 0.0, 0.0, 0.0]));
}

#[tokio::test]
async fn embed_without_image_field() {
	let (status, body) = send(app(), embed_request("file", &png(3, 4))).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["success"], json!(false));
	assert_eq!(body["message"], json!("Image required"));
}

#[tokio::test]
async fn embed_ignores_plain_text_image_field() {
	let body = multipart_part("name=\"image\"", &png(3, 4));
	let (status, body) = send(app(), multipart_request(body)).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["message"], json!("Image required"));
}

#[tokio::test]
async fn embed_rejects_oversized_upload() {
	let config = ServerConfig { max_upload_mb: 1, ..ServerConfig::default() };
	let app = api::router(AppState::new(Arc::new(SizeEncoder)), &config);

	let (status, body) = send(app, embed_request("image", &vec![0u8; 2 * 1024 * 1024])).await;
	assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
	assert_eq!(body["code"], json!("PAYLOAD_TOO_LARGE"));
}

#[tokio::test]
async fn embed_without_multipart_body() {
	let request = search_request("/embed-image", json!({ "image": "not a file" }));
	let (status, body) = send(app(), request).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["message"], json!("Image required"));
}

#[tokio::test]
async fn embed_rejects_undecodable_bytes() {
	let (status, body) = send(app(), embed_request("image", b"GIF89a but not really")).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["code"], json!("INVALID_INPUT"));
	assert!(body["message"].as_str().unwrap().starts_with("Invalid image"));
}

#[tokio::test]
async fn embed_rejects_empty_upload() {
	let (status, body) = send(app(), embed_request("image", &[])).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["message"], json!("Image is empty"));
}

#[tokio::test]
async fn embed_surfaces_encoder_failure() {
	let (status, body) = send(app_with(BrokenEncoder), embed_request("image", &png(3, 4))).await;
	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(body["code"], json!("INTERNAL_ERROR"));
	assert!(body["message"].as_str().unwrap().contains("accelerator on fire"));
}

// ========== /search ==========

#[tokio::test]
async fn search_ranks_and_truncates() {
	let payload = json!({
		"embedding": [1.0, 0.0],
		"items": [
			{ "identifier": "a", "embedding": [1.0, 0.0] },
			{ "identifier": "b", "embedding": [0.0, 1.0] },
			{ "identifier": "c", "embedding": [0.5, 0.5] }
		]
	});
	let (status, body) = send(app(), search_request("/search?k=2", payload)).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["success"], json!(true));
	assert_eq!(ranked(&body), vec![("a".to_string(), 1.0), ("c".to_string(), 0.5)]);
}

#[tokio::test]
async fn search_tie_keeps_first_occurrence() {
	let payload = json!({
		"embedding": [1.0, 0.0],
		"items": [
			{ "identifier": "x", "embedding": [1.0, 0.0] },
			{ "identifier": "y", "embedding": [1.0, 0.0] }
		]
	});
	let (_, body) = send(app(), search_request("/search?k=1", payload)).await;
	assert_eq!(ranked(&body), vec![("x".to_string(), 1.0)]);
}

#[tokio::test]
async fn search_defaults_to_twelve_results() {
	let items: Vec<Value> = (0..15)
		.map(|i| json!({ "identifier": format!("item-{i}"), "embedding": [i as f32, 1.0] }))
		.collect();
	let payload = json!({ "embedding": [1.0, 0.0], "items": items });

	let (status, body) = send(app(), search_request("/search", payload)).await;
	assert_eq!(status, StatusCode::OK);

	let results = ranked(&body);
	assert_eq!(results.len(), 12);
	assert_eq!(results[0].0, "item-14");
	assert!(results.windows(2).all(|w| w[0].1 >= w[1].1));
}

#[tokio::test]
async fn search_with_no_items() {
	for payload in [
		json!({ "embedding": [1.0, 0.0], "items": [] }),
		json!({ "embedding": [1.0, 0.0] }),
		json!({ "embedding": [1.0, 0.0], "items": null }),
	] {
		let (status, body) = send(app(), search_request("/search?k=5", payload)).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["results"], json!([[]]));
	}
}

#[tokio::test]
async fn search_with_non_positive_k() {
	for uri in ["/search?k=0", "/search?k=-4"] {
		let payload = json!({
			"embedding": [1.0],
			"items": [{ "identifier": "a", "embedding": [1.0] }]
		});
		let (status, body) = send(app(), search_request(uri, payload)).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["results"], json!([[]]));
	}
}

#[tokio::test]
async fn search_rejects_non_integer_k() {
	let payload = json!({ "embedding": [1.0], "items": [] });
	let (status, body) = send(app(), search_request("/search?k=many", payload)).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["code"], json!("INVALID_INPUT"));
}

#[tokio::test]
async fn search_accepts_product_id_alias() {
	let payload = json!({
		"embedding": [0.0, 1.0],
		"items": [
			{ "productId": "p-1", "embedding": [0.0, 0.25] },
			{ "id": "p-2", "embedding": [0.0, 0.75] }
		]
	});
	let (_, body) = send(app(), search_request("/search", payload)).await;
	assert_eq!(
		ranked(&body),
		vec![("p-2".to_string(), 0.75), ("p-1".to_string(), 0.25)]
	);
}

#[tokio::test]
async fn search_missing_identifier() {
	let payload = json!({
		"embedding": [1.0, 0.0],
		"items": [
			{ "identifier": "a", "embedding": [1.0, 0.0] },
			{ "embedding": [0.0, 1.0] }
		]
	});
	let (status, body) = send(app(), search_request("/search", payload)).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["code"], json!("MISSING_IDENTIFIER"));
	assert_eq!(body["message"], json!("Item 1 is missing an identifier"));
}

#[tokio::test]
async fn search_dimension_mismatch() {
	let payload = json!({
		"embedding": [1.0, 0.0],
		"items": [{ "identifier": "a", "embedding": [1.0, 0.0, 0.0] }]
	});
	let (status, body) = send(app(), search_request("/search", payload)).await;
	assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(body["success"], json!(false));
	assert_eq!(body["code"], json!("DIMENSION_MISMATCH"));
}

#[tokio::test]
async fn search_requires_query_embedding() {
	let payload = json!({ "items": [] });
	let (status, body) = send(app(), search_request("/search", payload)).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["code"], json!("INVALID_INPUT"));
}

#[tokio::test]
async fn search_scores_in_double_precision() {
	let payload = json!({
		"embedding": [1.0],
		"items": [
			{ "identifier": "a", "embedding": [1.0] },
			{ "identifier": "b", "embedding": [1.00000001] }
		]
	});
	let (status, body) = send(app(), search_request("/search", payload)).await;
	assert_eq!(status, StatusCode::OK);

	let results = ranked(&body);
	assert_eq!(results[0].0, "b");
	assert_eq!(results[1].0, "a");
	assert!(results[0].1 > 1.0);

	let payload = json!({
		"embedding": [0.1, 0.2],
		"items": [{ "identifier": "a", "embedding": [0.3, 0.4] }]
	});
	let (_, body) = send(app(), search_request("/search", payload)).await;
	assert!((ranked(&body)[0].1 - 0.11).abs() < 1e-12);
}

#[tokio::test]
async fn search_is_deterministic() {
	let payload = json!({
		"embedding": [0.3, 0.7],
		"items": [
			{ "identifier": "a", "embedding": [1.0, 0.0] },
			{ "identifier": "b", "embedding": [0.0, 1.0] },
			{ "identifier": "c", "embedding": [0.5, 0.5] }
		]
	});
	let (_, first) = send(app(), search_request("/search", payload.clone())).await;
	let (_, second) = send(app(), search_request("/search", payload)).await;
	assert_eq!(first, second);
}

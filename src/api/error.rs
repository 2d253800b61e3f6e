//! Request failures and their JSON rendering

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{debug, error};

use crate::rank::RankError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error("{0}")]
	InvalidInput(String),

	#[error("Item {index} is missing an identifier")]
	MissingIdentifier { index: usize },

	#[error("{0}")]
	PayloadTooLarge(String),

	#[error(transparent)]
	DimensionMismatch(#[from] RankError),

	#[error("Internal error: {0}")]
	Internal(String),

	#[error("Not found")]
	NotFound,
}

impl ApiError {
	pub fn image_required() -> Self {
		Self::InvalidInput("Image required".to_string())
	}

	pub fn status_code(&self) -> StatusCode {
		match self {
			Self::InvalidInput(_) | Self::MissingIdentifier { .. } => StatusCode::BAD_REQUEST,
			Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
			Self::DimensionMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
			Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::NotFound => StatusCode::NOT_FOUND,
		}
	}

	pub fn error_code(&self) -> &'static str {
		match self {
			Self::InvalidInput(_) => "INVALID_INPUT",
			Self::MissingIdentifier { .. } => "MISSING_IDENTIFIER",
			Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
			Self::DimensionMismatch(_) => "DIMENSION_MISMATCH",
			Self::Internal(_) => "INTERNAL_ERROR",
			Self::NotFound => "NOT_FOUND",
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = self.status_code();
		let message = self.to_string();

		if status.is_server_error() {
			error!("{}", message);
		} else {
			debug!("Rejected request ({}): {}", status.as_u16(), message);
		}

		let body = Json(json!({
			"success": false,
			"code": self.error_code(),
			"message": message,
		}));

		(status, body).into_response()
	}
}

impl From<anyhow::Error> for ApiError {
	fn from(err: anyhow::Error) -> Self {
		ApiError::Internal(format!("{:#}", err))
	}
}

impl From<tokio::task::JoinError> for ApiError {
	fn from(err: tokio::task::JoinError) -> Self {
		ApiError::Internal(format!("Worker task failed: {}", err))
	}
}

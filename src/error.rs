use axum::{
	extract::rejection::{JsonRejection, QueryRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::time::DateError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
	#[error("{0}")]
	NotFound(String),

	#[error("{0}")]
	Validation(String),

	/// duplicate unique value or not enough copies
	#[error("{0}")]
	Conflict(String),

	#[error("Authentication credentials were not provided or are invalid.")]
	Unauthorized,

	#[error("{0}")]
	Database(String),
}

impl AppError {
	pub fn not_found(msg: impl Into<String>) -> Self {
		AppError::NotFound(msg.into())
	}

	pub fn validation(msg: impl Into<String>) -> Self {
		AppError::Validation(msg.into())
	}

	pub fn conflict(msg: impl Into<String>) -> Self {
		AppError::Conflict(msg.into())
	}

	pub fn status(&self) -> StatusCode {
		match self {
			AppError::NotFound(_) => StatusCode::NOT_FOUND,
			AppError::Validation(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
			AppError::Unauthorized => StatusCode::UNAUTHORIZED,
			AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		let status = self.status();
		if let AppError::Database(msg) = &self {
			error!(target: "database", error = %msg, "database error");
		}

		(status, Json(json!({ "error": self.to_string() }))).into_response()
	}
}

impl From<sqlx::Error> for AppError {
	fn from(err: sqlx::Error) -> Self {
		match &err {
			sqlx::Error::RowNotFound => AppError::not_found("Not found."),
			sqlx::Error::Database(db) if db.is_unique_violation() => {
				AppError::conflict(db.message().to_string())
			},
			sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
				AppError::not_found("Referenced record does not exist.")
			},
			sqlx::Error::Database(db) if db.is_check_violation() => {
				AppError::validation(db.message().to_string())
			},
			_ => AppError::Database(err.to_string()),
		}
	}
}

impl From<JsonRejection> for AppError {
	fn from(rejection: JsonRejection) -> Self {
		AppError::validation(rejection.body_text())
	}
}

impl From<QueryRejection> for AppError {
	fn from(rejection: QueryRejection) -> Self {
		AppError::validation(rejection.body_text())
	}
}

impl From<DateError> for AppError {
	fn from(err: DateError) -> Self {
		AppError::validation(err.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn conflict_and_validation_share_bad_request() {
		assert_eq!(AppError::conflict("dup").status(), StatusCode::BAD_REQUEST);
		assert_eq!(AppError::validation("bad").status(), StatusCode::BAD_REQUEST);
		assert_eq!(AppError::not_found("gone").status(), StatusCode::NOT_FOUND);
		assert_eq!(
			AppError::Database("locked".into()).status(),
			StatusCode::INTERNAL_SERVER_ERROR
		);
	}

	#[test]
	fn row_not_found_maps_to_not_found() {
		let err: AppError = sqlx::Error::RowNotFound.into();
		assert!(matches!(err, AppError::NotFound(_)));
	}
}

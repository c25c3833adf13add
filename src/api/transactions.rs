use axum::{
	extract::{rejection::JsonRejection, Path, State},
	http::StatusCode,
	Json,
};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::repo::{books, transactions};
use crate::types::{BookTransaction, NewBookTransaction, TransactionId};
use crate::SharedState;

/// GET /book_transactions/
pub async fn list(State(state): State<SharedState>) -> AppResult<Json<Vec<BookTransaction>>> {
	Ok(Json(transactions::find_all(&state.db).await?))
}

/// POST /book_transactions/
pub async fn create(
	State(state): State<SharedState>,
	payload: Result<Json<NewBookTransaction>, JsonRejection>,
) -> AppResult<(StatusCode, Json<BookTransaction>)> {
	let Json(payload) = payload?;
	let row = transactions::create(&state.db, payload).await?;
	Ok((StatusCode::CREATED, Json(row)))
}

/// GET /book_transactions/{id}/
pub async fn get_by_id(
	State(state): State<SharedState>,
	Path(id): Path<TransactionId>,
) -> AppResult<Json<BookTransaction>> {
	Ok(Json(transactions::get(&state.db, id).await?))
}

/// PATCH /book_transactions/{id}/ and /book_transactions/{id}/return/
pub async fn mark_returned(
	State(state): State<SharedState>,
	Path(id): Path<TransactionId>,
) -> AppResult<Json<Value>> {
	let row = transactions::mark_returned(&state.db, id).await?;
	let book = books::get(&state.db, row.book_id).await?;
	Ok(Json(json!({
		"success": format!("Book '{}' marked as returned.", book.title)
	})))
}

/// DELETE /book_transactions/{id}/
pub async fn delete(
	State(state): State<SharedState>,
	Path(id): Path<TransactionId>,
) -> AppResult<StatusCode> {
	if transactions::delete(&state.db, id).await? {
		Ok(StatusCode::NO_CONTENT)
	} else {
		Err(AppError::not_found("Transaction not found."))
	}
}

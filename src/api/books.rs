use axum::{
	extract::{rejection::JsonRejection, Path, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::repo::{books, transactions};
use crate::time;
use crate::types::{Bid, Book, BookUpdate, CodeChange, NewBook};
use crate::validation::{required_text, MAX_CODE_LEN};
use crate::SharedState;

/// GET /books/
pub async fn list(State(state): State<SharedState>) -> AppResult<Json<Vec<Book>>> {
	Ok(Json(books::find_all(&state.db).await?))
}

/// POST /books/ - the optional `copies` list is placed in the same step
pub async fn create(
	State(state): State<SharedState>,
	payload: Result<Json<NewBook>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Book>)> {
	let Json(payload) = payload?;
	payload.validate()?;
	let book = books::create(&state.db, payload).await?;
	Ok((StatusCode::CREATED, Json(book)))
}

/// GET /books/{id}/
pub async fn get_by_id(
	State(state): State<SharedState>,
	Path(id): Path<Bid>,
) -> AppResult<Json<Book>> {
	Ok(Json(books::get(&state.db, id).await?))
}

/// PATCH /books/{id}/ and /books/{id}/discard/
///
/// A body carrying `is_discarded` only flips that flag.
pub async fn update(
	State(state): State<SharedState>,
	Path(id): Path<Bid>,
	payload: Result<Json<BookUpdate>, JsonRejection>,
) -> AppResult<Response> {
	let Json(payload) = payload?;
	if let Some(discarded) = payload.is_discarded {
		let book = books::set_discarded(&state.db, id, discarded).await?;
		return Ok(Json(json!({
			"success": "Book status updated successfully.",
			"book": book,
		})).into_response());
	}
	payload.validate()?;
	Ok(Json(books::update(&state.db, id, payload).await?).into_response())
}

/// DELETE /books/{id}/
pub async fn delete(
	State(state): State<SharedState>,
	Path(id): Path<Bid>,
) -> AppResult<StatusCode> {
	if books::delete(&state.db, id).await? {
		Ok(StatusCode::NO_CONTENT)
	} else {
		Err(AppError::not_found("Book not found."))
	}
}

/// GET /books/{id}/update_code/
pub async fn code(
	State(state): State<SharedState>,
	Path(id): Path<Bid>,
) -> AppResult<Json<Value>> {
	let book = books::get(&state.db, id).await?;
	Ok(Json(json!({
		"book": { "id": book.id, "title": book.title, "current_code": book.code }
	})))
}

/// PATCH /books/{id}/update_code/
pub async fn change_code(
	State(state): State<SharedState>,
	Path(id): Path<Bid>,
	payload: Result<Json<CodeChange>, JsonRejection>,
) -> AppResult<Json<Value>> {
	let Json(payload) = payload?;
	let new_code = payload
		.new_code
		.filter(|c| !c.trim().is_empty())
		.ok_or_else(|| AppError::validation("New code is required."))?;
	required_text(&new_code, "new_code", MAX_CODE_LEN)?;

	let book = books::update_code(&state.db, id, &new_code).await?;
	Ok(Json(json!({
		"success": "Book code updated successfully.",
		"book": { "id": book.id, "title": book.title, "new_code": book.code },
	})))
}

/// GET /books/late/
pub async fn late(State(state): State<SharedState>) -> AppResult<Json<Value>> {
	let overdue = transactions::overdue(&state.db, time::today()).await?;
	Ok(Json(json!({ "overdue_books": overdue })))
}

/// GET /books/low_stock/
pub async fn low_stock(
	State(state): State<SharedState>,
) -> AppResult<Json<Vec<transactions::LowStockEntry>>> {
	Ok(Json(transactions::low_stock(&state.db).await?))
}

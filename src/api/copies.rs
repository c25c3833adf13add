use axum::{
	extract::{rejection::JsonRejection, Path, State},
	http::StatusCode,
	Json,
};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::repo::{books, copies, rooms};
use crate::types::{Bid, BookCopy, CopyChange, CopyId, CopyTransfer, CopyUpdate, RoomId};
use crate::validation::positive;
use crate::SharedState;

fn required_change(change: CopyChange) -> AppResult<(RoomId, i64)> {
	match (change.room_id, change.quantity) {
		(Some(room_id), Some(quantity)) if quantity != 0 => {
			positive(quantity, "quantity")?;
			Ok((room_id, quantity))
		},
		_ => Err(AppError::validation("Room ID and quantity are required.")),
	}
}

/// GET /books/{id}/manage_copies/
pub async fn list_for_book(
	State(state): State<SharedState>,
	Path(book_id): Path<Bid>,
) -> AppResult<Json<Value>> {
	let book = books::get(&state.db, book_id).await?;
	let copies: Vec<Value> = copies::list_for_book(&state.db, book_id)
		.await?
		.into_iter()
		.map(|c| json!({ "room": c.room_name, "quantity": c.quantity }))
		.collect();
	let total = copies::total_for_book(&state.db, book_id).await?;
	Ok(Json(json!({ "book": book.title, "copies": copies, "total": total })))
}

/// POST /books/{id}/manage_copies/
pub async fn add(
	State(state): State<SharedState>,
	Path(book_id): Path<Bid>,
	payload: Result<Json<CopyChange>, JsonRejection>,
) -> AppResult<Json<Value>> {
	let Json(payload) = payload?;
	let (room_id, quantity) = required_change(payload)?;

	copies::add(&state.db, book_id, room_id, quantity).await?;
	let book = books::get(&state.db, book_id).await?;
	let room = rooms::get(&state.db, room_id).await?;
	Ok(Json(json!({
		"success": format!("Added {quantity} copies of '{}' to room {}.", book.title, room.name)
	})))
}

/// DELETE /books/{id}/manage_copies/
pub async fn remove(
	State(state): State<SharedState>,
	Path(book_id): Path<Bid>,
	payload: Result<Json<CopyChange>, JsonRejection>,
) -> AppResult<Json<Value>> {
	let Json(payload) = payload?;
	let (room_id, quantity) = required_change(payload)?;

	copies::remove(&state.db, book_id, room_id, quantity).await?;
	let book = books::get(&state.db, book_id).await?;
	let room = rooms::get(&state.db, room_id).await?;
	Ok(Json(json!({
		"success": format!("Removed {quantity} copies of '{}' from room {}.", book.title, room.name)
	})))
}

/// GET /books/{id}/transfer/
pub async fn placements(
	State(state): State<SharedState>,
	Path(book_id): Path<Bid>,
) -> AppResult<Json<Value>> {
	let copies = copies::list_for_book(&state.db, book_id).await?;
	if copies.is_empty() {
		return Err(AppError::not_found("No copies found for this book."));
	}
	Ok(Json(json!({ "copies": copies })))
}

/// PATCH /books/{id}/transfer/
pub async fn transfer(
	State(state): State<SharedState>,
	Path(book_id): Path<Bid>,
	payload: Result<Json<CopyTransfer>, JsonRejection>,
) -> AppResult<Json<Value>> {
	let Json(payload) = payload?;
	let (Some(source), Some(target), Some(quantity)) =
		(payload.source_room_id, payload.target_room_id, payload.quantity)
	else {
		return Err(AppError::validation(
			"source_room_id, target_room_id and quantity are required.",
		));
	};
	positive(quantity, "quantity")?;

	copies::transfer(&state.db, book_id, source, target, quantity).await?;
	Ok(Json(json!({
		"success": format!("{quantity} copies moved from room {source} to room {target}.")
	})))
}

/// GET /book_copies/
pub async fn list(State(state): State<SharedState>) -> AppResult<Json<Vec<BookCopy>>> {
	Ok(Json(copies::find_all(&state.db).await?))
}

/// GET /book_copies/{id}/
pub async fn get_by_id(
	State(state): State<SharedState>,
	Path(id): Path<CopyId>,
) -> AppResult<Json<BookCopy>> {
	copies::find_by_id(&state.db, id)
		.await?
		.map(Json)
		.ok_or_else(|| AppError::not_found("Book copy not found."))
}

/// PATCH /book_copies/{id}/ - zero removes the row
pub async fn update(
	State(state): State<SharedState>,
	Path(id): Path<CopyId>,
	payload: Result<Json<CopyUpdate>, JsonRejection>,
) -> AppResult<Json<Value>> {
	let Json(payload) = payload?;
	let quantity = payload
		.quantity
		.ok_or_else(|| AppError::validation("quantity is required."))?;

	match copies::set_quantity(&state.db, id, quantity).await? {
		Some(copy) => Ok(Json(json!(copy))),
		None => Ok(Json(json!({ "success": "Book copy removed." }))),
	}
}

/// DELETE /book_copies/{id}/
pub async fn delete(
	State(state): State<SharedState>,
	Path(id): Path<CopyId>,
) -> AppResult<StatusCode> {
	if copies::delete(&state.db, id).await? {
		Ok(StatusCode::NO_CONTENT)
	} else {
		Err(AppError::not_found("Book copy not found."))
	}
}

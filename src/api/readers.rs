use axum::{
	extract::{rejection::JsonRejection, Path, State},
	http::StatusCode,
	Json,
};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::repo::{readers, rooms, transactions};
use crate::time;
use crate::types::{
	NewReader, Reader, ReaderId, ReaderTransfer, ReaderUpdate, RoomAssignment, TicketChange,
};
use crate::validation::{required_text, MAX_CODE_LEN};
use crate::SharedState;

/// GET /readers/
pub async fn list(State(state): State<SharedState>) -> AppResult<Json<Vec<Reader>>> {
	Ok(Json(readers::find_all(&state.db).await?))
}

/// POST /readers/
pub async fn create(
	State(state): State<SharedState>,
	payload: Result<Json<NewReader>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Reader>)> {
	let Json(payload) = payload?;
	payload.validate()?;
	let reader = readers::create(&state.db, payload).await?;
	Ok((StatusCode::CREATED, Json(reader)))
}

/// GET /readers/{id}/
pub async fn get_by_id(
	State(state): State<SharedState>,
	Path(id): Path<ReaderId>,
) -> AppResult<Json<Reader>> {
	Ok(Json(readers::get(&state.db, id).await?))
}

/// PATCH /readers/{id}/
pub async fn update(
	State(state): State<SharedState>,
	Path(id): Path<ReaderId>,
	payload: Result<Json<ReaderUpdate>, JsonRejection>,
) -> AppResult<Json<Reader>> {
	let Json(payload) = payload?;
	payload.validate()?;
	Ok(Json(readers::update(&state.db, id, payload).await?))
}

/// DELETE /readers/{id}/
pub async fn delete(
	State(state): State<SharedState>,
	Path(id): Path<ReaderId>,
) -> AppResult<StatusCode> {
	if readers::delete(&state.db, id).await? {
		Ok(StatusCode::NO_CONTENT)
	} else {
		Err(AppError::not_found("Reader not found."))
	}
}

/// PATCH /readers/{id}/assign_room/
pub async fn assign_room(
	State(state): State<SharedState>,
	Path(id): Path<ReaderId>,
	payload: Result<Json<RoomAssignment>, JsonRejection>,
) -> AppResult<Json<Reader>> {
	let Json(payload) = payload?;
	let room_id = payload
		.assigned_room
		.ok_or_else(|| AppError::validation("assigned_room is required."))?;
	Ok(Json(readers::assign_room(&state.db, id, room_id).await?))
}

/// GET /readers/{id}/transfer/
pub async fn current_room(
	State(state): State<SharedState>,
	Path(id): Path<ReaderId>,
) -> AppResult<Json<Value>> {
	let reader = readers::get(&state.db, id).await?;
	let room = match reader.assigned_room {
		Some(room_id) => rooms::get(&state.db, room_id).await?.name,
		None => "No room assigned".to_string(),
	};
	Ok(Json(json!({ "reader": reader.full_name, "assigned_room": room })))
}

/// POST /readers/{id}/transfer/
pub async fn transfer(
	State(state): State<SharedState>,
	Path(id): Path<ReaderId>,
	payload: Result<Json<ReaderTransfer>, JsonRejection>,
) -> AppResult<Json<Value>> {
	let Json(payload) = payload?;
	let room_id = payload
		.room_id
		.ok_or_else(|| AppError::validation("Room ID is required."))?;

	let reader = readers::assign_room(&state.db, id, room_id).await?;
	let room = rooms::get(&state.db, room_id).await?;
	Ok(Json(json!({
		"success": format!("Reader '{}' transferred to room '{}'.", reader.full_name, room.name)
	})))
}

/// GET /readers/{id}/update_ticket/
pub async fn ticket(
	State(state): State<SharedState>,
	Path(id): Path<ReaderId>,
) -> AppResult<Json<Value>> {
	let reader = readers::get(&state.db, id).await?;
	Ok(Json(json!({
		"reader": {
			"id": reader.id,
			"full_name": reader.full_name,
			"current_ticket_number": reader.ticket_number,
		}
	})))
}

/// PATCH /readers/{id}/update_ticket/
pub async fn change_ticket(
	State(state): State<SharedState>,
	Path(id): Path<ReaderId>,
	payload: Result<Json<TicketChange>, JsonRejection>,
) -> AppResult<Json<Value>> {
	let Json(payload) = payload?;
	let ticket = payload
		.new_ticket_number
		.filter(|t| !t.trim().is_empty())
		.ok_or_else(|| AppError::validation("New ticket number is required."))?;
	required_text(&ticket, "new_ticket_number", MAX_CODE_LEN)?;

	let reader = readers::update_ticket(&state.db, id, &ticket).await?;
	Ok(Json(json!({
		"success": "Ticket number updated successfully.",
		"reader": {
			"id": reader.id,
			"full_name": reader.full_name,
			"new_ticket_number": reader.ticket_number,
		},
	})))
}

/// GET /readers/{id}/books/
pub async fn books(
	State(state): State<SharedState>,
	Path(id): Path<ReaderId>,
) -> AppResult<Json<Value>> {
	readers::get(&state.db, id).await?;
	let held = transactions::held_by_reader(&state.db, id).await?;
	Ok(Json(json!({ "books_assigned_to_reader": held })))
}

/// GET /readers/remove_old/
pub async fn removable(State(state): State<SharedState>) -> AppResult<Json<Value>> {
	let stale = readers::find_removable(&state.db, time::today()).await?;
	Ok(Json(json!({ "potentially_removable_readers": stale })))
}

/// DELETE /readers/remove_old/
pub async fn remove_old(State(state): State<SharedState>) -> AppResult<Json<Value>> {
	let removed = readers::remove_stale(&state.db, time::today()).await?;
	Ok(Json(json!({ "removed_readers_count": removed })))
}

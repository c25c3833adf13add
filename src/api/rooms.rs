use axum::{
	extract::{rejection::JsonRejection, Path, State},
	http::StatusCode,
	Json,
};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::repo::{readers, rooms};
use crate::types::{NewReadingRoom, ReadingRoom, ReadingRoomUpdate, RoomId};
use crate::SharedState;

/// GET /reading_rooms/
pub async fn list(State(state): State<SharedState>) -> AppResult<Json<Vec<ReadingRoom>>> {
	Ok(Json(rooms::find_all(&state.db).await?))
}

/// POST /reading_rooms/
pub async fn create(
	State(state): State<SharedState>,
	payload: Result<Json<NewReadingRoom>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ReadingRoom>)> {
	let Json(payload) = payload?;
	payload.validate()?;
	let room = rooms::create(&state.db, payload).await?;
	Ok((StatusCode::CREATED, Json(room)))
}

/// GET /reading_rooms/{id}/
pub async fn get_by_id(
	State(state): State<SharedState>,
	Path(id): Path<RoomId>,
) -> AppResult<Json<ReadingRoom>> {
	Ok(Json(rooms::get(&state.db, id).await?))
}

/// PATCH /reading_rooms/{id}/
pub async fn update(
	State(state): State<SharedState>,
	Path(id): Path<RoomId>,
	payload: Result<Json<ReadingRoomUpdate>, JsonRejection>,
) -> AppResult<Json<ReadingRoom>> {
	let Json(payload) = payload?;
	payload.validate()?;
	Ok(Json(rooms::update(&state.db, id, payload).await?))
}

/// DELETE /reading_rooms/{id}/
pub async fn delete(
	State(state): State<SharedState>,
	Path(id): Path<RoomId>,
) -> AppResult<StatusCode> {
	if rooms::delete(&state.db, id).await? {
		Ok(StatusCode::NO_CONTENT)
	} else {
		Err(AppError::not_found("Reading room not found."))
	}
}

/// GET /reading_rooms/{id}/readers/
pub async fn readers(
	State(state): State<SharedState>,
	Path(id): Path<RoomId>,
) -> AppResult<Json<Value>> {
	let room = rooms::get(&state.db, id).await?;
	let readers = readers::find_by_room(&state.db, id).await?;
	Ok(Json(json!({ "room": room.name, "readers": readers })))
}

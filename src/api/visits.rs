use axum::{
	extract::{rejection::JsonRejection, Path, State},
	http::StatusCode,
	Json,
};

use crate::error::{AppError, AppResult};
use crate::repo::visits;
use crate::types::{NewVisit, Visit, VisitId};
use crate::SharedState;

pub async fn list(State(state): State<SharedState>) -> AppResult<Json<Vec<Visit>>> {
	Ok(Json(visits::find_all(&state.db).await?))
}

pub async fn create(
	State(state): State<SharedState>,
	payload: Result<Json<NewVisit>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Visit>)> {
	let Json(payload) = payload?;
	payload.validate()?;
	let visit = visits::create(&state.db, payload).await?;
	Ok((StatusCode::CREATED, Json(visit)))
}

pub async fn get_by_id(
	State(state): State<SharedState>,
	Path(id): Path<VisitId>,
) -> AppResult<Json<Visit>> {
	Ok(Json(visits::get(&state.db, id).await?))
}

pub async fn delete(
	State(state): State<SharedState>,
	Path(id): Path<VisitId>,
) -> AppResult<StatusCode> {
	if visits::delete(&state.db, id).await? {
		Ok(StatusCode::NO_CONTENT)
	} else {
		Err(AppError::not_found("Visit not found."))
	}
}

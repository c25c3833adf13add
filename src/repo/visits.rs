use tracing::info;

use crate::error::{AppError, AppResult};
use crate::repo::{require_reader, require_room};
use crate::sql::Db;
use crate::types::{NewVisit, Visit, VisitId};

const COLUMNS: &str = "id, room_id, reader_id, visit_date, visit_time, duration_min";

pub async fn find_all(db: &Db) -> AppResult<Vec<Visit>> {
	let visits = sqlx::query_as::<_, Visit>(&format!(
		"SELECT {COLUMNS} FROM reading_room_visit ORDER BY visit_date, visit_time"
	))
	.fetch_all(db)
	.await?;
	Ok(visits)
}

pub async fn get(db: &Db, id: VisitId) -> AppResult<Visit> {
	sqlx::query_as::<_, Visit>(&format!("SELECT {COLUMNS} FROM reading_room_visit WHERE id = ?"))
		.bind(id)
		.fetch_optional(db)
		.await?
		.ok_or_else(|| AppError::not_found("Visit not found."))
}

pub async fn create(db: &Db, data: NewVisit) -> AppResult<Visit> {
	require_room(&mut *db.acquire().await?, data.room).await?;
	require_reader(&mut *db.acquire().await?, data.reader).await?;

	let visit = sqlx::query_as::<_, Visit>(&format!(
		"INSERT INTO reading_room_visit (room_id, reader_id, visit_date, visit_time, duration_min) \
		 VALUES (?, ?, ?, ?, ?) RETURNING {COLUMNS}"
	))
	.bind(data.room)
	.bind(data.reader)
	.bind(data.visit_date)
	.bind(data.visit_time)
	.bind(data.duration_min)
	.fetch_one(db)
	.await?;
	info!(visit_id = visit.id, room_id = visit.room_id, reader_id = visit.reader_id, "visit logged");
	Ok(visit)
}

pub async fn delete(db: &Db, id: VisitId) -> AppResult<bool> {
	let result = sqlx::query("DELETE FROM reading_room_visit WHERE id = ?")
		.bind(id)
		.execute(db)
		.await?;
	Ok(result.rows_affected() > 0)
}

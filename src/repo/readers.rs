use chrono::{Duration, NaiveDate};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::repo::require_room;
use crate::sql::Db;
use crate::types::{NewReader, Reader, ReaderId, ReaderUpdate, RemovableReader, RoomId};

/// Readers registered this long ago and never re-registered may be removed.
pub const REGISTRATION_TTL_DAYS: i64 = 365;

const COLUMNS: &str = "id, ticket_number, full_name, passport_number, birth_date, address, \
	phone_number, education_level, has_academic_degree, assigned_room, registration_date, re_registered";

pub async fn find_all(db: &Db) -> AppResult<Vec<Reader>> {
	let readers = sqlx::query_as::<_, Reader>(&format!("SELECT {COLUMNS} FROM reader ORDER BY id"))
		.fetch_all(db)
		.await?;
	Ok(readers)
}

pub async fn find_by_id(db: &Db, id: ReaderId) -> AppResult<Option<Reader>> {
	let reader = sqlx::query_as::<_, Reader>(&format!("SELECT {COLUMNS} FROM reader WHERE id = ?"))
		.bind(id)
		.fetch_optional(db)
		.await?;
	Ok(reader)
}

pub async fn get(db: &Db, id: ReaderId) -> AppResult<Reader> {
	find_by_id(db, id)
		.await?
		.ok_or_else(|| AppError::not_found("Reader not found."))
}

pub async fn find_by_room(db: &Db, room_id: RoomId) -> AppResult<Vec<Reader>> {
	let readers = sqlx::query_as::<_, Reader>(&format!(
		"SELECT {COLUMNS} FROM reader WHERE assigned_room = ? ORDER BY id"
	))
	.bind(room_id)
	.fetch_all(db)
	.await?;
	Ok(readers)
}

async fn ticket_taken(db: &Db, ticket: &str, except: Option<ReaderId>) -> AppResult<bool> {
	let taken: bool = sqlx::query_scalar(
		"SELECT EXISTS(SELECT 1 FROM reader WHERE ticket_number = ? AND id IS NOT ?)",
	)
	.bind(ticket)
	.bind(except)
	.fetch_one(db)
	.await?;
	Ok(taken)
}

fn ticket_conflict() -> AppError {
	AppError::conflict("This ticket number is already in use.")
}

pub async fn create(db: &Db, data: NewReader) -> AppResult<Reader> {
	if ticket_taken(db, &data.ticket_number, None).await? {
		return Err(ticket_conflict());
	}
	if let Some(room_id) = data.assigned_room {
		require_room(&mut *db.acquire().await?, room_id).await?;
	}

	let reader = sqlx::query_as::<_, Reader>(&format!(
		"INSERT INTO reader (ticket_number, full_name, passport_number, birth_date, address, \
		 phone_number, education_level, has_academic_degree, assigned_room, registration_date, re_registered) \
		 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {COLUMNS}"
	))
	.bind(&data.ticket_number)
	.bind(&data.full_name)
	.bind(&data.passport_number)
	.bind(data.birth_date)
	.bind(&data.address)
	.bind(&data.phone_number)
	.bind(&data.education_level)
	.bind(data.has_academic_degree)
	.bind(data.assigned_room)
	.bind(data.registration_date)
	.bind(data.re_registered)
	.fetch_one(db)
	.await?;
	info!(reader_id = reader.id, ticket = %reader.ticket_number, "reader registered");
	Ok(reader)
}

pub async fn update(db: &Db, id: ReaderId, data: ReaderUpdate) -> AppResult<Reader> {
	if let Some(ticket) = &data.ticket_number {
		if ticket_taken(db, ticket, Some(id)).await? {
			return Err(ticket_conflict());
		}
	}
	if let Some(Some(room_id)) = data.assigned_room {
		require_room(&mut *db.acquire().await?, room_id).await?;
	}

	sqlx::query_as::<_, Reader>(&format!(
		"UPDATE reader SET ticket_number = COALESCE(?, ticket_number), full_name = COALESCE(?, full_name), \
		 passport_number = COALESCE(?, passport_number), birth_date = COALESCE(?, birth_date), \
		 address = COALESCE(?, address), phone_number = COALESCE(?, phone_number), \
		 education_level = COALESCE(?, education_level), \
		 has_academic_degree = COALESCE(?, has_academic_degree), \
		 assigned_room = CASE WHEN ? THEN ? ELSE assigned_room END, \
		 registration_date = COALESCE(?, registration_date), \
		 re_registered = COALESCE(?, re_registered) \
		 WHERE id = ? RETURNING {COLUMNS}"
	))
	.bind(data.ticket_number)
	.bind(data.full_name)
	.bind(data.passport_number)
	.bind(data.birth_date)
	.bind(data.address)
	.bind(data.phone_number)
	.bind(data.education_level)
	.bind(data.has_academic_degree)
	.bind(data.assigned_room.is_some())
	.bind(data.assigned_room.flatten())
	.bind(data.registration_date)
	.bind(data.re_registered)
	.bind(id)
	.fetch_optional(db)
	.await?
	.ok_or_else(|| AppError::not_found("Reader not found."))
}

pub async fn update_ticket(db: &Db, id: ReaderId, ticket: &str) -> AppResult<Reader> {
	let reader = update(db, id, ReaderUpdate {
		ticket_number: Some(ticket.to_string()),
		..Default::default()
	}).await?;
	info!(reader_id = id, ticket, "reader ticket changed");
	Ok(reader)
}

/// Overwrites any previous assignment.
pub async fn assign_room(db: &Db, id: ReaderId, room_id: RoomId) -> AppResult<Reader> {
	get(db, id).await?;
	let reader = update(db, id, ReaderUpdate {
		assigned_room: Some(Some(room_id)),
		..Default::default()
	}).await?;
	info!(reader_id = id, room_id, "reader assigned to room");
	Ok(reader)
}

/// Transactions and visits of the reader are removed with them.
pub async fn delete(db: &Db, id: ReaderId) -> AppResult<bool> {
	let result = sqlx::query("DELETE FROM reader WHERE id = ?")
		.bind(id)
		.execute(db)
		.await?;
	let deleted = result.rows_affected() > 0;
	if deleted {
		info!(reader_id = id, "reader deleted");
	}
	Ok(deleted)
}

fn registration_cutoff(today: NaiveDate) -> NaiveDate {
	today - Duration::days(REGISTRATION_TTL_DAYS)
}

pub async fn find_removable(db: &Db, today: NaiveDate) -> AppResult<Vec<RemovableReader>> {
	let readers = sqlx::query_as::<_, RemovableReader>(
		"SELECT id, full_name, registration_date, re_registered FROM reader \
		 WHERE registration_date <= ? AND re_registered = false ORDER BY id",
	)
	.bind(registration_cutoff(today))
	.fetch_all(db)
	.await?;
	Ok(readers)
}

/// Deletes every reader [`find_removable`] would list and returns how many went.
pub async fn remove_stale(db: &Db, today: NaiveDate) -> AppResult<u64> {
	let result = sqlx::query("DELETE FROM reader WHERE registration_date <= ? AND re_registered = false")
		.bind(registration_cutoff(today))
		.execute(db)
		.await?;
	let removed = result.rows_affected();
	info!(removed, "stale readers removed");
	Ok(removed)
}

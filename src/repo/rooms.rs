use tracing::info;

use crate::error::{AppError, AppResult};
use crate::sql::Db;
use crate::types::{NewReadingRoom, ReadingRoom, ReadingRoomUpdate, RoomId};

const COLUMNS: &str = "id, number, name, capacity";

pub async fn find_all(db: &Db) -> AppResult<Vec<ReadingRoom>> {
	let rooms = sqlx::query_as::<_, ReadingRoom>(&format!(
		"SELECT {COLUMNS} FROM reading_room ORDER BY number"
	))
	.fetch_all(db)
	.await?;
	Ok(rooms)
}

pub async fn find_by_id(db: &Db, id: RoomId) -> AppResult<Option<ReadingRoom>> {
	let room = sqlx::query_as::<_, ReadingRoom>(&format!(
		"SELECT {COLUMNS} FROM reading_room WHERE id = ?"
	))
	.bind(id)
	.fetch_optional(db)
	.await?;
	Ok(room)
}

pub async fn get(db: &Db, id: RoomId) -> AppResult<ReadingRoom> {
	find_by_id(db, id)
		.await?
		.ok_or_else(|| AppError::not_found("Reading room not found."))
}

async fn number_taken(db: &Db, number: i64, except: Option<RoomId>) -> AppResult<bool> {
	let taken: bool = sqlx::query_scalar(
		"SELECT EXISTS(SELECT 1 FROM reading_room WHERE number = ? AND id IS NOT ?)",
	)
	.bind(number)
	.bind(except)
	.fetch_one(db)
	.await?;
	Ok(taken)
}

pub async fn create(db: &Db, data: NewReadingRoom) -> AppResult<ReadingRoom> {
	if number_taken(db, data.number, None).await? {
		return Err(AppError::conflict(format!(
			"Reading room number {} is already in use.",
			data.number
		)));
	}
	let room = sqlx::query_as::<_, ReadingRoom>(&format!(
		"INSERT INTO reading_room (number, name, capacity) VALUES (?, ?, ?) RETURNING {COLUMNS}"
	))
	.bind(data.number)
	.bind(&data.name)
	.bind(data.capacity)
	.fetch_one(db)
	.await?;
	info!(room_id = room.id, number = room.number, "reading room created");
	Ok(room)
}

pub async fn update(db: &Db, id: RoomId, data: ReadingRoomUpdate) -> AppResult<ReadingRoom> {
	if let Some(number) = data.number {
		if number_taken(db, number, Some(id)).await? {
			return Err(AppError::conflict(format!(
				"Reading room number {number} is already in use."
			)));
		}
	}
	sqlx::query_as::<_, ReadingRoom>(&format!(
		"UPDATE reading_room SET number = COALESCE(?, number), name = COALESCE(?, name), \
		 capacity = COALESCE(?, capacity) WHERE id = ? RETURNING {COLUMNS}"
	))
	.bind(data.number)
	.bind(data.name)
	.bind(data.capacity)
	.bind(id)
	.fetch_optional(db)
	.await?
	.ok_or_else(|| AppError::not_found("Reading room not found."))
}

/// Copies and visits in the room go with it, assigned readers lose their room.
pub async fn delete(db: &Db, id: RoomId) -> AppResult<bool> {
	let result = sqlx::query("DELETE FROM reading_room WHERE id = ?")
		.bind(id)
		.execute(db)
		.await?;
	let deleted = result.rows_affected() > 0;
	if deleted {
		info!(room_id = id, "reading room deleted");
	}
	Ok(deleted)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::repo::fixtures;
	use crate::sql;

	#[tokio::test]
	async fn room_number_is_unique() {
		let db = sql::memory().await;
		fixtures::room(&db, 1).await;

		let dup = create(&db, NewReadingRoom { number: 1, name: "Other".into(), capacity: 5 }).await;
		assert!(matches!(dup, Err(AppError::Conflict(_))));
		assert_eq!(find_all(&db).await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn partial_update_keeps_other_fields() {
		let db = sql::memory().await;
		let room = fixtures::room(&db, 3).await;

		let updated = update(&db, room.id, ReadingRoomUpdate {
			capacity: Some(50),
			..Default::default()
		}).await.unwrap();
		assert_eq!(updated.capacity, 50);
		assert_eq!(updated.number, 3);
		assert_eq!(updated.name, "Room 3");

		// keeping its own number is not a collision
		let same = update(&db, room.id, ReadingRoomUpdate {
			number: Some(3),
			..Default::default()
		}).await;
		assert!(same.is_ok());
	}

	#[tokio::test]
	async fn deleting_room_unassigns_readers() {
		let db = sql::memory().await;
		let room = fixtures::room(&db, 7).await;
		let reader = fixtures::reader(&db, "T-1").await;
		crate::repo::readers::assign_room(&db, reader.id, room.id).await.unwrap();

		assert!(delete(&db, room.id).await.unwrap());
		assert!(!delete(&db, room.id).await.unwrap());

		let reader = crate::repo::readers::get(&db, reader.id).await.unwrap();
		assert_eq!(reader.assigned_room, None);
	}

	#[tokio::test]
	async fn missing_room_is_not_found() {
		let db = sql::memory().await;
		assert!(matches!(get(&db, 42).await, Err(AppError::NotFound(_))));
		let res = update(&db, 42, ReadingRoomUpdate::default()).await;
		assert!(matches!(res, Err(AppError::NotFound(_))));
	}
}

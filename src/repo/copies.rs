//! Per-room copy counts.
//!
//! A `(book, room)` pair owns at most one row. Quantities only move through
//! [`put`] (insert-or-increment) and [`take`] (conditional decrement), both
//! single statements, so concurrent requests cannot lose an update; a row
//! that reaches zero is deleted in the same transaction.

use sqlx::SqliteConnection;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::repo::{require_book, require_room};
use crate::sql::Db;
use crate::types::{Bid, BookCopy, CopyId, CopyInRoom, RoomId};

const COLUMNS: &str = "id, book_id, room_id, quantity";

pub async fn find_all(db: &Db) -> AppResult<Vec<BookCopy>> {
	let copies = sqlx::query_as::<_, BookCopy>(&format!("SELECT {COLUMNS} FROM book_copy ORDER BY id"))
		.fetch_all(db)
		.await?;
	Ok(copies)
}

pub async fn find_by_id(db: &Db, id: CopyId) -> AppResult<Option<BookCopy>> {
	let copy = sqlx::query_as::<_, BookCopy>(&format!("SELECT {COLUMNS} FROM book_copy WHERE id = ?"))
		.bind(id)
		.fetch_optional(db)
		.await?;
	Ok(copy)
}

pub async fn list_for_book(db: &Db, book_id: Bid) -> AppResult<Vec<CopyInRoom>> {
	let copies = sqlx::query_as::<_, CopyInRoom>(
		"SELECT c.room_id, r.name AS room_name, c.quantity \
		 FROM book_copy c JOIN reading_room r ON r.id = c.room_id \
		 WHERE c.book_id = ? ORDER BY r.number",
	)
	.bind(book_id)
	.fetch_all(db)
	.await?;
	Ok(copies)
}

pub async fn total_for_book(db: &Db, book_id: Bid) -> AppResult<i64> {
	let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(quantity), 0) FROM book_copy WHERE book_id = ?")
		.bind(book_id)
		.fetch_one(db)
		.await?;
	Ok(total)
}

/// Creates the row on first use, otherwise increments it.
/// A sum past `i64::MAX` is refused before anything is written.
pub(crate) async fn put(conn: &mut SqliteConnection, book_id: Bid, room_id: RoomId, quantity: i64) -> AppResult<BookCopy> {
	let present: Option<i64> = sqlx::query_scalar(
		"SELECT quantity FROM book_copy WHERE book_id = ? AND room_id = ?",
	)
	.bind(book_id)
	.bind(room_id)
	.fetch_optional(&mut *conn)
	.await?;
	if present.unwrap_or(0).checked_add(quantity).is_none() {
		return Err(AppError::validation(format!(
			"Cannot add {quantity} copies, the total for this room is too large."
		)));
	}

	let copy = sqlx::query_as::<_, BookCopy>(&format!(
		"INSERT INTO book_copy (book_id, room_id, quantity) VALUES (?, ?, ?) \
		 ON CONFLICT(book_id, room_id) DO UPDATE SET quantity = quantity + excluded.quantity \
		 RETURNING {COLUMNS}"
	))
	.bind(book_id)
	.bind(room_id)
	.bind(quantity)
	.fetch_one(conn)
	.await?;
	Ok(copy)
}

/// Decrements only when enough copies are present; returns what is left.
/// Must run inside a transaction, the zero-row cleanup is a second statement.
pub(crate) async fn take(conn: &mut SqliteConnection, book_id: Bid, room_id: RoomId, quantity: i64) -> AppResult<i64> {
	let remaining: Option<i64> = sqlx::query_scalar(
		"UPDATE book_copy SET quantity = quantity - ? \
		 WHERE book_id = ? AND room_id = ? AND quantity >= ? RETURNING quantity",
	)
	.bind(quantity)
	.bind(book_id)
	.bind(room_id)
	.bind(quantity)
	.fetch_optional(&mut *conn)
	.await?;

	let Some(remaining) = remaining else {
		let available: Option<i64> = sqlx::query_scalar(
			"SELECT quantity FROM book_copy WHERE book_id = ? AND room_id = ?",
		)
		.bind(book_id)
		.bind(room_id)
		.fetch_optional(&mut *conn)
		.await?;
		return Err(match available {
			Some(available) => AppError::conflict(format!(
				"Cannot remove {quantity} copies. Only {available} available."
			)),
			None => AppError::not_found("Book copy not found in this room."),
		});
	};

	if remaining == 0 {
		sqlx::query("DELETE FROM book_copy WHERE book_id = ? AND room_id = ? AND quantity = 0")
			.bind(book_id)
			.bind(room_id)
			.execute(&mut *conn)
			.await?;
	}
	Ok(remaining)
}

pub async fn add(db: &Db, book_id: Bid, room_id: RoomId, quantity: i64) -> AppResult<BookCopy> {
	require_book(&mut *db.acquire().await?, book_id).await?;
	require_room(&mut *db.acquire().await?, room_id).await?;

	let mut tx = db.begin().await?;
	let copy = put(&mut tx, book_id, room_id, quantity).await?;
	tx.commit().await?;
	info!(book_id, room_id, added = quantity, quantity = copy.quantity, "copies added");
	Ok(copy)
}

/// Returns the quantity left in the room, zero meaning the row is gone.
pub async fn remove(db: &Db, book_id: Bid, room_id: RoomId, quantity: i64) -> AppResult<i64> {
	require_book(&mut *db.acquire().await?, book_id).await?;
	require_room(&mut *db.acquire().await?, room_id).await?;

	let mut tx = db.begin().await?;
	let remaining = take(&mut tx, book_id, room_id, quantity).await?;
	tx.commit().await?;

	info!(book_id, room_id, removed = quantity, remaining, "copies removed");
	Ok(remaining)
}

/// Moves copies of one book between rooms. Both sides commit together or not at all.
pub async fn transfer(db: &Db, book_id: Bid, source: RoomId, target: RoomId, quantity: i64) -> AppResult<()> {
	if source == target {
		return Err(AppError::validation("Source and target rooms must differ."));
	}
	require_room(&mut *db.acquire().await?, target).await?;

	let mut tx = db.begin().await?;
	take(&mut tx, book_id, source, quantity).await.map_err(|e| match e {
		AppError::NotFound(_) => AppError::not_found("Book copy not found in the source room."),
		other => other,
	})?;
	put(&mut tx, book_id, target, quantity).await?;
	tx.commit().await?;

	info!(book_id, source, target, quantity, "copies transferred");
	Ok(())
}

/// Overwrites the quantity of a copy row; zero deletes the row.
pub async fn set_quantity(db: &Db, id: CopyId, quantity: i64) -> AppResult<Option<BookCopy>> {
	if quantity < 0 {
		return Err(AppError::validation("quantity must not be negative."));
	}
	if quantity == 0 {
		return if delete(db, id).await? {
			Ok(None)
		} else {
			Err(AppError::not_found("Book copy not found."))
		};
	}
	sqlx::query_as::<_, BookCopy>(&format!(
		"UPDATE book_copy SET quantity = ? WHERE id = ? RETURNING {COLUMNS}"
	))
	.bind(quantity)
	.bind(id)
	.fetch_optional(db)
	.await?
	.map(Some)
	.ok_or_else(|| AppError::not_found("Book copy not found."))
}

pub async fn delete(db: &Db, id: CopyId) -> AppResult<bool> {
	let result = sqlx::query("DELETE FROM book_copy WHERE id = ?")
		.bind(id)
		.execute(db)
		.await?;
	Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::repo::fixtures;
	use crate::sql;

	async fn find(db: &Db, book_id: Bid, room_id: RoomId) -> AppResult<Option<BookCopy>> {
		let copy = sqlx::query_as::<_, BookCopy>(&format!(
			"SELECT {COLUMNS} FROM book_copy WHERE book_id = ? AND room_id = ?"
		))
		.bind(book_id)
		.bind(room_id)
		.fetch_optional(db)
		.await?;
		Ok(copy)
	}

	#[tokio::test]
	async fn adding_then_removing_all_leaves_no_row() {
		let db = sql::memory().await;
		let room = fixtures::room(&db, 1).await;
		let book = fixtures::book(&db, "B1").await;

		add(&db, book.id, room.id, 2).await.unwrap();
		let copy = add(&db, book.id, room.id, 3).await.unwrap();
		assert_eq!(copy.quantity, 5);

		assert_eq!(remove(&db, book.id, room.id, 5).await.unwrap(), 0);
		assert!(find(&db, book.id, room.id).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn over_removal_keeps_quantity() {
		let db = sql::memory().await;
		let room = fixtures::room(&db, 1).await;
		let book = fixtures::book(&db, "B1").await;
		add(&db, book.id, room.id, 2).await.unwrap();

		let res = remove(&db, book.id, room.id, 3).await;
		match res {
			Err(AppError::Conflict(msg)) => assert!(msg.contains("Only 2 available")),
			other => panic!("unexpected {other:?}"),
		}
		assert_eq!(find(&db, book.id, room.id).await.unwrap().unwrap().quantity, 2);
	}

	#[tokio::test]
	async fn removing_from_empty_room_is_not_found() {
		let db = sql::memory().await;
		let room = fixtures::room(&db, 1).await;
		let book = fixtures::book(&db, "B1").await;
		let res = remove(&db, book.id, room.id, 1).await;
		assert!(matches!(res, Err(AppError::NotFound(_))));
	}

	#[tokio::test]
	async fn adding_to_unknown_room_fails() {
		let db = sql::memory().await;
		let book = fixtures::book(&db, "B1").await;
		assert!(matches!(add(&db, book.id, 77, 1).await, Err(AppError::NotFound(_))));
		assert!(matches!(add(&db, 55, 77, 1).await, Err(AppError::NotFound(_))));
	}

	#[tokio::test]
	async fn transfer_conserves_total() {
		let db = sql::memory().await;
		let a = fixtures::room(&db, 1).await;
		let b = fixtures::room(&db, 2).await;
		let book = fixtures::book(&db, "B1").await;
		add(&db, book.id, a.id, 5).await.unwrap();

		transfer(&db, book.id, a.id, b.id, 3).await.unwrap();
		assert_eq!(find(&db, book.id, a.id).await.unwrap().unwrap().quantity, 2);
		assert_eq!(find(&db, book.id, b.id).await.unwrap().unwrap().quantity, 3);
		assert_eq!(total_for_book(&db, book.id).await.unwrap(), 5);

		// moving the rest empties the source row
		transfer(&db, book.id, a.id, b.id, 2).await.unwrap();
		assert!(find(&db, book.id, a.id).await.unwrap().is_none());
		assert_eq!(find(&db, book.id, b.id).await.unwrap().unwrap().quantity, 5);
	}

	#[tokio::test]
	async fn failed_transfer_changes_nothing() {
		let db = sql::memory().await;
		let a = fixtures::room(&db, 1).await;
		let b = fixtures::room(&db, 2).await;
		let book = fixtures::book(&db, "B1").await;
		add(&db, book.id, a.id, 1).await.unwrap();

		let res = transfer(&db, book.id, a.id, b.id, 4).await;
		assert!(matches!(res, Err(AppError::Conflict(_))));
		assert_eq!(find(&db, book.id, a.id).await.unwrap().unwrap().quantity, 1);
		assert!(find(&db, book.id, b.id).await.unwrap().is_none());

		let res = transfer(&db, book.id, b.id, a.id, 1).await;
		assert!(matches!(res, Err(AppError::NotFound(_))));
		let res = transfer(&db, book.id, a.id, a.id, 1).await;
		assert!(matches!(res, Err(AppError::Validation(_))));
	}

	#[tokio::test]
	async fn setting_zero_quantity_deletes_row() {
		let db = sql::memory().await;
		let room = fixtures::room(&db, 1).await;
		let book = fixtures::book(&db, "B1").await;
		let copy = add(&db, book.id, room.id, 4).await.unwrap();

		let updated = set_quantity(&db, copy.id, 7).await.unwrap().unwrap();
		assert_eq!(updated.quantity, 7);
		assert!(set_quantity(&db, copy.id, 0).await.unwrap().is_none());
		assert!(find_by_id(&db, copy.id).await.unwrap().is_none());
		assert!(matches!(set_quantity(&db, copy.id, -1).await, Err(AppError::Validation(_))));
	}

	#[tokio::test]
	async fn overflowing_add_keeps_row_readable() {
		let db = sql::memory().await;
		let a = fixtures::room(&db, 1).await;
		let b = fixtures::room(&db, 2).await;
		let book = fixtures::book(&db, "B1").await;
		add(&db, book.id, a.id, 1).await.unwrap();

		let res = add(&db, book.id, a.id, i64::MAX).await;
		assert!(matches!(res, Err(AppError::Validation(_))));
		assert_eq!(find(&db, book.id, a.id).await.unwrap().unwrap().quantity, 1);
		assert_eq!(total_for_book(&db, book.id).await.unwrap(), 1);
		assert_eq!(list_for_book(&db, book.id).await.unwrap()[0].quantity, 1);

		// the target side overflowing undoes the source side too
		add(&db, book.id, b.id, i64::MAX).await.unwrap();
		let res = transfer(&db, book.id, a.id, b.id, 1).await;
		assert!(matches!(res, Err(AppError::Validation(_))));
		assert_eq!(find(&db, book.id, a.id).await.unwrap().unwrap().quantity, 1);
		assert_eq!(find(&db, book.id, b.id).await.unwrap().unwrap().quantity, i64::MAX);
	}

	#[tokio::test]
	async fn schema_refuses_non_integer_quantity() {
		let db = sql::memory().await;
		let room = fixtures::room(&db, 1).await;
		let book = fixtures::book(&db, "B1").await;
		let res = sqlx::query("INSERT INTO book_copy (book_id, room_id, quantity) VALUES (?, ?, 1.5e19)")
			.bind(book.id)
			.bind(room.id)
			.execute(&db)
			.await;
		assert!(res.is_err());
		assert!(list_for_book(&db, book.id).await.unwrap().is_empty());
	}
}

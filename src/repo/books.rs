use tracing::info;

use crate::error::{AppError, AppResult};
use crate::repo::{copies, room_exists};
use crate::sql::Db;
use crate::types::{Bid, Book, BookUpdate, NewBook};

const COLUMNS: &str = "id, title, authors, publisher, publication_year, section, code, is_discarded";

pub async fn find_all(db: &Db) -> AppResult<Vec<Book>> {
	let books = sqlx::query_as::<_, Book>(&format!("SELECT {COLUMNS} FROM book ORDER BY id"))
		.fetch_all(db)
		.await?;
	Ok(books)
}

pub async fn find_by_id(db: &Db, id: Bid) -> AppResult<Option<Book>> {
	let book = sqlx::query_as::<_, Book>(&format!("SELECT {COLUMNS} FROM book WHERE id = ?"))
		.bind(id)
		.fetch_optional(db)
		.await?;
	Ok(book)
}

pub async fn get(db: &Db, id: Bid) -> AppResult<Book> {
	find_by_id(db, id)
		.await?
		.ok_or_else(|| AppError::not_found("Book not found."))
}

async fn code_taken(db: &Db, code: &str, except: Option<Bid>) -> AppResult<bool> {
	let taken: bool = sqlx::query_scalar(
		"SELECT EXISTS(SELECT 1 FROM book WHERE code = ? AND id IS NOT ?)",
	)
	.bind(code)
	.bind(except)
	.fetch_one(db)
	.await?;
	Ok(taken)
}

fn code_conflict(code: &str) -> AppError {
	AppError::conflict(format!("Book code '{code}' is already in use."))
}

/// Inserts the book and its initial copies as one unit; an unknown room
/// leaves nothing behind.
pub async fn create(db: &Db, data: NewBook) -> AppResult<Book> {
	if code_taken(db, &data.code, None).await? {
		return Err(code_conflict(&data.code));
	}

	let mut tx = db.begin().await?;
	let book = sqlx::query_as::<_, Book>(&format!(
		"INSERT INTO book (title, authors, publisher, publication_year, section, code, is_discarded) \
		 VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {COLUMNS}"
	))
	.bind(&data.title)
	.bind(&data.authors)
	.bind(&data.publisher)
	.bind(data.publication_year)
	.bind(&data.section)
	.bind(&data.code)
	.bind(data.is_discarded)
	.fetch_one(&mut *tx)
	.await?;

	for copy in &data.copies {
		if !room_exists(&mut tx, copy.room_id).await? {
			return Err(AppError::validation(format!(
				"Room with ID {} does not exist.",
				copy.room_id
			)));
		}
		copies::put(&mut tx, book.id, copy.room_id, copy.quantity).await?;
	}
	tx.commit().await?;

	info!(book_id = book.id, code = %book.code, copies = data.copies.len(), "book created");
	Ok(book)
}

pub async fn update(db: &Db, id: Bid, data: BookUpdate) -> AppResult<Book> {
	if let Some(code) = &data.code {
		if code_taken(db, code, Some(id)).await? {
			return Err(code_conflict(code));
		}
	}
	sqlx::query_as::<_, Book>(&format!(
		"UPDATE book SET title = COALESCE(?, title), authors = COALESCE(?, authors), \
		 publisher = COALESCE(?, publisher), publication_year = COALESCE(?, publication_year), \
		 section = COALESCE(?, section), code = COALESCE(?, code), \
		 is_discarded = COALESCE(?, is_discarded) WHERE id = ? RETURNING {COLUMNS}"
	))
	.bind(data.title)
	.bind(data.authors)
	.bind(data.publisher)
	.bind(data.publication_year)
	.bind(data.section)
	.bind(data.code)
	.bind(data.is_discarded)
	.bind(id)
	.fetch_optional(db)
	.await?
	.ok_or_else(|| AppError::not_found("Book not found."))
}

pub async fn set_discarded(db: &Db, id: Bid, discarded: bool) -> AppResult<Book> {
	let book = update(db, id, BookUpdate {
		is_discarded: Some(discarded),
		..Default::default()
	}).await?;
	info!(book_id = id, discarded, "book discard flag changed");
	Ok(book)
}

pub async fn update_code(db: &Db, id: Bid, code: &str) -> AppResult<Book> {
	let book = update(db, id, BookUpdate {
		code: Some(code.to_string()),
		..Default::default()
	}).await?;
	info!(book_id = id, code, "book code changed");
	Ok(book)
}

/// Copies and ledger entries of the book are removed with it.
pub async fn delete(db: &Db, id: Bid) -> AppResult<bool> {
	let result = sqlx::query("DELETE FROM book WHERE id = ?")
		.bind(id)
		.execute(db)
		.await?;
	let deleted = result.rows_affected() > 0;
	if deleted {
		info!(book_id = id, "book deleted");
	}
	Ok(deleted)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::repo::fixtures;
	use crate::sql;
	use crate::types::CopyPlacement;

	fn new_book(code: &str, copies: Vec<CopyPlacement>) -> NewBook {
		NewBook {
			title: "Solaris".into(),
			authors: "S. Lem".into(),
			publisher: "MIR".into(),
			publication_year: 1961,
			section: "Sci-fi".into(),
			code: code.into(),
			is_discarded: false,
			copies,
		}
	}

	#[tokio::test]
	async fn create_places_initial_copies() {
		let db = sql::memory().await;
		let a = fixtures::room(&db, 1).await;
		let b = fixtures::room(&db, 2).await;

		let book = create(&db, new_book("S-1", vec![
			CopyPlacement { room_id: a.id, quantity: 2 },
			CopyPlacement { room_id: b.id, quantity: 4 },
		])).await.unwrap();

		let copies = copies::list_for_book(&db, book.id).await.unwrap();
		let total: i64 = copies.iter().map(|c| c.quantity).sum();
		assert_eq!(copies.len(), 2);
		assert_eq!(total, 6);
	}

	#[tokio::test]
	async fn unknown_room_rolls_back_creation() {
		let db = sql::memory().await;
		let a = fixtures::room(&db, 1).await;

		let res = create(&db, new_book("S-2", vec![
			CopyPlacement { room_id: a.id, quantity: 1 },
			CopyPlacement { room_id: 999, quantity: 1 },
		])).await;
		assert!(matches!(res, Err(AppError::Validation(_))));
		assert!(find_all(&db).await.unwrap().is_empty());
		assert!(copies::find_all(&db).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn code_collision_on_another_book_is_rejected() {
		let db = sql::memory().await;
		let first = fixtures::book(&db, "B1").await;
		let second = fixtures::book(&db, "B2").await;

		let res = update_code(&db, second.id, "B1").await;
		assert!(matches!(res, Err(AppError::Conflict(_))));
		assert_eq!(get(&db, second.id).await.unwrap().code, "B2");

		// re-setting its own code is fine
		assert_eq!(update_code(&db, first.id, "B1").await.unwrap().code, "B1");
		assert_eq!(update_code(&db, first.id, "B9").await.unwrap().code, "B9");
	}

	#[tokio::test]
	async fn delete_cascades_to_copies() {
		let db = sql::memory().await;
		let room = fixtures::room(&db, 1).await;
		let book = fixtures::book(&db, "B1").await;
		copies::add(&db, book.id, room.id, 3).await.unwrap();

		assert!(delete(&db, book.id).await.unwrap());
		assert!(copies::find_all(&db).await.unwrap().is_empty());
		assert!(matches!(get(&db, book.id).await, Err(AppError::NotFound(_))));
	}

	#[tokio::test]
	async fn discard_flag_round_trips() {
		let db = sql::memory().await;
		let book = fixtures::book(&db, "B1").await;
		assert!(set_discarded(&db, book.id, true).await.unwrap().is_discarded);
		assert!(!set_discarded(&db, book.id, false).await.unwrap().is_discarded);
	}
}

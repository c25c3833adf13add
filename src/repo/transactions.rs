use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::repo::{require_book, require_reader};
use crate::sql::Db;
use crate::types::{
	Bid, BookTransaction, NewBookTransaction, ReaderId, ReaderSummary, TransactionId,
};

/// A checkout older than this and still out is overdue.
pub const LOAN_PERIOD_DAYS: i64 = 30;

/// Books with this many copies or fewer across all rooms are low on stock.
pub const LOW_STOCK_THRESHOLD: i64 = 2;

const COLUMNS: &str = "id, book_id, reader_id, transaction_date, transaction_type, due_date, returned";

pub async fn find_all(db: &Db) -> AppResult<Vec<BookTransaction>> {
	let rows = sqlx::query_as::<_, BookTransaction>(&format!(
		"SELECT {COLUMNS} FROM book_transaction ORDER BY id"
	))
	.fetch_all(db)
	.await?;
	Ok(rows)
}

pub async fn find_by_id(db: &Db, id: TransactionId) -> AppResult<Option<BookTransaction>> {
	let row = sqlx::query_as::<_, BookTransaction>(&format!(
		"SELECT {COLUMNS} FROM book_transaction WHERE id = ?"
	))
	.bind(id)
	.fetch_optional(db)
	.await?;
	Ok(row)
}

pub async fn get(db: &Db, id: TransactionId) -> AppResult<BookTransaction> {
	find_by_id(db, id)
		.await?
		.ok_or_else(|| AppError::not_found("Transaction not found."))
}

pub async fn create(db: &Db, data: NewBookTransaction) -> AppResult<BookTransaction> {
	require_book(&mut *db.acquire().await?, data.book).await?;
	require_reader(&mut *db.acquire().await?, data.reader).await?;

	let row = sqlx::query_as::<_, BookTransaction>(&format!(
		"INSERT INTO book_transaction (book_id, reader_id, transaction_date, transaction_type, due_date, returned) \
		 VALUES (?, ?, ?, ?, ?, ?) RETURNING {COLUMNS}"
	))
	.bind(data.book)
	.bind(data.reader)
	.bind(data.transaction_date)
	.bind(data.transaction_type)
	.bind(data.due_date)
	.bind(data.returned)
	.fetch_one(db)
	.await?;
	info!(
		transaction_id = row.id,
		book_id = row.book_id,
		reader_id = row.reader_id,
		kind = ?row.transaction_type,
		"transaction recorded"
	);
	Ok(row)
}

/// Sets `returned`; the flag never goes back to false.
pub async fn mark_returned(db: &Db, id: TransactionId) -> AppResult<BookTransaction> {
	let row = sqlx::query_as::<_, BookTransaction>(&format!(
		"UPDATE book_transaction SET returned = true WHERE id = ? RETURNING {COLUMNS}"
	))
	.bind(id)
	.fetch_optional(db)
	.await?
	.ok_or_else(|| AppError::not_found("Transaction not found."))?;
	info!(transaction_id = id, "book returned");
	Ok(row)
}

pub async fn delete(db: &Db, id: TransactionId) -> AppResult<bool> {
	let result = sqlx::query("DELETE FROM book_transaction WHERE id = ?")
		.bind(id)
		.execute(db)
		.await?;
	Ok(result.rows_affected() > 0)
}

/// Books the reader has not brought back yet.
pub async fn held_by_reader(db: &Db, reader_id: ReaderId) -> AppResult<Vec<BookTransaction>> {
	let rows = sqlx::query_as::<_, BookTransaction>(&format!(
		"SELECT {COLUMNS} FROM book_transaction WHERE reader_id = ? AND returned = false ORDER BY id"
	))
	.bind(reader_id)
	.fetch_all(db)
	.await?;
	Ok(rows)
}

pub async fn overdue(db: &Db, today: NaiveDate) -> AppResult<Vec<BookTransaction>> {
	let rows = sqlx::query_as::<_, BookTransaction>(&format!(
		"SELECT {COLUMNS} FROM book_transaction \
		 WHERE transaction_type = 'checkout' AND transaction_date <= ? AND returned = false ORDER BY id"
	))
	.bind(today - Duration::days(LOAN_PERIOD_DAYS))
	.fetch_all(db)
	.await?;
	Ok(rows)
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LowStockBook {
	pub id: Bid,
	pub title: String,
	pub authors: String,
	pub current_code: String,
	pub total_quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LowStockEntry {
	pub book: LowStockBook,
	pub readers: Vec<ReaderSummary>,
}

#[derive(sqlx::FromRow)]
struct Holder {
	book_id: Bid,
	id: ReaderId,
	full_name: String,
	ticket_number: String,
}

/// Books whose copies across all rooms add up to at most
/// [`LOW_STOCK_THRESHOLD`], each with the readers holding an unreturned
/// copy (one entry per open transaction). Books without any copy row are
/// not listed.
pub async fn low_stock(db: &Db) -> AppResult<Vec<LowStockEntry>> {
	let books = sqlx::query_as::<_, LowStockBook>(
		"SELECT b.id, b.title, b.authors, b.code AS current_code, SUM(c.quantity) AS total_quantity \
		 FROM book_copy c JOIN book b ON b.id = c.book_id \
		 GROUP BY b.id, b.title, b.authors, b.code HAVING SUM(c.quantity) <= ? ORDER BY b.id",
	)
	.bind(LOW_STOCK_THRESHOLD)
	.fetch_all(db)
	.await?;

	let holders = sqlx::query_as::<_, Holder>(
		"SELECT t.book_id, r.id, r.full_name, r.ticket_number \
		 FROM book_transaction t JOIN reader r ON r.id = t.reader_id \
		 WHERE t.returned = false AND t.book_id IN \
		 (SELECT book_id FROM book_copy GROUP BY book_id HAVING SUM(quantity) <= ?) \
		 ORDER BY t.id",
	)
	.bind(LOW_STOCK_THRESHOLD)
	.fetch_all(db)
	.await?;

	let entries = books
		.into_iter()
		.map(|book| {
			let readers = holders
				.iter()
				.filter(|h| h.book_id == book.id)
				.map(|h| ReaderSummary {
					id: h.id,
					full_name: h.full_name.clone(),
					ticket_number: h.ticket_number.clone(),
				})
				.collect();
			LowStockEntry { book, readers }
		})
		.collect();
	Ok(entries)
}

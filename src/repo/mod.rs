//! Storage queries, one module per table.
//!
//! Every function takes the pool (or a connection borrowed from an open
//! transaction) explicitly; nothing here holds state between calls.

pub mod books;
pub mod copies;
pub mod readers;
pub mod reports;
pub mod rooms;
pub mod transactions;
pub mod visits;

use sqlx::SqliteConnection;

use crate::error::{AppError, AppResult};
use crate::types::{Bid, ReaderId, RoomId};

pub(crate) async fn room_exists(conn: &mut SqliteConnection, id: RoomId) -> AppResult<bool> {
	let found: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM reading_room WHERE id = ?)")
		.bind(id)
		.fetch_one(conn)
		.await?;
	Ok(found)
}

pub(crate) async fn require_room(conn: &mut SqliteConnection, id: RoomId) -> AppResult<()> {
	if room_exists(conn, id).await? {
		Ok(())
	} else {
		Err(AppError::not_found("Reading room not found."))
	}
}

pub(crate) async fn require_book(conn: &mut SqliteConnection, id: Bid) -> AppResult<()> {
	let found: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM book WHERE id = ?)")
		.bind(id)
		.fetch_one(conn)
		.await?;
	if found {
		Ok(())
	} else {
		Err(AppError::not_found("Book not found."))
	}
}

pub(crate) async fn require_reader(conn: &mut SqliteConnection, id: ReaderId) -> AppResult<()> {
	let found: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM reader WHERE id = ?)")
		.bind(id)
		.fetch_one(conn)
		.await?;
	if found {
		Ok(())
	} else {
		Err(AppError::not_found("Reader not found."))
	}
}

#[cfg(test)]
pub(crate) mod fixtures {
	use chrono::NaiveDate;

	use crate::sql::Db;
	use crate::types::*;

	pub async fn room(db: &Db, number: i64) -> ReadingRoom {
		super::rooms::create(db, NewReadingRoom {
			number,
			name: format!("Room {number}"),
			capacity: 20,
		}).await.unwrap()
	}

	pub async fn book(db: &Db, code: &str) -> Book {
		super::books::create(db, NewBook {
			title: format!("Title {code}"),
			authors: "A. Author".into(),
			publisher: "Press".into(),
			publication_year: 1999,
			section: "Fiction".into(),
			code: code.into(),
			is_discarded: false,
			copies: vec![],
		}).await.unwrap()
	}

	pub fn new_reader(ticket: &str, registered: NaiveDate) -> NewReader {
		NewReader {
			ticket_number: ticket.into(),
			full_name: format!("Reader {ticket}"),
			passport_number: "4000 123456".into(),
			birth_date: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
			address: "1 Main St".into(),
			phone_number: "+100000".into(),
			education_level: "higher".into(),
			has_academic_degree: false,
			assigned_room: None,
			registration_date: registered,
			re_registered: false,
		}
	}

	pub async fn reader(db: &Db, ticket: &str) -> Reader {
		let registered = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
		super::readers::create(db, new_reader(ticket, registered)).await.unwrap()
	}
}

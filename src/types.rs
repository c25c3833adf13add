use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::validation::{
	non_negative, optional_text, positive, required_text,
	MAX_CODE_LEN, MAX_NAME_LEN, MAX_PHONE_LEN,
};

pub type RoomId = i64;
pub type Bid = i64;
pub type ReaderId = i64;
pub type CopyId = i64;
pub type TransactionId = i64;
pub type VisitId = i64;

// ---- reading rooms

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReadingRoom {
	pub id: RoomId,
	pub number: i64,
	pub name: String,
	pub capacity: i64,
}

#[derive(Debug, Deserialize)]
pub struct NewReadingRoom {
	pub number: i64,
	pub name: String,
	pub capacity: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReadingRoomUpdate {
	pub number: Option<i64>,
	pub name: Option<String>,
	pub capacity: Option<i64>,
}

impl NewReadingRoom {
	pub fn validate(&self) -> AppResult<()> {
		required_text(&self.name, "name", MAX_NAME_LEN)?;
		non_negative(self.capacity, "capacity")
	}
}

impl ReadingRoomUpdate {
	pub fn validate(&self) -> AppResult<()> {
		optional_text(&self.name, "name", MAX_NAME_LEN)?;
		self.capacity.map_or(Ok(()), |c| non_negative(c, "capacity"))
	}
}

// ---- books

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Book {
	pub id: Bid,
	pub title: String,
	pub authors: String,
	pub publisher: String,
	pub publication_year: i32,
	pub section: String,
	pub code: String,
	pub is_discarded: bool,
}

/// Initial placement of copies when a book is catalogued.
#[derive(Debug, Clone, Deserialize)]
pub struct CopyPlacement {
	pub room_id: RoomId,
	pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct NewBook {
	pub title: String,
	pub authors: String,
	pub publisher: String,
	pub publication_year: i32,
	pub section: String,
	pub code: String,
	#[serde(default)]
	pub is_discarded: bool,
	#[serde(default)]
	pub copies: Vec<CopyPlacement>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BookUpdate {
	pub title: Option<String>,
	pub authors: Option<String>,
	pub publisher: Option<String>,
	pub publication_year: Option<i32>,
	pub section: Option<String>,
	pub code: Option<String>,
	pub is_discarded: Option<bool>,
}

impl NewBook {
	pub fn validate(&self) -> AppResult<()> {
		required_text(&self.title, "title", MAX_NAME_LEN)?;
		required_text(&self.authors, "authors", MAX_NAME_LEN)?;
		required_text(&self.publisher, "publisher", MAX_NAME_LEN)?;
		required_text(&self.section, "section", MAX_NAME_LEN)?;
		required_text(&self.code, "code", MAX_CODE_LEN)?;
		for copy in &self.copies {
			positive(copy.quantity, "quantity")?;
		}
		Ok(())
	}
}

impl BookUpdate {
	pub fn validate(&self) -> AppResult<()> {
		optional_text(&self.title, "title", MAX_NAME_LEN)?;
		optional_text(&self.authors, "authors", MAX_NAME_LEN)?;
		optional_text(&self.publisher, "publisher", MAX_NAME_LEN)?;
		optional_text(&self.section, "section", MAX_NAME_LEN)?;
		optional_text(&self.code, "code", MAX_CODE_LEN)
	}
}

// ---- copies

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BookCopy {
	pub id: CopyId,
	#[serde(rename = "book")]
	pub book_id: Bid,
	#[serde(rename = "room")]
	pub room_id: RoomId,
	pub quantity: i64,
}

/// A copy row joined with its room, as listed per book.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CopyInRoom {
	pub room_id: RoomId,
	pub room_name: String,
	pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CopyChange {
	pub room_id: Option<RoomId>,
	pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CopyTransfer {
	pub source_room_id: Option<RoomId>,
	pub target_room_id: Option<RoomId>,
	pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CopyUpdate {
	pub quantity: Option<i64>,
}

// ---- readers

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Reader {
	pub id: ReaderId,
	pub ticket_number: String,
	pub full_name: String,
	pub passport_number: String,
	pub birth_date: NaiveDate,
	pub address: String,
	pub phone_number: String,
	pub education_level: String,
	pub has_academic_degree: bool,
	pub assigned_room: Option<RoomId>,
	pub registration_date: NaiveDate,
	pub re_registered: bool,
}

#[derive(Debug, Deserialize)]
pub struct NewReader {
	pub ticket_number: String,
	pub full_name: String,
	pub passport_number: String,
	pub birth_date: NaiveDate,
	pub address: String,
	pub phone_number: String,
	pub education_level: String,
	#[serde(default)]
	pub has_academic_degree: bool,
	pub assigned_room: Option<RoomId>,
	pub registration_date: NaiveDate,
	#[serde(default)]
	pub re_registered: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReaderUpdate {
	pub ticket_number: Option<String>,
	pub full_name: Option<String>,
	pub passport_number: Option<String>,
	pub birth_date: Option<NaiveDate>,
	pub address: Option<String>,
	pub phone_number: Option<String>,
	pub education_level: Option<String>,
	pub has_academic_degree: Option<bool>,
	/// absent keeps the room, `null` clears it
	#[serde(default, with = "::serde_with::rust::double_option")]
	pub assigned_room: Option<Option<RoomId>>,
	pub registration_date: Option<NaiveDate>,
	pub re_registered: Option<bool>,
}

impl NewReader {
	pub fn validate(&self) -> AppResult<()> {
		required_text(&self.ticket_number, "ticket_number", MAX_CODE_LEN)?;
		required_text(&self.full_name, "full_name", MAX_NAME_LEN)?;
		required_text(&self.passport_number, "passport_number", MAX_CODE_LEN)?;
		required_text(&self.address, "address", MAX_NAME_LEN)?;
		required_text(&self.phone_number, "phone_number", MAX_PHONE_LEN)?;
		required_text(&self.education_level, "education_level", MAX_CODE_LEN)
	}
}

impl ReaderUpdate {
	pub fn validate(&self) -> AppResult<()> {
		optional_text(&self.ticket_number, "ticket_number", MAX_CODE_LEN)?;
		optional_text(&self.full_name, "full_name", MAX_NAME_LEN)?;
		optional_text(&self.passport_number, "passport_number", MAX_CODE_LEN)?;
		optional_text(&self.address, "address", MAX_NAME_LEN)?;
		optional_text(&self.phone_number, "phone_number", MAX_PHONE_LEN)?;
		optional_text(&self.education_level, "education_level", MAX_CODE_LEN)
	}
}

/// Short reader card used where only identity matters.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReaderSummary {
	pub id: ReaderId,
	pub full_name: String,
	pub ticket_number: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RemovableReader {
	pub id: ReaderId,
	pub full_name: String,
	pub registration_date: NaiveDate,
	pub re_registered: bool,
}

#[derive(Debug, Deserialize)]
pub struct RoomAssignment {
	pub assigned_room: Option<RoomId>,
}

#[derive(Debug, Deserialize)]
pub struct ReaderTransfer {
	pub room_id: Option<RoomId>,
}

#[derive(Debug, Deserialize)]
pub struct TicketChange {
	pub new_ticket_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CodeChange {
	pub new_code: Option<String>,
}

// ---- lending ledger

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TransactionKind {
	Checkout,
	Return,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BookTransaction {
	pub id: TransactionId,
	#[serde(rename = "book")]
	pub book_id: Bid,
	#[serde(rename = "reader")]
	pub reader_id: ReaderId,
	pub transaction_date: NaiveDate,
	pub transaction_type: TransactionKind,
	pub due_date: Option<NaiveDate>,
	pub returned: bool,
}

#[derive(Debug, Deserialize)]
pub struct NewBookTransaction {
	pub book: Bid,
	pub reader: ReaderId,
	pub transaction_date: NaiveDate,
	pub transaction_type: TransactionKind,
	pub due_date: Option<NaiveDate>,
	#[serde(default)]
	pub returned: bool,
}

// ---- visits

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Visit {
	pub id: VisitId,
	#[serde(rename = "room")]
	pub room_id: RoomId,
	#[serde(rename = "reader")]
	pub reader_id: ReaderId,
	pub visit_date: NaiveDate,
	pub visit_time: NaiveTime,
	pub duration_min: i64,
}

#[derive(Debug, Deserialize)]
pub struct NewVisit {
	pub room: RoomId,
	pub reader: ReaderId,
	pub visit_date: NaiveDate,
	pub visit_time: NaiveTime,
	pub duration_min: i64,
}

impl NewVisit {
	pub fn validate(&self) -> AppResult<()> {
		non_negative(self.duration_min, "duration_min")
	}
}

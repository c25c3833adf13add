//! Periodic figures over visits, books and readers.
//!
//! Two "under 20" counts exist. The reader statistics compare
//! birth years, the summary uses a fixed 20×365-day window. They disagree
//! around birthdays and leap days and are kept apart.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::error::AppResult;
use crate::sql::Db;
use crate::time::ReportPeriod;

pub const YOUTH_AGE: i32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RoomVisits {
	pub room_name: String,
	pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
	pub room_data: Vec<RoomVisits>,
	pub total_books: i64,
	pub new_readers: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReaderStatistics {
	pub readers_under_20: i64,
	pub education_statistics: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
	pub readers_under_20: i64,
	pub education_statistics: BTreeMap<String, f64>,
	pub room_data: Vec<RoomVisits>,
	pub total_books: i64,
}

/// Visits inside the period grouped by room name.
pub async fn room_visits(db: &Db, period: ReportPeriod) -> AppResult<Vec<RoomVisits>> {
	let rows = sqlx::query_as::<_, RoomVisits>(
		"SELECT r.name AS room_name, COUNT(v.reader_id) AS count \
		 FROM reading_room_visit v JOIN reading_room r ON r.id = v.room_id \
		 WHERE v.visit_date BETWEEN ? AND ? \
		 GROUP BY r.name ORDER BY r.name",
	)
	.bind(period.start)
	.bind(period.end)
	.fetch_all(db)
	.await?;
	Ok(rows)
}

pub async fn total_books(db: &Db) -> AppResult<i64> {
	let total: i64 = sqlx::query_scalar("SELECT COUNT(id) FROM book")
		.fetch_one(db)
		.await?;
	Ok(total)
}

pub async fn new_readers(db: &Db, period: ReportPeriod) -> AppResult<i64> {
	let count: i64 = sqlx::query_scalar(
		"SELECT COUNT(id) FROM reader WHERE registration_date BETWEEN ? AND ?",
	)
	.bind(period.start)
	.bind(period.end)
	.fetch_one(db)
	.await?;
	Ok(count)
}

/// Readers born in `current_year - 20` or later.
pub async fn readers_under_20_by_birth_year(db: &Db, current_year: i32) -> AppResult<i64> {
	let count: i64 = sqlx::query_scalar(
		"SELECT COUNT(id) FROM reader WHERE CAST(strftime('%Y', birth_date) AS INTEGER) >= ?",
	)
	.bind(current_year - YOUTH_AGE)
	.fetch_one(db)
	.await?;
	Ok(count)
}

/// Readers born within the last 20×365 days.
pub async fn readers_under_20_by_window(db: &Db, today: NaiveDate) -> AppResult<i64> {
	let since = today - Duration::days(i64::from(YOUTH_AGE) * 365);
	let count: i64 = sqlx::query_scalar("SELECT COUNT(id) FROM reader WHERE birth_date >= ?")
		.bind(since)
		.fetch_one(db)
		.await?;
	Ok(count)
}

fn percentage(count: i64, total: i64) -> f64 {
	let share = count as f64 / total as f64 * 100.0;
	// ties go to the even digit: 1/32 gives 3.12
	(share * 100.0).round_ties_even() / 100.0
}

/// Share of readers per education level, in percent rounded to two places.
/// Empty when there are no readers.
pub async fn education_statistics(db: &Db) -> AppResult<BTreeMap<String, f64>> {
	let levels: Vec<(String, i64)> = sqlx::query_as(
		"SELECT education_level, COUNT(id) FROM reader GROUP BY education_level",
	)
	.fetch_all(db)
	.await?;

	let total: i64 = levels.iter().map(|(_, count)| count).sum();
	if total == 0 {
		return Ok(BTreeMap::new());
	}
	Ok(levels
		.into_iter()
		.map(|(level, count)| (level, percentage(count, total)))
		.collect())
}

pub async fn monthly(db: &Db, period: ReportPeriod) -> AppResult<MonthlyReport> {
	Ok(MonthlyReport {
		room_data: room_visits(db, period).await?,
		total_books: total_books(db).await?,
		new_readers: new_readers(db, period).await?,
	})
}

pub async fn reader_statistics(db: &Db, current_year: i32) -> AppResult<ReaderStatistics> {
	Ok(ReaderStatistics {
		readers_under_20: readers_under_20_by_birth_year(db, current_year).await?,
		education_statistics: education_statistics(db).await?,
	})
}

pub async fn summary(db: &Db, period: ReportPeriod, today: NaiveDate) -> AppResult<SummaryReport> {
	Ok(SummaryReport {
		readers_under_20: readers_under_20_by_window(db, today).await?,
		education_statistics: education_statistics(db).await?,
		room_data: room_visits(db, period).await?,
		total_books: total_books(db).await?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::NaiveTime;

	use crate::repo::{fixtures, readers, visits};
	use crate::sql;
	use crate::types::NewVisit;

	fn day(y: i32, m: u32, d: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(y, m, d).unwrap()
	}

	async fn reader_with(db: &Db, ticket: &str, education: &str, born: NaiveDate, registered: NaiveDate) {
		let mut data = fixtures::new_reader(ticket, registered);
		data.education_level = education.into();
		data.birth_date = born;
		readers::create(db, data).await.unwrap();
	}

	#[tokio::test]
	async fn education_shares_add_up() {
		let db = sql::memory().await;
		assert!(education_statistics(&db).await.unwrap().is_empty());

		let reg = day(2024, 1, 1);
		let born = day(1990, 1, 1);
		reader_with(&db, "1", "higher", born, reg).await;
		reader_with(&db, "2", "higher", born, reg).await;
		reader_with(&db, "3", "secondary", born, reg).await;
		reader_with(&db, "4", "primary", born, reg).await;

		let stats = education_statistics(&db).await.unwrap();
		assert_eq!(stats["higher"], 50.0);
		assert_eq!(stats["secondary"], 25.0);
		let sum: f64 = stats.values().sum();
		assert!((sum - 100.0).abs() < 0.01 * stats.len() as f64);

		reader_with(&db, "5", "primary", born, reg).await;
		reader_with(&db, "6", "none", born, reg).await;
		let stats = education_statistics(&db).await.unwrap();
		assert_eq!(stats["higher"], 33.33);
		let sum: f64 = stats.values().sum();
		assert!((sum - 100.0).abs() <= 0.01 * stats.len() as f64);
	}

	#[tokio::test]
	async fn half_hundredths_round_to_even() {
		let db = sql::memory().await;
		let reg = day(2024, 1, 1);
		let born = day(1990, 1, 1);
		for n in 0..31 {
			reader_with(&db, &format!("H{n}"), "higher", born, reg).await;
		}
		reader_with(&db, "P1", "phd", born, reg).await;

		let stats = education_statistics(&db).await.unwrap();
		assert_eq!(stats["phd"], 3.12);
		assert_eq!(stats["higher"], 96.88);
	}

	#[tokio::test]
	async fn under_20_rules_stay_distinct() {
		let db = sql::memory().await;
		let today = day(2025, 3, 1);
		let reg = day(2024, 1, 1);
		// born in the cutoff year but more than 20*365 days ago
		reader_with(&db, "1", "school", day(2005, 1, 10), reg).await;
		reader_with(&db, "2", "school", day(2010, 6, 1), reg).await;
		reader_with(&db, "3", "higher", day(1980, 6, 1), reg).await;

		assert_eq!(readers_under_20_by_birth_year(&db, 2025).await.unwrap(), 2);
		assert_eq!(readers_under_20_by_window(&db, today).await.unwrap(), 1);
	}

	#[tokio::test]
	async fn monthly_counts_only_the_period() {
		let db = sql::memory().await;
		let hall = fixtures::room(&db, 1).await;
		let annex = fixtures::room(&db, 2).await;
		fixtures::book(&db, "B1").await;
		fixtures::book(&db, "B2").await;
		reader_with(&db, "1", "higher", day(1990, 1, 1), day(2024, 2, 10)).await;
		reader_with(&db, "2", "higher", day(1990, 1, 1), day(2024, 3, 10)).await;
		let reader = readers::find_all(&db).await.unwrap()[0].id;

		for (room, date) in [(hall.id, day(2024, 2, 1)), (hall.id, day(2024, 2, 29)), (annex.id, day(2024, 2, 15)), (annex.id, day(2024, 3, 1))] {
			visits::create(&db, NewVisit {
				room,
				reader,
				visit_date: date,
				visit_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
				duration_min: 45,
			}).await.unwrap();
		}

		let feb = ReportPeriod::parse("2024", Some("2")).unwrap();
		let report = monthly(&db, feb).await.unwrap();
		assert_eq!(report.room_data, vec![
			RoomVisits { room_name: "Room 1".into(), count: 2 },
			RoomVisits { room_name: "Room 2".into(), count: 1 },
		]);
		assert_eq!(report.total_books, 2);
		assert_eq!(report.new_readers, 1);

		let year = ReportPeriod::parse("2024", None).unwrap();
		let report = monthly(&db, year).await.unwrap();
		assert_eq!(report.room_data[1].count, 2);
		assert_eq!(report.new_readers, 2);

		let summary = summary(&db, feb, day(2024, 3, 15)).await.unwrap();
		assert_eq!(summary.total_books, 2);
		assert_eq!(summary.readers_under_20, 0);
		assert_eq!(summary.education_statistics["higher"], 100.0);
	}
}

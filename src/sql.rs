use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

pub type Db = Pool<Sqlite>;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Opens the pool. Foreign keys are switched on per connection, the
/// cascading deletes of copies, transactions and visits depend on it.
pub async fn open(url: &str, max_connections: u32, acquire_timeout: Duration) -> Result<Db, sqlx::Error> {
	let options = SqliteConnectOptions::from_str(url)?
		.create_if_missing(true)
		.foreign_keys(true)
		.journal_mode(SqliteJournalMode::Wal)
		.busy_timeout(Duration::from_secs(5));

	SqlitePoolOptions::new()
		.max_connections(max_connections)
		.acquire_timeout(acquire_timeout)
		.connect_with(options).await
}

pub async fn migrate(db: &Db) -> Result<(), sqlx::migrate::MigrateError> {
	MIGRATOR.run(db).await
}

/// Single-connection in-memory database with the schema applied.
#[cfg(test)]
pub async fn memory() -> Db {
	let options = SqliteConnectOptions::from_str("sqlite::memory:")
		.unwrap()
		.foreign_keys(true);
	let db = SqlitePoolOptions::new()
		.max_connections(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connect_with(options).await
		.unwrap();
	migrate(&db).await.unwrap();
	db
}

use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

pub mod row_parsers;
pub mod uploads;
pub mod users;
pub mod weddings;

pub async fn init() -> anyhow::Result<SqlitePool> {
	let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;

	let pool = SqlitePoolOptions::new()
		.max_connections(10)
		.min_connections(1)
		.acquire_timeout(Duration::from_secs(10))
		.connect(&database_url)
		.await
		.context("failed to connect to database")?;

	sqlx::migrate!()
		.run(&pool)
		.await
		.context("failed to run migrations")?;

	Ok(pool)
}

/// Fixed-width RFC3339 so text columns sort chronologically.
pub(crate) fn timestamp(dt: DateTime<Utc>) -> String {
	dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn date(d: NaiveDate) -> String {
	d.format("%Y-%m-%d").to_string()
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
	matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// `LIKE` pattern matching `needle` literally anywhere; pair with `ESCAPE '\'`.
pub(crate) fn contains_pattern(needle: &str) -> String {
	let mut pattern = String::with_capacity(needle.len() + 2);
	pattern.push('%');
	for c in needle.chars() {
		if matches!(c, '%' | '_' | '\\') {
			pattern.push('\\');
		}
		pattern.push(c);
	}
	pattern.push('%');
	pattern
}

use axum::{
	extract::{rejection::QueryRejection, Query, State},
	response::{IntoResponse, Response},
	Json,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::repo::reports;
use crate::time::{self, ReportPeriod};
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
	pub report_type: Option<String>,
	pub year: Option<String>,
	pub month: Option<String>,
}

/// GET /reports/?report_type=monthly|reader_statistics
pub async fn report(
	State(state): State<SharedState>,
	query: Result<Query<ReportQuery>, QueryRejection>,
) -> AppResult<Response> {
	let Query(query) = query?;
	match query.report_type.as_deref() {
		Some("monthly") => {
			let year = query
				.year
				.filter(|y| !y.trim().is_empty())
				.unwrap_or_else(|| time::current_year().to_string());
			let period = ReportPeriod::parse(&year, query.month.as_deref())?;
			Ok(Json(reports::monthly(&state.db, period).await?).into_response())
		},
		Some("reader_statistics") => {
			let stats = reports::reader_statistics(&state.db, time::current_year()).await?;
			Ok(Json(stats).into_response())
		},
		_ => Err(AppError::validation("Invalid report type.")),
	}
}

/// GET /reports/complex/?report_type=summary|reader_statistics&year=
pub async fn complex(
	State(state): State<SharedState>,
	query: Result<Query<ReportQuery>, QueryRejection>,
) -> AppResult<Response> {
	let Query(query) = query?;
	let report_type = query
		.report_type
		.filter(|t| !t.is_empty())
		.ok_or_else(|| AppError::validation("Parameter 'report_type' is required."))?;
	if report_type != "summary" && report_type != "reader_statistics" {
		return Err(AppError::validation(format!(
			"Invalid report type: {report_type}. Allowed values: summary, reader_statistics."
		)));
	}
	let year = query
		.year
		.filter(|y| !y.trim().is_empty())
		.ok_or_else(|| AppError::validation("Parameter 'year' is required."))?;
	let period = ReportPeriod::parse(&year, query.month.as_deref())?;
	let today = time::today();

	if report_type == "summary" {
		return Ok(Json(reports::summary(&state.db, period, today).await?).into_response());
	}
	let stats = reports::ReaderStatistics {
		readers_under_20: reports::readers_under_20_by_window(&state.db, today).await?,
		education_statistics: reports::education_statistics(&state.db).await?,
	};
	Ok(Json(stats).into_response())
}

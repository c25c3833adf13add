use chrono::{Datelike, NaiveDate};
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum DateError {
	#[error("Parameters 'year' and 'month' must be numbers.")]
	NotANumber,
	#[error("Month must be between 1 and 12.")]
	MonthRange,
	#[error("Year is out of range.")]
	YearRange,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Month {
	Jan, Feb, Mar, Apr,
	May, Jun, Jul, Aug,
	Sep, Oct, Nov, Dec,
}

const MONTHS: [Month; 12] = [
	Month::Jan, Month::Feb, Month::Mar, Month::Apr,
	Month::May, Month::Jun, Month::Jul, Month::Aug,
	Month::Sep, Month::Oct, Month::Nov, Month::Dec,
];

pub fn is_leap_year(year: i32) -> bool {
	year%400 == 0 || (year%4 == 0 && year%100 != 0)
}

// accepts both "3" and "mar", the report query string uses numbers
impl std::str::FromStr for Month {
	type Err = DateError;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s.trim().to_lowercase().as_str() {
			"jan"|"01"|"1" => Month::Jan,
			"feb"|"02"|"2" => Month::Feb,
			"mar"|"03"|"3" => Month::Mar,
			"apr"|"04"|"4" => Month::Apr,
			"may"|"05"|"5" => Month::May,
			"jun"|"06"|"6" => Month::Jun,
			"jul"|"07"|"7" => Month::Jul,
			"aug"|"08"|"8" => Month::Aug,
			"sep"|"09"|"9" => Month::Sep,
			"oct"|"10" => Month::Oct,
			"nov"|"11" => Month::Nov,
			"dec"|"12" => Month::Dec,
			other => {
				return Err(if other.parse::<i64>().is_ok() {
					DateError::MonthRange
				} else {
					DateError::NotANumber
				});
			},
		})
	}
}

impl Month {
	pub fn number(self) -> u32 {
		MONTHS.iter().position(|m| *m == self).map_or(1, |i| i as u32 + 1)
	}

	pub fn days(self, year: i32) -> u32 {
		match self {
			Month::Feb => if is_leap_year(year) {29} else {28},
			Month::Apr | Month::Jun | Month::Sep | Month::Nov => 30,
			_ => 31,
		}
	}
}

/// Inclusive date range a report covers: one month, or the whole year.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReportPeriod {
	pub start: NaiveDate,
	pub end: NaiveDate,
}

impl ReportPeriod {
	pub fn new(year: i32, month: Option<Month>) -> Result<Self, DateError> {
		let (first, last) = match month {
			Some(month) => (month, month),
			None => (Month::Jan, Month::Dec),
		};
		let start = NaiveDate::from_ymd_opt(year, first.number(), 1)
			.ok_or(DateError::YearRange)?;
		let end = NaiveDate::from_ymd_opt(year, last.number(), last.days(year))
			.ok_or(DateError::YearRange)?;
		Ok(ReportPeriod { start, end })
	}

	/// `month` as it arrives in the query string; absent, empty or "0" means the whole year.
	pub fn parse(year: &str, month: Option<&str>) -> Result<Self, DateError> {
		let year: i32 = year.trim().parse().or(Err(DateError::NotANumber))?;
		let month = match month.map(str::trim) {
			None | Some("") | Some("0") => None,
			Some(m) => Some(m.parse::<Month>()?),
		};
		ReportPeriod::new(year, month)
	}
}

pub fn today() -> NaiveDate {
	chrono::Utc::now().date_naive()
}

pub fn current_year() -> i32 {
	today().year()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn february_follows_leap_years() {
		assert_eq!(Month::Feb.days(2024), 29);
		assert_eq!(Month::Feb.days(2023), 28);
		assert_eq!(Month::Feb.days(1900), 28);
		assert_eq!(Month::Feb.days(2000), 29);
	}

	#[test]
	fn month_period_covers_whole_month() {
		let period = ReportPeriod::parse("2024", Some("2")).unwrap();
		assert_eq!(period.start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
		assert_eq!(period.end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
	}

	#[test]
	fn zero_month_means_whole_year() {
		let period = ReportPeriod::parse("2023", Some("0")).unwrap();
		assert_eq!(period.start, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
		assert_eq!(period.end, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
		assert_eq!(ReportPeriod::parse("2023", None).unwrap(), period);
	}

	#[test]
	fn bad_parameters_are_rejected() {
		assert_eq!(ReportPeriod::parse("abc", None), Err(DateError::NotANumber));
		assert_eq!(ReportPeriod::parse("2024", Some("13")), Err(DateError::MonthRange));
		assert_eq!(ReportPeriod::parse("2024", Some("x")), Err(DateError::NotANumber));
		assert_eq!(Month::Oct.number(), 10);
		assert_eq!("dec".parse::<Month>(), Ok(Month::Dec));
	}
}

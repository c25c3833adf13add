//! Field checks shared by the create/update payloads.

use crate::error::{AppError, AppResult};

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_CODE_LEN: usize = 50;
pub const MAX_PHONE_LEN: usize = 20;

pub fn required_text(value: &str, field: &str, max_len: usize) -> AppResult<()> {
	if value.trim().is_empty() {
		return Err(AppError::validation(format!("{field} must not be empty.")));
	}
	if value.chars().count() > max_len {
		return Err(AppError::validation(format!(
			"{field} is too long (max {max_len} characters)."
		)));
	}
	Ok(())
}

pub fn optional_text(value: &Option<String>, field: &str, max_len: usize) -> AppResult<()> {
	match value {
		Some(v) => required_text(v, field, max_len),
		None => Ok(()),
	}
}

pub fn non_negative(value: i64, field: &str) -> AppResult<()> {
	if value < 0 {
		return Err(AppError::validation(format!("{field} must not be negative.")));
	}
	Ok(())
}

pub fn positive(value: i64, field: &str) -> AppResult<()> {
	if value <= 0 {
		return Err(AppError::validation(format!("{field} must be a positive number.")));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn blank_text_is_rejected() {
		assert!(required_text("  ", "title", MAX_NAME_LEN).is_err());
		assert!(required_text("Dune", "title", MAX_NAME_LEN).is_ok());
		assert!(required_text(&"x".repeat(51), "code", MAX_CODE_LEN).is_err());
		assert!(optional_text(&None, "code", MAX_CODE_LEN).is_ok());
	}

	#[test]
	fn quantity_bounds() {
		assert!(positive(0, "quantity").is_err());
		assert!(positive(3, "quantity").is_ok());
		assert!(non_negative(0, "capacity").is_ok());
		assert!(non_negative(-1, "capacity").is_err());
	}
}

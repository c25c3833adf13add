use std::{env, fmt::Display, net::SocketAddr, str::FromStr, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("invalid {key} value {value:?}: {reason}")]
	Invalid {
		key: &'static str,
		value: String,
		reason: String,
	},
}

#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub bind_addr: SocketAddr,
	pub max_connections: u32,
	pub acquire_timeout: Duration,
	pub api_tokens: Vec<String>,
	pub log_level: String,
	pub log_json: bool,
}

impl Config {
	/// Reads the environment (after `.env` has been merged in by the caller).
	pub fn load() -> Result<Self, ConfigError> {
		Ok(Self {
			database_url: var("DATABASE_URL").unwrap_or_else(|| "sqlite://library.db".to_string()),
			bind_addr: try_load("BIND_ADDR", "0.0.0.0:8080")?,
			max_connections: try_load("DB_MAX_CONNECTIONS", "5")?,
			acquire_timeout: Duration::from_secs(try_load("DB_ACQUIRE_TIMEOUT_SECS", "3")?),
			api_tokens: var("API_TOKENS").map(|v| split_tokens(&v)).unwrap_or_default(),
			log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
			log_json: try_load("LOG_JSON", "false")?,
		})
	}

	pub fn accepts(&self, token: &str) -> bool {
		!token.is_empty() && self.api_tokens.iter().any(|t| t == token)
	}

	#[cfg(test)]
	pub fn for_tests(tokens: &[&str]) -> Self {
		Self {
			database_url: "sqlite::memory:".to_string(),
			bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
			max_connections: 1,
			acquire_timeout: Duration::from_secs(3),
			api_tokens: tokens.iter().map(|t| t.to_string()).collect(),
			log_level: "debug".to_string(),
			log_json: false,
		}
	}
}

fn var(key: &str) -> Option<String> {
	env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
	T::Err: Display,
{
	let value = var(key).unwrap_or_else(|| default.to_string());
	value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
		key,
		reason: e.to_string(),
		value,
	})
}

fn split_tokens(raw: &str) -> Vec<String> {
	raw.split(',')
		.map(str::trim)
		.filter(|t| !t.is_empty())
		.map(str::to_string)
		.collect()
}

//! Gate in front of every library route.
//!
//! Tokens are issued by the external auth provider and handed to the
//! service through `API_TOKENS`; a request passes when it carries one of
//! them in the `Authorization` header or in the `auth_token` cookie.

use axum::{
	extract::{Request, State},
	http::{header::AUTHORIZATION, HeaderMap},
	middleware::Next,
	response::Response,
};
use tower_cookies::Cookies;
use tracing::debug;

use crate::error::AppError;
use crate::SharedState;

pub const AUTH_COOKIE: &str = "auth_token";

fn header_token(headers: &HeaderMap) -> Option<String> {
	let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
	value
		.strip_prefix("Token ")
		.or_else(|| value.strip_prefix("Bearer "))
		.map(|t| t.trim().to_string())
}

pub async fn require_token(
	State(state): State<SharedState>,
	cookies: Cookies,
	req: Request,
	next: Next,
) -> Result<Response, AppError> {
	let token = header_token(req.headers())
		.or_else(|| cookies.get(AUTH_COOKIE).map(|c| c.value().to_string()));

	match token {
		Some(token) if state.config.accepts(&token) => Ok(next.run(req).await),
		Some(_) => {
			debug!(path = %req.uri().path(), "rejected unknown token");
			Err(AppError::Unauthorized)
		},
		None => Err(AppError::Unauthorized),
	}
}

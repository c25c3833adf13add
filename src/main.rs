// library system

mod api;
mod auth;
mod config;
mod error;
mod logger;
mod repo;
mod sql;
mod time;
mod types;
mod validation;

use std::sync::Arc;

use anyhow::Context;
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn};

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	// a missing .env is fine, the real environment still applies
	let dotenv = dotenvy::dotenv();
	let config = Config::load()?;
	logger::init(&config.log_level, config.log_json)?;
	if let Err(e) = dotenv {
		info!("no .env loaded: {e}");
	}

	// set up connection pool
	let db = sql::open(&config.database_url, config.max_connections, config.acquire_timeout)
		.await
		.with_context(|| format!("can't connect to database {}", config.database_url))?;
	sql::migrate(&db).await.context("can't apply migrations")?;
	info!(database = %config.database_url, "database ready");

	if config.api_tokens.is_empty() {
		warn!("API_TOKENS is empty, every library route will answer 401");
	}

	let state = new_shared_state(db, config);
	let app = api::router(state.clone());

	let listener = TcpListener::bind(state.config.bind_addr).await
		.with_context(|| format!("can't bind {}", state.config.bind_addr))?;
	info!("library server listening on {}", state.config.bind_addr);

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	state.db.close().await;
	info!("library server stopped");
	Ok(())
}

pub type SharedState = Arc<ServerState>;

pub struct ServerState {
	pub db: sql::Db,
	pub config: Config,
}

pub fn new_shared_state(db: sql::Db, config: Config) -> SharedState {
	Arc::new(ServerState { db, config })
}

async fn shutdown_signal() {
	let ctrl_c = async {
		match signal::ctrl_c().await {
			Ok(()) => info!("received Ctrl+C, shutting down"),
			Err(e) => {
				error!("can't listen for Ctrl+C: {e}");
				std::future::pending::<()>().await;
			},
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
				info!("received terminate signal, shutting down");
			},
			Err(e) => {
				error!("can't install terminate handler: {e}");
				std::future::pending::<()>().await;
			},
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}

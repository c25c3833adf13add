use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` wins over `level` when set.
pub fn init(level: &str, json: bool) -> anyhow::Result<()> {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
	let registry = tracing_subscriber::registry().with(env_filter);

	if json {
		registry
			.with(fmt::layer().json().with_target(true).with_current_span(true))
			.try_init()?;
	} else {
		registry.with(fmt::layer().with_target(true)).try_init()?;
	}
	Ok(())
}

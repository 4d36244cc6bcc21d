pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use color_eyre::eyre;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use aura_discovery::DiscoveryService;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = aura_cli::VERSION,
	rename_all = "kebab",
	styles = aura_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = aura_config::load(&args.config)?;

	init_tracing(&config)?;

	let http_addr: SocketAddr = config.service.http_bind.parse()?;

	if config.service.bind_localhost_only && !http_addr.ip().is_loopback() {
		return Err(eyre::eyre!(
			"http_bind must be a loopback address when bind_localhost_only is true."
		));
	}

	let state = AppState::new(config).await?;

	spawn_rate_sweep(Arc::clone(&state.service));

	let app = routes::router(state);
	let http_listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	axum::serve(http_listener, app).await?;

	Ok(())
}

/// Periodic cleanup of elapsed rate-limit records. The governors share
/// their lock with request checks, so the sweep never races an in-flight
/// increment.
fn spawn_rate_sweep(service: Arc<DiscoveryService>) {
	let interval = Duration::from_secs(service.cfg.limits.sweep_interval_secs);

	tokio::spawn(async move {
		let mut ticker = tokio::time::interval(interval);

		ticker.tick().await;

		loop {
			ticker.tick().await;

			let removed = service.sweep_rate_records();

			if removed > 0 {
				tracing::debug!(removed, "Swept expired rate-limit records.");
			}
		}
	});
}

fn init_tracing(config: &aura_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	Ok(())
}

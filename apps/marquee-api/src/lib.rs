pub mod routes;
pub mod state;
pub mod webhook;

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use time::OffsetDateTime;
use tokio::net::TcpListener;

use crate::state::AppState;
use marquee_service::MarqueeService;

#[derive(Debug, Parser)]
#[command(
	version = marquee_cli::VERSION,
	rename_all = "kebab",
	styles = marquee_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = marquee_config::load(&args.config)?;

	marquee_cli::init_tracing(&config.service.log_level);

	let http_addr: SocketAddr = config.service.http_bind.parse()?;
	let state = AppState::new(config).await?;

	spawn_session_sweeper(state.service.clone());

	let app = routes::router(state);
	let listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	axum::serve(listener, app).await?;

	Ok(())
}

/// Periodically drops sessions that have been idle longer than the configured TTL.
fn spawn_session_sweeper(service: Arc<MarqueeService>) {
	if service.sessions.policy().idle_ttl.is_none() {
		tracing::info!("Session eviction disabled.");

		return;
	}

	let period = Duration::from_secs(service.cfg.sessions.sweep_interval_seconds);

	tokio::spawn(async move {
		let mut interval = tokio::time::interval(period);

		loop {
			interval.tick().await;

			let evicted = service.sessions.evict_idle(OffsetDateTime::now_utc());

			if evicted > 0 {
				tracing::debug!(evicted, remaining = service.sessions.len(), "Evicted idle sessions.");
			}
		}
	});
}

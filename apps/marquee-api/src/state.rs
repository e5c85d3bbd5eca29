use std::sync::Arc;

use marquee_service::MarqueeService;
use marquee_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<MarqueeService>,
}
impl AppState {
	pub async fn new(config: marquee_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self::from_service(MarqueeService::new(config, db)))
	}

	pub fn from_service(service: MarqueeService) -> Self {
		Self { service: Arc::new(service) }
	}
}

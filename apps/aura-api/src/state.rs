use std::sync::Arc;

use aura_discovery::{DiscoveryService, PgStore, default_providers};
use aura_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<DiscoveryService>,
}
impl AppState {
	pub async fn new(config: aura_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema(config.providers.embedding.dimensions).await?;

		let store = Arc::new(PgStore::new(db));
		let service = DiscoveryService::new(config, store, default_providers());

		Ok(Self { service: Arc::new(service) })
	}

	pub fn with_service(service: DiscoveryService) -> Self {
		Self { service: Arc::new(service) }
	}
}

use std::sync::Arc;

use orgdir_service::DirectoryService;
use orgdir_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<DirectoryService>,
}
impl AppState {
	/// Connects, bootstraps the schema, and fills the demo dataset when `seed.demo_data` is set.
	pub async fn new(config: orgdir_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let seed = config.seed.demo_data;
		let service = DirectoryService::new(config, db);

		if seed {
			service.seed_demo_data().await?;
		}

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: DirectoryService) -> Self {
		Self { service: Arc::new(service) }
	}
}

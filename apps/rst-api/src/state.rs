use std::sync::Arc;

use rst_service::RstService;
use rst_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<RstService>,
}
impl AppState {
	/// Connects to Postgres and applies the bundled schema before serving.
	pub async fn new(config: rst_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self { service: Arc::new(RstService::new(config, db)) })
	}
}

pub mod admin;
pub mod search;

mod error;

pub use admin::{AccessResponse, AccessSelection, ActivitiesResponse, FeaturesResponse};
pub use error::{Error, Result};
pub use search::{
	SearchRequest, SearchResponse,
	facets::{FacetCount, FacetCounts, FacetDimension, FacilityTotals},
	filter::FeeOption,
	format::{FormattedResource, ImageSizeCode},
	menu::{FilterMenu, FilterOption},
};

use rst_config::Config;
use rst_storage::{db::Db, sync::JoinTableRegistry};

pub struct RstService {
	pub cfg: Config,
	pub db: Db,
	pub registry: JoinTableRegistry,
}
impl RstService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db, registry: JoinTableRegistry::catalog() }
	}

	pub fn with_registry(cfg: Config, db: Db, registry: JoinTableRegistry) -> Self {
		Self { cfg, db, registry }
	}
}

pub mod facets;
pub mod filter;
pub mod format;
pub mod menu;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, Postgres, QueryBuilder};

use rst_storage::models::ResourceRow;

use crate::{
	Error, Result, RstService,
	search::{
		facets::FacetCounts,
		filter::{FeeOption, FilterPredicate},
		format::{FormattedResource, ImageSizeCode},
		menu::FilterMenu,
	},
};

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 10;
pub const MAX_PAGE_WITHOUT_LIMIT: u32 = 10;

const RESOURCE_COLUMNS: &str = "v.rec_resource_id, v.name, v.closest_community, \
v.display_on_public_site, v.district_code, v.district_description, \
v.recreation_resource_type_code, v.recreation_resource_type, v.recreation_activity, \
v.recreation_status, v.recreation_resource_images";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
	pub page: u32,
	pub limit: Option<u32>,
	pub filter: Option<String>,
	pub activities: BTreeSet<i32>,
	pub types: BTreeSet<String>,
	pub districts: BTreeSet<String>,
	pub access: BTreeSet<String>,
	pub facilities: BTreeSet<String>,
	/// Lowercase status descriptions. A resource without a status counts as `open`.
	pub status: BTreeSet<String>,
	pub fees: BTreeSet<FeeOption>,
	pub image_size_codes: BTreeSet<ImageSizeCode>,
}
impl Default for SearchRequest {
	fn default() -> Self {
		Self {
			page: 1,
			limit: None,
			filter: None,
			activities: BTreeSet::new(),
			types: BTreeSet::new(),
			districts: BTreeSet::new(),
			access: BTreeSet::new(),
			facilities: BTreeSet::new(),
			status: BTreeSet::new(),
			fees: BTreeSet::new(),
			image_size_codes: BTreeSet::new(),
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchResponse {
	pub data: Vec<FormattedResource>,
	pub page: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub limit: Option<u32>,
	pub total: u64,
	pub filters: Vec<FilterMenu>,
}

/// Validated paging window. `limit` is the caller's limit after clamping, absent when none was
/// given.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
	pub page: u32,
	pub limit: Option<u32>,
	pub take: i64,
	pub skip: i64,
}
impl Pagination {
	pub fn resolve(page: u32, limit: Option<u32>) -> Result<Self> {
		let limit = limit.filter(|value| *value > 0).map(|value| value.min(MAX_LIMIT));

		if page < 1 {
			return Err(Error::InvalidRequest { message: "page must be at least 1.".to_string() });
		}
		if limit.is_none() && page > MAX_PAGE_WITHOUT_LIMIT {
			return Err(Error::InvalidRequest {
				message: format!(
					"Maximum page limit is {MAX_PAGE_WITHOUT_LIMIT} when no limit is provided."
				),
			});
		}

		let take = i64::from(limit.unwrap_or(DEFAULT_LIMIT));
		let skip = (i64::from(page) - 1) * take;

		Ok(Self { page, limit, take, skip })
	}
}

impl RstService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let pagination = match Pagination::resolve(req.page, req.limit) {
			Ok(pagination) => pagination,
			Err(err) => {
				tracing::debug!(page = req.page, limit = ?req.limit, error = %err, "Rejected search pagination.");

				return Err(err);
			},
		};
		let predicate = FilterPredicate::build(&req);
		let mut tx = self.db.begin_read_snapshot().await?;
		let rows: Vec<ResourceRow> =
			page_query(&predicate, &pagination).build_query_as().fetch_all(&mut *tx).await?;
		let ids = fetch_ids(&mut tx, &predicate).await?;
		let counts = FacetCounts::load(&mut tx, &self.cfg.facets, &ids).await?;

		tx.commit().await?;

		tracing::debug!(
			page = pagination.page,
			take = pagination.take,
			returned = rows.len(),
			total = ids.len(),
			"Search completed."
		);

		Ok(SearchResponse {
			data: format::format_rows(&rows, &req.image_size_codes),
			page: pagination.page,
			limit: pagination.limit,
			total: ids.len() as u64,
			filters: menu::assemble(&counts),
		})
	}
}

fn page_query(
	predicate: &FilterPredicate,
	pagination: &Pagination,
) -> QueryBuilder<'static, Postgres> {
	let mut builder = QueryBuilder::new(format!(
		"SELECT {RESOURCE_COLUMNS} FROM recreation_resource_search_view v"
	));

	predicate.push_where(&mut builder);
	builder.push(" ORDER BY v.name ASC, v.rec_resource_id ASC LIMIT ");
	builder.push_bind(pagination.take);
	builder.push(" OFFSET ");
	builder.push_bind(pagination.skip);

	builder
}

fn id_query(predicate: &FilterPredicate) -> QueryBuilder<'static, Postgres> {
	let mut builder = QueryBuilder::new("SELECT v.rec_resource_id FROM recreation_resource_search_view v");

	predicate.push_where(&mut builder);
	builder.push(" ORDER BY v.rec_resource_id");

	builder
}

async fn fetch_ids(conn: &mut PgConnection, predicate: &FilterPredicate) -> Result<Vec<String>> {
	Ok(id_query(predicate).build_query_scalar().fetch_all(conn).await?)
}

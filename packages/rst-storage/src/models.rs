use serde::Deserialize;
use sqlx::types::Json;

/// One row of `recreation_resource_search_view`, nested records still in their stored shape.
#[derive(Debug, sqlx::FromRow)]
pub struct ResourceRow {
	pub rec_resource_id: String,
	pub name: String,
	pub closest_community: Option<String>,
	pub display_on_public_site: bool,
	pub district_code: Option<String>,
	pub district_description: Option<String>,
	pub recreation_resource_type_code: Option<String>,
	pub recreation_resource_type: Option<Json<ResourceTypeRecord>>,
	pub recreation_activity: Json<Vec<ActivityLink>>,
	pub recreation_status: Option<Json<StatusRecord>>,
	pub recreation_resource_images: Json<Vec<ImageRecord>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ResourceTypeRecord {
	pub rec_resource_type_code: String,
	pub description: String,
}

/// Association wrapper as stored: the activity code sits one level down.
#[derive(Clone, Debug, Deserialize)]
pub struct ActivityLink {
	pub recreation_activity: ActivityCode,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ActivityCode {
	pub recreation_activity_code: i32,
	pub description: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StatusRecord {
	pub description: Option<String>,
	pub comment: Option<String>,
	pub status_code: Option<i32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ImageRecord {
	pub ref_id: String,
	pub caption: Option<String>,
	#[serde(default)]
	pub recreation_resource_image_variants: Vec<ImageVariantRecord>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ImageVariantRecord {
	pub size_code: String,
	pub url: String,
	pub width: Option<i32>,
	pub height: Option<i32>,
	pub extension: Option<String>,
}

/// A grouped count tagged with the facet dimension it belongs to.
#[derive(Debug, sqlx::FromRow)]
pub struct DimensionCountRow {
	pub dimension: String,
	pub code: String,
	pub description: String,
	pub count: i32,
}

#[derive(Debug, sqlx::FromRow)]
pub struct FacilityTotalsRow {
	pub toilet_count: i32,
	pub table_count: i32,
}

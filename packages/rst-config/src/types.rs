use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub facets: Facets,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// Codes hidden from the filter sidebar, per facet dimension.
///
/// A listed code never shows up as a facet option, even when resources in the
/// current result set carry it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Facets {
	#[serde(default)]
	pub excluded_activity_codes: Vec<i32>,
	#[serde(default)]
	pub excluded_district_codes: Vec<String>,
	#[serde(default)]
	pub excluded_access_codes: Vec<String>,
	#[serde(default)]
	pub excluded_resource_type_codes: Vec<String>,
}

fn default_log_level() -> String {
	"info".to_string()
}

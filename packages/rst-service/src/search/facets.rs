//! Per-dimension option counts for the filter sidebar.
//!
//! Activity and facility counts are scoped to the filtered resource ids. District, access and
//! resource type counts come from the catalog-wide counting views and ignore the active filters.

use serde::Serialize;
use sqlx::{PgConnection, Postgres, QueryBuilder};

use rst_config::Facets;
use rst_storage::models::{DimensionCountRow, FacilityTotalsRow};

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetDimension {
	District,
	Access,
	Type,
	Activity,
	Facilities,
}
impl FacetDimension {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::District => "district",
			Self::Access => "access",
			Self::Type => "type",
			Self::Activity => "activity",
			Self::Facilities => "facilities",
		}
	}

	fn parse(raw: &str) -> Option<Self> {
		match raw {
			"district" => Some(Self::District),
			"access" => Some(Self::Access),
			"type" => Some(Self::Type),
			"activity" => Some(Self::Activity),
			"facilities" => Some(Self::Facilities),
			_ => None,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FacetCount {
	pub dimension: FacetDimension,
	pub code: String,
	pub description: String,
	pub count: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FacilityTotals {
	pub toilet: i32,
	pub table: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FacetCounts {
	pub districts: Vec<FacetCount>,
	pub access: Vec<FacetCount>,
	pub types: Vec<FacetCount>,
	pub activities: Vec<FacetCount>,
	pub facilities: FacilityTotals,
}
impl FacetCounts {
	/// Runs the three count queries on `conn`, which should hold the same snapshot that
	/// produced `ids`.
	pub async fn load(conn: &mut PgConnection, facets: &Facets, ids: &[String]) -> Result<Self> {
		let catalog_rows: Vec<DimensionCountRow> =
			catalog_counts_query(facets).build_query_as().fetch_all(&mut *conn).await?;
		let activity_rows: Vec<DimensionCountRow> =
			activity_counts_query(&facets.excluded_activity_codes, ids)
				.build_query_as()
				.fetch_all(&mut *conn)
				.await?;
		let totals: FacilityTotalsRow =
			facility_totals_query(ids).build_query_as().fetch_one(&mut *conn).await?;
		let mut counts = Self::from_rows(catalog_rows.into_iter().chain(activity_rows))?;

		counts.facilities = FacilityTotals { toilet: totals.toilet_count, table: totals.table_count };

		Ok(counts)
	}

	fn from_rows(rows: impl IntoIterator<Item = DimensionCountRow>) -> Result<Self> {
		let mut counts = Self::default();

		for row in rows {
			let dimension = FacetDimension::parse(&row.dimension).ok_or_else(|| Error::Storage {
				message: format!("Unknown facet dimension {:?}.", row.dimension),
			})?;
			let bucket = match dimension {
				FacetDimension::District => &mut counts.districts,
				FacetDimension::Access => &mut counts.access,
				FacetDimension::Type => &mut counts.types,
				FacetDimension::Activity => &mut counts.activities,
				FacetDimension::Facilities =>
					return Err(Error::Storage {
						message: "Facility counts are not reported per code.".to_string(),
					}),
			};

			bucket.push(FacetCount {
				dimension,
				code: row.code,
				description: row.description,
				count: row.count.max(0),
			});
		}

		Ok(counts)
	}
}

fn catalog_counts_query(facets: &Facets) -> QueryBuilder<'static, Postgres> {
	let mut builder = QueryBuilder::new(
		"SELECT dimension, code, description, count FROM (\
		SELECT 'district' AS dimension, district_code AS code, description, \
		resource_count::int AS count FROM recreation_resource_district_count_view \
		WHERE district_code <> ALL(",
	);

	builder.push_bind(facets.excluded_district_codes.clone());
	builder.push(
		") UNION ALL SELECT 'access', access_code, access_description, count::int \
		FROM recreation_resource_access_count_view WHERE access_code <> ALL(",
	);
	builder.push_bind(facets.excluded_access_codes.clone());
	builder.push(
		") UNION ALL SELECT 'type', rec_resource_type_code, description, count::int \
		FROM recreation_resource_type_count_view WHERE rec_resource_type_code <> ALL(",
	);
	builder.push_bind(facets.excluded_resource_type_codes.clone());
	builder.push(")) counts ORDER BY dimension, description, code");

	builder
}

fn activity_counts_query(excluded: &[i32], ids: &[String]) -> QueryBuilder<'static, Postgres> {
	let mut builder = QueryBuilder::new(
		"SELECT 'activity' AS dimension, rac.recreation_activity_code::text AS code, \
		rac.description, COUNT(DISTINCT ra.rec_resource_id)::int AS count \
		FROM recreation_activity_code rac \
		LEFT JOIN recreation_activity ra \
		ON ra.recreation_activity_code = rac.recreation_activity_code \
		AND ra.rec_resource_id = ANY(",
	);

	builder.push_bind(ids.to_vec());
	builder.push(") WHERE rac.recreation_activity_code <> ALL(");
	builder.push_bind(excluded.to_vec());
	builder.push(
		") GROUP BY rac.recreation_activity_code, rac.description \
		ORDER BY rac.description, rac.recreation_activity_code",
	);

	builder
}

fn facility_totals_query(ids: &[String]) -> QueryBuilder<'static, Postgres> {
	let mut builder = QueryBuilder::new(
		"SELECT \
		COUNT(*) FILTER (WHERE EXISTS (SELECT 1 FROM recreation_structure rs \
		JOIN recreation_structure_code rsc ON rsc.structure_code = rs.structure_code \
		WHERE rs.rec_resource_id = ids.id AND rsc.description ILIKE '%toilet%'))::int AS toilet_count, \
		COUNT(*) FILTER (WHERE EXISTS (SELECT 1 FROM recreation_structure rs \
		JOIN recreation_structure_code rsc ON rsc.structure_code = rs.structure_code \
		WHERE rs.rec_resource_id = ids.id AND rsc.description ILIKE '%table%'))::int AS table_count \
		FROM unnest(",
	);

	builder.push_bind(ids.to_vec());
	builder.push("::varchar[]) AS ids(id)");

	builder
}

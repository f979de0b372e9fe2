use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

use crate::{Error, search::SearchRequest};

const DEFAULT_STATUS: &str = "open";

/// Fee and reservation options, written `R`, `F` and `NF` on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeeOption {
	#[serde(rename = "R")]
	Reservable,
	#[serde(rename = "F")]
	Fees,
	#[serde(rename = "NF")]
	NoFees,
}
impl FeeOption {
	fn condition(self) -> &'static str {
		match self {
			Self::Reservable => "v.is_reservable IS TRUE",
			Self::Fees => "v.is_fees IS TRUE",
			// Unknown fee data reads as free.
			Self::NoFees => "v.is_fees IS NOT TRUE",
		}
	}
}
impl FromStr for FeeOption {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim().to_ascii_uppercase().as_str() {
			"R" => Ok(Self::Reservable),
			"F" => Ok(Self::Fees),
			"NF" => Ok(Self::NoFees),
			_ => Err(Error::InvalidRequest { message: format!("Unknown fee option {raw:?}.") }),
		}
	}
}

/// The boolean condition a search applies to `recreation_resource_search_view v`.
///
/// Built once per request and rendered into every query that must agree on the result set. All
/// values are bound, never spliced. Dimensions combine with AND; codes within one dimension
/// combine with OR.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterPredicate {
	text_pattern: Option<String>,
	activities: Vec<i32>,
	types: Vec<String>,
	districts: Vec<String>,
	access: Vec<String>,
	facility_patterns: Vec<String>,
	statuses: Vec<String>,
	fees: Vec<FeeOption>,
}
impl FilterPredicate {
	pub fn build(req: &SearchRequest) -> Self {
		let text_pattern = req
			.filter
			.as_deref()
			.map(str::trim)
			.filter(|text| !text.is_empty())
			.map(contains_pattern);
		let facility_patterns = req
			.facilities
			.iter()
			.map(|keyword| keyword.trim().to_lowercase())
			.filter(|keyword| !keyword.is_empty())
			.map(|keyword| contains_pattern(&keyword))
			.collect();
		let mut statuses = req
			.status
			.iter()
			.map(|status| status.trim().to_lowercase())
			.filter(|status| !status.is_empty())
			.collect::<Vec<_>>();

		statuses.sort();
		statuses.dedup();

		Self {
			text_pattern,
			activities: req.activities.iter().copied().collect(),
			types: req.types.iter().cloned().collect(),
			districts: req.districts.iter().cloned().collect(),
			access: req.access.iter().cloned().collect(),
			facility_patterns,
			statuses,
			fees: req.fees.iter().copied().collect(),
		}
	}

	pub fn push_where(&self, builder: &mut QueryBuilder<'static, Postgres>) {
		builder.push(" WHERE v.display_on_public_site IS TRUE");

		if let Some(pattern) = &self.text_pattern {
			builder.push(" AND (v.name ILIKE ");
			builder.push_bind(pattern.clone());
			builder.push(" OR v.closest_community ILIKE ");
			builder.push_bind(pattern.clone());
			builder.push(")");
		}
		if !self.activities.is_empty() {
			builder.push(
				" AND EXISTS (SELECT 1 FROM recreation_activity ra \
				WHERE ra.rec_resource_id = v.rec_resource_id AND ra.recreation_activity_code = ANY(",
			);
			builder.push_bind(self.activities.clone());
			builder.push("))");
		}
		if !self.types.is_empty() {
			builder.push(" AND v.recreation_resource_type_code = ANY(");
			builder.push_bind(self.types.clone());
			builder.push(")");
		}
		if !self.districts.is_empty() {
			builder.push(" AND v.district_code = ANY(");
			builder.push_bind(self.districts.clone());
			builder.push(")");
		}
		if !self.access.is_empty() {
			builder.push(
				" AND EXISTS (SELECT 1 FROM recreation_access rac \
				WHERE rac.rec_resource_id = v.rec_resource_id AND rac.access_code = ANY(",
			);
			builder.push_bind(self.access.clone());
			builder.push("))");
		}
		if !self.facility_patterns.is_empty() {
			builder.push(
				" AND EXISTS (SELECT 1 FROM recreation_structure rs \
				JOIN recreation_structure_code rsc ON rsc.structure_code = rs.structure_code \
				WHERE rs.rec_resource_id = v.rec_resource_id AND rsc.description ILIKE ANY(",
			);
			builder.push_bind(self.facility_patterns.clone());
			builder.push("))");
		}
		if !self.statuses.is_empty() {
			builder.push(" AND lower(COALESCE(v.recreation_status->>'description', ");
			builder.push_bind(DEFAULT_STATUS);
			builder.push(")) = ANY(");
			builder.push_bind(self.statuses.clone());
			builder.push(")");
		}
		if !self.fees.is_empty() {
			builder.push(" AND (");

			for (index, option) in self.fees.iter().enumerate() {
				if index > 0 {
					builder.push(" OR ");
				}

				builder.push(option.condition());
			}

			builder.push(")");
		}
	}
}

fn contains_pattern(text: &str) -> String {
	let mut pattern = String::with_capacity(text.len() + 2);

	pattern.push('%');

	for ch in text.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			pattern.push('\\');
		}

		pattern.push(ch);
	}

	pattern.push('%');

	pattern
}

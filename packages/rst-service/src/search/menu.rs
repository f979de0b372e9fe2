use serde::Serialize;

use crate::search::facets::{FacetCount, FacetCounts};

const MULTI_SELECT: &str = "multi-select";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FilterMenu {
	pub label: &'static str,
	pub param: &'static str,
	#[serde(rename = "type")]
	pub kind: &'static str,
	pub options: Vec<FilterOption>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FilterOption {
	pub id: String,
	pub description: String,
	pub count: i32,
}

/// Shapes facet counts into sidebar menus. Menu order and labels are fixed; options keep the
/// order the counts arrived in.
pub fn assemble(counts: &FacetCounts) -> Vec<FilterMenu> {
	vec![
		menu("District", "district", options(&counts.districts, str::to_string)),
		menu("Type", "type", options(&counts.types, str::to_string)),
		menu("Things to do", "activities", options(&counts.activities, str::to_string)),
		menu(
			"Facilities",
			"facilities",
			vec![
				FilterOption {
					id: "table".to_string(),
					description: "Tables".to_string(),
					count: counts.facilities.table,
				},
				FilterOption {
					id: "toilet".to_string(),
					description: "Toilets".to_string(),
					count: counts.facilities.toilet,
				},
			],
		),
		menu(
			"Access type",
			"access",
			options(&counts.access, |description| format!("{description} access")),
		),
	]
}

fn menu(label: &'static str, param: &'static str, options: Vec<FilterOption>) -> FilterMenu {
	FilterMenu { label, param, kind: MULTI_SELECT, options }
}

fn options(counts: &[FacetCount], describe: impl Fn(&str) -> String) -> Vec<FilterOption> {
	counts
		.iter()
		.map(|count| FilterOption {
			id: count.code.clone(),
			description: describe(&count.description),
			count: count.count,
		})
		.collect()
}

use std::{collections::BTreeSet, str::FromStr};

use serde::{Deserialize, Serialize};

use rst_storage::models::{ImageRecord, ResourceRow, StatusRecord};

use crate::Error;

const DEFAULT_STATUS_DESCRIPTION: &str = "Open";
const DEFAULT_STATUS_CODE: i32 = 1;

/// Stored image variant sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSizeCode {
	Original,
	/// High resolution print.
	Hrp,
	/// Large landscape crop.
	Llc,
	Pre,
	Scr,
	Thm,
}
impl ImageSizeCode {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Original => "original",
			Self::Hrp => "hrp",
			Self::Llc => "llc",
			Self::Pre => "pre",
			Self::Scr => "scr",
			Self::Thm => "thm",
		}
	}
}
impl FromStr for ImageSizeCode {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"original" => Ok(Self::Original),
			"hrp" => Ok(Self::Hrp),
			"llc" => Ok(Self::Llc),
			"pre" => Ok(Self::Pre),
			"scr" => Ok(Self::Scr),
			"thm" => Ok(Self::Thm),
			_ => Err(Error::InvalidRequest { message: format!("Unknown image size code {raw:?}.") }),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormattedResource {
	pub rec_resource_id: String,
	pub name: String,
	pub closest_community: Option<String>,
	pub display_on_public_site: bool,
	pub district_code: Option<String>,
	pub district_description: Option<String>,
	pub rec_resource_type: Option<String>,
	pub recreation_activity: Vec<FormattedActivity>,
	pub recreation_status: FormattedStatus,
	pub recreation_resource_images: Vec<FormattedImage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormattedActivity {
	pub recreation_activity_code: i32,
	pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormattedStatus {
	pub description: String,
	pub comment: Option<String>,
	pub status_code: i32,
}
impl FormattedStatus {
	fn from_record(record: Option<&StatusRecord>) -> Self {
		Self {
			description: record
				.and_then(|status| status.description.clone())
				.unwrap_or_else(|| DEFAULT_STATUS_DESCRIPTION.to_string()),
			comment: record.and_then(|status| status.comment.clone()),
			status_code: record
				.and_then(|status| status.status_code)
				.unwrap_or(DEFAULT_STATUS_CODE),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormattedImage {
	pub ref_id: String,
	pub caption: Option<String>,
	pub recreation_resource_image_variants: Vec<FormattedImageVariant>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormattedImageVariant {
	pub size_code: ImageSizeCode,
	pub url: String,
	pub width: Option<i32>,
	pub height: Option<i32>,
	pub extension: Option<String>,
}

pub fn format_rows(rows: &[ResourceRow], sizes: &BTreeSet<ImageSizeCode>) -> Vec<FormattedResource> {
	rows.iter().map(|row| format_row(row, sizes)).collect()
}

fn format_row(row: &ResourceRow, sizes: &BTreeSet<ImageSizeCode>) -> FormattedResource {
	FormattedResource {
		rec_resource_id: row.rec_resource_id.clone(),
		name: row.name.clone(),
		closest_community: row.closest_community.clone(),
		display_on_public_site: row.display_on_public_site,
		district_code: row.district_code.clone(),
		district_description: row.district_description.clone(),
		rec_resource_type: row
			.recreation_resource_type
			.as_ref()
			.map(|resource_type| resource_type.description.clone()),
		recreation_activity: row
			.recreation_activity
			.iter()
			.map(|link| FormattedActivity {
				recreation_activity_code: link.recreation_activity.recreation_activity_code,
				description: link.recreation_activity.description.clone(),
			})
			.collect(),
		recreation_status: FormattedStatus::from_record(row.recreation_status.as_deref()),
		recreation_resource_images: row
			.recreation_resource_images
			.iter()
			.map(|image| format_image(image, sizes))
			.collect(),
	}
}

fn format_image(image: &ImageRecord, sizes: &BTreeSet<ImageSizeCode>) -> FormattedImage {
	let recreation_resource_image_variants = image
		.recreation_resource_image_variants
		.iter()
		.filter_map(|variant| {
			// Variants with a size code outside the known set are never served.
			let size_code = variant.size_code.parse::<ImageSizeCode>().ok()?;

			sizes.contains(&size_code).then(|| FormattedImageVariant {
				size_code,
				url: variant.url.clone(),
				width: variant.width,
				height: variant.height,
				extension: variant.extension.clone(),
			})
		})
		.collect();

	FormattedImage {
		ref_id: image.ref_id.clone(),
		caption: image.caption.clone(),
		recreation_resource_image_variants,
	}
}

#[cfg(test)]
mod tests {
	use rst_storage::models::{
		ActivityCode, ActivityLink, ImageVariantRecord, ResourceTypeRecord,
	};
	use sqlx::types::Json;

	use super::*;

	fn variant(size_code: &str) -> ImageVariantRecord {
		ImageVariantRecord {
			size_code: size_code.to_string(),
			url: format!("https://images.example/{size_code}.webp"),
			width: Some(800),
			height: Some(600),
			extension: Some("webp".to_string()),
		}
	}

	fn row() -> ResourceRow {
		ResourceRow {
			rec_resource_id: "REC0001".to_string(),
			name: "Alpha Lake".to_string(),
			closest_community: Some("Hope".to_string()),
			display_on_public_site: true,
			district_code: Some("CHWK".to_string()),
			district_description: Some("Chilliwack".to_string()),
			recreation_resource_type_code: Some("RR".to_string()),
			recreation_resource_type: Some(Json(ResourceTypeRecord {
				rec_resource_type_code: "RR".to_string(),
				description: "Recreation reserve".to_string(),
			})),
			recreation_activity: Json(vec![ActivityLink {
				recreation_activity: ActivityCode {
					recreation_activity_code: 9,
					description: "Angling".to_string(),
				},
			}]),
			recreation_status: None,
			recreation_resource_images: Json(vec![ImageRecord {
				ref_id: "IMG1".to_string(),
				caption: Some("Dock".to_string()),
				recreation_resource_image_variants: vec![variant("thm"), variant("scr"), variant("xyz")],
			}]),
		}
	}

	#[test]
	fn activities_are_flattened() {
		let formatted = format_rows(&[row()], &BTreeSet::new());

		assert_eq!(formatted[0].recreation_activity, vec![FormattedActivity {
			recreation_activity_code: 9,
			description: "Angling".to_string(),
		}]);
		assert_eq!(formatted[0].rec_resource_type.as_deref(), Some("Recreation reserve"));
	}

	#[test]
	fn missing_status_defaults_to_open() {
		let formatted = format_rows(&[row()], &BTreeSet::new());

		assert_eq!(formatted[0].recreation_status, FormattedStatus {
			description: "Open".to_string(),
			comment: None,
			status_code: 1,
		});
	}

	#[test]
	fn stored_status_is_kept() {
		let mut closed = row();

		closed.recreation_status = Some(Json(StatusRecord {
			description: Some("Closed".to_string()),
			comment: Some("Washout".to_string()),
			status_code: Some(2),
		}));

		let formatted = format_rows(&[closed], &BTreeSet::new());

		assert_eq!(formatted[0].recreation_status.description, "Closed");
		assert_eq!(formatted[0].recreation_status.comment.as_deref(), Some("Washout"));
		assert_eq!(formatted[0].recreation_status.status_code, 2);
	}

	#[test]
	fn variants_are_filtered_to_requested_sizes() {
		let formatted = format_rows(&[row()], &BTreeSet::from([ImageSizeCode::Thm]));
		let variants = &formatted[0].recreation_resource_images[0].recreation_resource_image_variants;

		assert_eq!(variants.len(), 1);
		assert_eq!(variants[0].size_code, ImageSizeCode::Thm);
	}

	#[test]
	fn no_requested_sizes_keeps_images_without_variants() {
		let formatted = format_rows(&[row()], &BTreeSet::new());

		assert_eq!(formatted[0].recreation_resource_images.len(), 1);
		assert!(formatted[0].recreation_resource_images[0].recreation_resource_image_variants.is_empty());
	}

	#[test]
	fn input_rows_are_left_untouched() {
		let rows = vec![row()];
		let _ = format_rows(&rows, &BTreeSet::from([ImageSizeCode::Scr]));

		assert_eq!(rows[0].recreation_resource_images[0].recreation_resource_image_variants.len(), 3);
	}

	#[test]
	fn size_codes_parse_case_insensitively() {
		assert_eq!("THM".parse::<ImageSizeCode>().ok(), Some(ImageSizeCode::Thm));
		assert_eq!(" original ".parse::<ImageSizeCode>().ok(), Some(ImageSizeCode::Original));
		assert!("huge".parse::<ImageSizeCode>().is_err());
		assert_eq!(ImageSizeCode::Llc.as_str(), "llc");
	}
}

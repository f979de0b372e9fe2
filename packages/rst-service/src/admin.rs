use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use rst_storage::sync::{
	self, Columns, CompositeSyncRequest, RECREATION_ACCESS, RECREATION_ACTIVITY,
	RECREATION_RESOURCE_FEATURE, SyncOutcome, SyncRequest,
};

use crate::{Error, Result, RstService};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessSelection {
	pub access_code: String,
	#[serde(default)]
	pub sub_access_codes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitiesResponse {
	pub rec_resource_id: String,
	pub recreation_activity_codes: Vec<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturesResponse {
	pub rec_resource_id: String,
	pub feature_codes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessResponse {
	pub rec_resource_id: String,
	pub access: Vec<AccessSelection>,
}

impl RstService {
	pub async fn update_activities(
		&self,
		rec_resource_id: &str,
		codes: Vec<i32>,
	) -> Result<ActivitiesResponse> {
		let rec_resource_id = resource_id(rec_resource_id)?;
		let mut tx = self.db.pool.begin().await?;

		ensure_resource(&mut *tx, &rec_resource_id).await?;

		let row_id = rec_resource_id.clone();
		let outcome = sync::sync(&mut *tx, &self.registry, SyncRequest {
			table: RECREATION_ACTIVITY.name,
			scope: Columns::new().with("rec_resource_id", rec_resource_id.as_str()),
			key_column: "recreation_activity_code",
			desired_keys: codes,
			create_row: move |code: &i32| {
				Columns::new()
					.with("rec_resource_id", row_id.as_str())
					.with("recreation_activity_code", *code)
			},
		})
		.await?;
		let recreation_activity_codes: Vec<i32> = sqlx::query_scalar(
			"\
SELECT recreation_activity_code
FROM recreation_activity
WHERE rec_resource_id = $1
ORDER BY recreation_activity_code",
		)
		.bind(&rec_resource_id)
		.fetch_all(&mut *tx)
		.await?;

		tx.commit().await?;
		log_outcome(RECREATION_ACTIVITY.name, &rec_resource_id, outcome);

		Ok(ActivitiesResponse { rec_resource_id, recreation_activity_codes })
	}

	pub async fn update_features(
		&self,
		rec_resource_id: &str,
		codes: Vec<String>,
	) -> Result<FeaturesResponse> {
		let rec_resource_id = resource_id(rec_resource_id)?;
		let codes = codes
			.into_iter()
			.map(|code| required_code("feature_code", &code))
			.collect::<Result<Vec<_>>>()?;
		let mut tx = self.db.pool.begin().await?;

		ensure_resource(&mut *tx, &rec_resource_id).await?;

		let row_id = rec_resource_id.clone();
		let outcome = sync::sync(&mut *tx, &self.registry, SyncRequest {
			table: RECREATION_RESOURCE_FEATURE.name,
			scope: Columns::new().with("rec_resource_id", rec_resource_id.as_str()),
			key_column: "feature_code",
			desired_keys: codes,
			create_row: move |code: &String| {
				Columns::new()
					.with("rec_resource_id", row_id.as_str())
					.with("feature_code", code.as_str())
			},
		})
		.await?;
		let feature_codes: Vec<String> = sqlx::query_scalar(
			"\
SELECT feature_code
FROM recreation_resource_feature
WHERE rec_resource_id = $1
ORDER BY feature_code",
		)
		.bind(&rec_resource_id)
		.fetch_all(&mut *tx)
		.await?;

		tx.commit().await?;
		log_outcome(RECREATION_RESOURCE_FEATURE.name, &rec_resource_id, outcome);

		Ok(FeaturesResponse { rec_resource_id, feature_codes })
	}

	pub async fn update_access(
		&self,
		rec_resource_id: &str,
		access: Vec<AccessSelection>,
	) -> Result<AccessResponse> {
		let rec_resource_id = resource_id(rec_resource_id)?;
		let desired_rows = access_tuples(&access)?;
		let mut tx = self.db.pool.begin().await?;

		ensure_resource(&mut *tx, &rec_resource_id).await?;

		let row_id = rec_resource_id.clone();
		let outcome = sync::sync_composite(&mut *tx, &self.registry, CompositeSyncRequest {
			table: RECREATION_ACCESS.name,
			scope: Columns::new().with("rec_resource_id", rec_resource_id.as_str()),
			desired_rows,
			create_row: move |tuple: &Columns| {
				tuple
					.iter()
					.fold(Columns::new().with("rec_resource_id", row_id.as_str()), |row, (column, value)| {
						row.with(*column, value.clone())
					})
			},
		})
		.await?;
		let stored: Vec<(String, Option<String>)> = sqlx::query_as(
			"\
SELECT access_code, sub_access_code
FROM recreation_access
WHERE rec_resource_id = $1
ORDER BY access_code, sub_access_code NULLS FIRST",
		)
		.bind(&rec_resource_id)
		.fetch_all(&mut *tx)
		.await?;

		tx.commit().await?;
		log_outcome(RECREATION_ACCESS.name, &rec_resource_id, outcome);

		Ok(AccessResponse { rec_resource_id, access: group_access(stored) })
	}
}

fn resource_id(raw: &str) -> Result<String> {
	required_code("rec_resource_id", raw)
}

fn required_code(field: &str, raw: &str) -> Result<String> {
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return Err(Error::InvalidRequest { message: format!("{field} must be non-empty.") });
	}

	Ok(trimmed.to_string())
}

async fn ensure_resource(conn: &mut PgConnection, rec_resource_id: &str) -> Result<()> {
	let exists: bool = sqlx::query_scalar(
		"SELECT EXISTS (SELECT 1 FROM recreation_resource WHERE rec_resource_id = $1)",
	)
	.bind(rec_resource_id)
	.fetch_one(conn)
	.await?;

	if !exists {
		return Err(Error::NotFound {
			message: format!("Recreation resource {rec_resource_id:?} does not exist."),
		});
	}

	Ok(())
}

/// An access code without sub-codes stands for one row with a NULL sub-code.
fn access_tuples(access: &[AccessSelection]) -> Result<Vec<Columns>> {
	let mut tuples = Vec::new();

	for selection in access {
		let access_code = required_code("access_code", &selection.access_code)?;

		if selection.sub_access_codes.is_empty() {
			tuples.push(
				Columns::new()
					.with("access_code", access_code.as_str())
					.with("sub_access_code", None::<String>),
			);

			continue;
		}

		for sub_access_code in &selection.sub_access_codes {
			let sub_access_code = required_code("sub_access_code", sub_access_code)?;

			tuples.push(
				Columns::new()
					.with("access_code", access_code.as_str())
					.with("sub_access_code", sub_access_code),
			);
		}
	}

	Ok(tuples)
}

fn group_access(rows: Vec<(String, Option<String>)>) -> Vec<AccessSelection> {
	let mut grouped: Vec<AccessSelection> = Vec::new();

	for (access_code, sub_access_code) in rows {
		if grouped.last().is_none_or(|last| last.access_code != access_code) {
			grouped.push(AccessSelection { access_code, sub_access_codes: Vec::new() });
		}
		if let (Some(sub_access_code), Some(last)) = (sub_access_code, grouped.last_mut()) {
			last.sub_access_codes.push(sub_access_code);
		}
	}

	grouped
}

fn log_outcome(table: &str, rec_resource_id: &str, outcome: SyncOutcome) {
	tracing::info!(
		table,
		rec_resource_id,
		deleted = outcome.deleted,
		inserted = outcome.inserted,
		"Association sync completed."
	);
}

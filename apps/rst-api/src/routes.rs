use std::{collections::BTreeSet, str::FromStr};

use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, put},
};
use serde::{Deserialize, Serialize};

use rst_service::{
	AccessResponse, AccessSelection, ActivitiesResponse, Error, FeaturesResponse, ImageSizeCode,
	SearchRequest, SearchResponse,
};

use crate::state::AppState;

const SET_DELIMITER: char = '_';
const IMAGE_SIZE_DELIMITER: char = ',';

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/recreation-resource/search", get(search))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/v1/admin/recreation-resources/{id}/activities", put(update_activities))
		.route("/v1/admin/recreation-resources/{id}/features", put(update_features))
		.route("/v1/admin/recreation-resources/{id}/access", put(update_access))
		.with_state(state)
}

/// Query string of the public search endpoint. Set-valued parameters are `_`-delimited
/// (`activities=1_9`); image size codes are `,`-delimited.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
	pub page: Option<u32>,
	pub limit: Option<u32>,
	pub filter: Option<String>,
	pub activities: Option<String>,
	#[serde(rename = "type")]
	pub resource_type: Option<String>,
	pub district: Option<String>,
	pub access: Option<String>,
	pub facilities: Option<String>,
	pub status: Option<String>,
	pub fees: Option<String>,
	pub image_size_codes: Option<String>,
}
impl SearchParams {
	pub fn into_request(self) -> Result<SearchRequest, ApiError> {
		Ok(SearchRequest {
			page: self.page.unwrap_or(1),
			limit: self.limit,
			filter: self.filter,
			activities: parse_set("activities", self.activities.as_deref(), SET_DELIMITER)?,
			types: parse_set("type", self.resource_type.as_deref(), SET_DELIMITER)?,
			districts: parse_set("district", self.district.as_deref(), SET_DELIMITER)?,
			access: parse_set("access", self.access.as_deref(), SET_DELIMITER)?,
			facilities: parse_set("facilities", self.facilities.as_deref(), SET_DELIMITER)?,
			status: parse_set("status", self.status.as_deref(), SET_DELIMITER)?,
			fees: parse_set("fees", self.fees.as_deref(), SET_DELIMITER)?,
			image_size_codes: parse_set(
				"imageSizeCodes",
				self.image_size_codes.as_deref(),
				IMAGE_SIZE_DELIMITER,
			)?,
		})
	}
}

#[derive(Debug, Deserialize)]
pub struct ActivitiesBody {
	pub recreation_activity_codes: Vec<i32>,
}

#[derive(Debug, Deserialize)]
pub struct FeaturesBody {
	pub feature_codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccessBody {
	pub access: Vec<AccessSelection>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			Error::NotFound { message } => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
			Error::Configuration { message } => {
				tracing::error!(error = %message, "Service configuration error.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR", message)
			},
			Error::Storage { message } => {
				tracing::error!(error = %message, "Storage error.");

				Self::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"STORAGE_ERROR",
					"Internal storage error.",
				)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(params.into_request()?).await?;

	Ok(Json(response))
}

async fn update_activities(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Json(body): Json<ActivitiesBody>,
) -> Result<Json<ActivitiesResponse>, ApiError> {
	let response = state.service.update_activities(&id, body.recreation_activity_codes).await?;

	Ok(Json(response))
}

async fn update_features(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Json(body): Json<FeaturesBody>,
) -> Result<Json<FeaturesResponse>, ApiError> {
	let response = state.service.update_features(&id, body.feature_codes).await?;

	Ok(Json(response))
}

async fn update_access(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Json(body): Json<AccessBody>,
) -> Result<Json<AccessResponse>, ApiError> {
	let response = state.service.update_access(&id, body.access).await?;

	Ok(Json(response))
}

fn parse_set<T>(param: &str, raw: Option<&str>, delimiter: char) -> Result<BTreeSet<T>, ApiError>
where
	T: FromStr + Ord,
{
	let Some(raw) = raw else {
		return Ok(BTreeSet::new());
	};

	raw.split(delimiter)
		.map(str::trim)
		.filter(|item| !item.is_empty())
		.map(|item| {
			item.parse::<T>().map_err(|_| {
				ApiError::new(
					StatusCode::BAD_REQUEST,
					"INVALID_REQUEST",
					format!("{param} contains an invalid value {item:?}."),
				)
			})
		})
		.collect()
}

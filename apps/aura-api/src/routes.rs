use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use aura_discovery::{
	AutocompleteRequest, AutocompleteResponse, Error as DiscoveryError, FacetsRequest,
	FacetsResponse, SearchRequest, SearchResponse, SimilarRequest, SimilarResponse,
};

use crate::state::AppState;

const CLIENT_ID_HEADER: &str = "x-client-id";
const ANONYMOUS_CLIENT: &str = "anonymous";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/discovery/search", post(search))
		.route("/v1/discovery/similar/{id}", get(similar))
		.route("/v1/discovery/facets", post(facets))
		.route("/v1/discovery/autocomplete", get(autocomplete))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct SearchBody {
	query: String,
	language: Option<String>,
	category: Option<String>,
	vector_weight: Option<f32>,
	limit: Option<u32>,
}

async fn search(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(body): Json<SearchBody>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state
		.service
		.search(SearchRequest {
			client_id: client_id(&headers),
			query: body.query,
			language: body.language,
			category: body.category,
			vector_weight: body.vector_weight,
			limit: body.limit,
		})
		.await?;

	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct SimilarParams {
	min_score: Option<f32>,
	top_n: Option<u32>,
}

async fn similar(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(id): Path<Uuid>,
	Query(params): Query<SimilarParams>,
) -> Result<Json<SimilarResponse>, ApiError> {
	let response = state
		.service
		.similar(SimilarRequest {
			client_id: client_id(&headers),
			experience_id: id,
			min_score: params.min_score,
			top_n: params.top_n,
		})
		.await?;

	Ok(Json(response))
}

#[derive(Debug, Default, Deserialize)]
struct FacetsBody {
	category: Option<String>,
	location: Option<String>,
	#[serde(default)]
	tags: Vec<String>,
}

async fn facets(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(body): Json<FacetsBody>,
) -> Result<Json<FacetsResponse>, ApiError> {
	let response = state
		.service
		.facets(FacetsRequest {
			client_id: client_id(&headers),
			category: body.category,
			location: body.location,
			tags: body.tags,
		})
		.await?;

	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct AutocompleteParams {
	prefix: String,
	limit: Option<u32>,
}

async fn autocomplete(
	State(state): State<AppState>,
	headers: HeaderMap,
	Query(params): Query<AutocompleteParams>,
) -> Result<Json<AutocompleteResponse>, ApiError> {
	let response = state
		.service
		.autocomplete(AutocompleteRequest {
			client_id: client_id(&headers),
			prefix: params.prefix,
			limit: params.limit,
		})
		.await?;

	Ok(Json(response))
}

fn client_id(headers: &HeaderMap) -> String {
	headers
		.get(CLIENT_ID_HEADER)
		.and_then(|value| value.to_str().ok())
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.unwrap_or(ANONYMOUS_CLIENT)
		.to_string()
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	remaining: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	reset_at: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	remaining: Option<u32>,
	reset_at: Option<String>,
}

impl ApiError {
	fn new(status: StatusCode, error_code: &str, message: impl Into<String>) -> Self {
		Self {
			status,
			error_code: error_code.to_string(),
			message: message.into(),
			remaining: None,
			reset_at: None,
		}
	}
}

impl From<DiscoveryError> for ApiError {
	fn from(err: DiscoveryError) -> Self {
		match err {
			DiscoveryError::InvalidRequest { message } =>
				ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", message),
			DiscoveryError::RateLimited { remaining, reset_at } => {
				let mut out = ApiError::new(
					StatusCode::TOO_MANY_REQUESTS,
					"rate_limited",
					"Rate limit exceeded. Honor reset_at before retrying.",
				);

				out.remaining = Some(remaining);
				out.reset_at = reset_at.format(&Rfc3339).ok();

				out
			},
			DiscoveryError::NotFound { message } =>
				ApiError::new(StatusCode::NOT_FOUND, "not_found", message),
			DiscoveryError::Provider { message } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "provider_error", message),
			DiscoveryError::Storage { message } =>
				ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "storage_error", message),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			error_code: self.error_code,
			message: self.message,
			remaining: self.remaining,
			reset_at: self.reset_at,
		};

		(self.status, Json(body)).into_response()
	}
}

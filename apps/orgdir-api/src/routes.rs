use axum::{
	Json, Router,
	body::Body,
	extract::{
		Path, Query, Request, State,
		rejection::{JsonRejection, PathRejection, QueryRejection},
	},
	http::StatusCode,
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::get,
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use orgdir_domain::geo::LocationQuery;
use orgdir_service::{
	BuildingView, CategoryItem, CategoryView, CreateBuildingRequest, CreateCategoryRequest,
	CreateOrganizationRequest, Error as ServiceError, OrganizationQuery, OrganizationView,
	UpdateBuildingRequest, UpdateCategoryRequest, UpdateOrganizationRequest,
};

pub const HEADER_API_KEY: &str = "x-api-key";

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
struct PageParams {
	offset: Option<u32>,
	limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TreeParams {
	max_level: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CategoryLookupParams {
	#[serde(default)]
	tree: bool,
	offset: Option<u32>,
	limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct NameParams {
	name: Option<String>,
	offset: Option<u32>,
	limit: Option<u32>,
}

// Fields are spelled out instead of flattening `LocationQuery`: flattened query strings lose
// their numeric types.
#[derive(Debug, Deserialize)]
struct LocationParams {
	lat: Option<f64>,
	lon: Option<f64>,
	radius: Option<f64>,
	min_lat: Option<f64>,
	max_lat: Option<f64>,
	min_lon: Option<f64>,
	max_lon: Option<f64>,
	offset: Option<u32>,
	limit: Option<u32>,
}
impl LocationParams {
	fn location(&self) -> LocationQuery {
		LocationQuery {
			lat: self.lat,
			lon: self.lon,
			radius: self.radius,
			min_lat: self.min_lat,
			max_lat: self.max_lat,
			min_lon: self.min_lon,
			max_lon: self.max_lon,
		}
	}
}

#[derive(Debug, Deserialize)]
struct SearchParams {
	building_id: Option<i64>,
	name: Option<String>,
	#[serde(alias = "activity_id")]
	category_id: Option<i64>,
	#[serde(default)]
	tree: bool,
	lat: Option<f64>,
	lon: Option<f64>,
	radius: Option<f64>,
	min_lat: Option<f64>,
	max_lat: Option<f64>,
	min_lon: Option<f64>,
	max_lon: Option<f64>,
	offset: Option<u32>,
	limit: Option<u32>,
}
impl From<SearchParams> for OrganizationQuery {
	fn from(params: SearchParams) -> Self {
		Self {
			building_id: params.building_id,
			name: params.name,
			category_id: params.category_id,
			tree: params.tree,
			location: LocationQuery {
				lat: params.lat,
				lon: params.lon,
				radius: params.radius,
				min_lat: params.min_lat,
				max_lat: params.max_lat,
				min_lon: params.min_lon,
				max_lon: params.max_lon,
			},
			offset: params.offset,
			limit: params.limit,
		}
	}
}

#[derive(Debug, Serialize)]
struct Deleted {
	ok: bool,
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
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message),
			ServiceError::Validation { message } =>
				json_error(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message),
			ServiceError::InvalidOperation { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_OPERATION", message),
			ServiceError::InvalidArgument { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", message),
			ServiceError::Conflict { message } =>
				json_error(StatusCode::CONFLICT, "CONFLICT", message),
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Storage failure.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"STORAGE_ERROR",
					"Internal storage error.",
				)
			},
		}
	}
}
impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		json_error(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", rejection.body_text())
	}
}
impl From<QueryRejection> for ApiError {
	fn from(rejection: QueryRejection) -> Self {
		json_error(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", rejection.body_text())
	}
}
impl From<PathRejection> for ApiError {
	fn from(rejection: PathRejection) -> Self {
		json_error(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", rejection.body_text())
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	let api = Router::new()
		.route("/categories", get(list_categories).post(create_category))
		.route("/categories/tree", get(category_tree))
		.route("/categories/{id}", get(get_category).patch(update_category).delete(delete_category))
		.route("/organizations", get(search_organizations).post(create_organization))
		.route("/organizations/search", get(organizations_by_name))
		.route("/organizations/by_location", get(organizations_by_location))
		.route("/organizations/by_building/{id}", get(organizations_by_building))
		.route("/organizations/by_category/{id}", get(organizations_by_category))
		.route("/organizations/by_category_tree/{id}", get(organizations_by_category_tree))
		.route("/organizations/by_activity/{id}", get(organizations_by_category))
		.route("/organizations/by_activity_tree/{id}", get(organizations_by_category_tree))
		.route(
			"/organizations/{id}",
			get(get_organization).patch(update_organization).delete(delete_organization),
		)
		.route("/buildings", get(list_buildings).post(create_building))
		.route("/buildings/{id}", get(get_building).patch(update_building).delete(delete_building))
		.route_layer(middleware::from_fn_with_state(state.clone(), api_key_middleware));

	Router::new().route("/health", get(health)).nest("/api/v1", api).with_state(state)
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}

async fn api_key_middleware(
	State(state): State<AppState>,
	req: Request<Body>,
	next: Next,
) -> Response {
	let expected = state.service.cfg.security.api_key.as_str();
	let supplied = req.headers().get(HEADER_API_KEY).and_then(|value| value.to_str().ok());

	if supplied != Some(expected) {
		return json_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Invalid or missing API key.")
			.into_response();
	}

	next.run(req).await
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn list_categories(
	State(state): State<AppState>,
	params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Vec<CategoryItem>> {
	let Query(params) = params?;
	let response = state.service.list_categories(params.offset, params.limit).await?;

	Ok(Json(response))
}

async fn create_category(
	State(state): State<AppState>,
	payload: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> ApiResult<CategoryItem> {
	let Json(payload) = payload?;
	let response = state.service.create_category(payload).await?;

	Ok(Json(response))
}

async fn category_tree(
	State(state): State<AppState>,
	params: Result<Query<TreeParams>, QueryRejection>,
) -> ApiResult<Vec<CategoryView>> {
	let Query(params) = params?;
	let response = state.service.category_tree(params.max_level).await?;

	Ok(Json(response))
}

async fn get_category(
	State(state): State<AppState>,
	id: Result<Path<i64>, PathRejection>,
) -> ApiResult<CategoryView> {
	let Path(id) = id?;

	Ok(Json(state.service.get_category(id).await?))
}

async fn update_category(
	State(state): State<AppState>,
	id: Result<Path<i64>, PathRejection>,
	payload: Result<Json<UpdateCategoryRequest>, JsonRejection>,
) -> ApiResult<CategoryItem> {
	let Path(id) = id?;
	let Json(payload) = payload?;
	let response = state.service.update_category(id, payload).await?;

	Ok(Json(response))
}

async fn delete_category(
	State(state): State<AppState>,
	id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Deleted> {
	let Path(id) = id?;

	state.service.delete_category(id).await?;

	Ok(deleted())
}

async fn search_organizations(
	State(state): State<AppState>,
	params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Vec<OrganizationView>> {
	let Query(params) = params?;
	let response = state.service.search_organizations(params.into()).await?;

	Ok(Json(response))
}

async fn organizations_by_name(
	State(state): State<AppState>,
	params: Result<Query<NameParams>, QueryRejection>,
) -> ApiResult<Vec<OrganizationView>> {
	let Query(params) = params?;
	let name = params.name.unwrap_or_default();
	let response = state.service.organizations_by_name(&name, params.offset, params.limit).await?;

	Ok(Json(response))
}

async fn organizations_by_location(
	State(state): State<AppState>,
	params: Result<Query<LocationParams>, QueryRejection>,
) -> ApiResult<Vec<OrganizationView>> {
	let Query(params) = params?;
	let response = state
		.service
		.organizations_by_location(params.location(), params.offset, params.limit)
		.await?;

	Ok(Json(response))
}

async fn organizations_by_building(
	State(state): State<AppState>,
	id: Result<Path<i64>, PathRejection>,
	params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Vec<OrganizationView>> {
	let Path(id) = id?;
	let Query(params) = params?;
	let response =
		state.service.organizations_by_building(id, params.offset, params.limit).await?;

	Ok(Json(response))
}

async fn organizations_by_category(
	State(state): State<AppState>,
	id: Result<Path<i64>, PathRejection>,
	params: Result<Query<CategoryLookupParams>, QueryRejection>,
) -> ApiResult<Vec<OrganizationView>> {
	let Path(id) = id?;
	let Query(params) = params?;
	let response = state
		.service
		.organizations_by_category(id, params.tree, params.offset, params.limit)
		.await?;

	Ok(Json(response))
}

async fn organizations_by_category_tree(
	State(state): State<AppState>,
	id: Result<Path<i64>, PathRejection>,
	params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Vec<OrganizationView>> {
	let Path(id) = id?;
	let Query(params) = params?;
	let response =
		state.service.organizations_by_category(id, true, params.offset, params.limit).await?;

	Ok(Json(response))
}

async fn get_organization(
	State(state): State<AppState>,
	id: Result<Path<i64>, PathRejection>,
) -> ApiResult<OrganizationView> {
	let Path(id) = id?;

	Ok(Json(state.service.get_organization(id).await?))
}

async fn create_organization(
	State(state): State<AppState>,
	payload: Result<Json<CreateOrganizationRequest>, JsonRejection>,
) -> ApiResult<OrganizationView> {
	let Json(payload) = payload?;
	let response = state.service.create_organization(payload).await?;

	Ok(Json(response))
}

async fn update_organization(
	State(state): State<AppState>,
	id: Result<Path<i64>, PathRejection>,
	payload: Result<Json<UpdateOrganizationRequest>, JsonRejection>,
) -> ApiResult<OrganizationView> {
	let Path(id) = id?;
	let Json(payload) = payload?;
	let response = state.service.update_organization(id, payload).await?;

	Ok(Json(response))
}

async fn delete_organization(
	State(state): State<AppState>,
	id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Deleted> {
	let Path(id) = id?;

	state.service.delete_organization(id).await?;

	Ok(deleted())
}

async fn list_buildings(
	State(state): State<AppState>,
	params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Vec<BuildingView>> {
	let Query(params) = params?;
	let response = state.service.list_buildings(params.offset, params.limit).await?;

	Ok(Json(response))
}

async fn create_building(
	State(state): State<AppState>,
	payload: Result<Json<CreateBuildingRequest>, JsonRejection>,
) -> ApiResult<BuildingView> {
	let Json(payload) = payload?;
	let response = state.service.create_building(payload).await?;

	Ok(Json(response))
}

async fn get_building(
	State(state): State<AppState>,
	id: Result<Path<i64>, PathRejection>,
) -> ApiResult<BuildingView> {
	let Path(id) = id?;

	Ok(Json(state.service.get_building(id).await?))
}

async fn update_building(
	State(state): State<AppState>,
	id: Result<Path<i64>, PathRejection>,
	payload: Result<Json<UpdateBuildingRequest>, JsonRejection>,
) -> ApiResult<BuildingView> {
	let Path(id) = id?;
	let Json(payload) = payload?;
	let response = state.service.update_building(id, payload).await?;

	Ok(Json(response))
}

async fn delete_building(
	State(state): State<AppState>,
	id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Deleted> {
	let Path(id) = id?;

	state.service.delete_building(id).await?;

	Ok(deleted())
}

fn deleted() -> Json<Deleted> {
	Json(Deleted { ok: true })
}

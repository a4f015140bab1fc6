//! API request handlers
//!
//! This module implements HTTP request handlers for all API endpoints.

use asset_tagger_core::{Asset, Country, Manufacturer, QrFormat};
use asset_tagger_service::{
    AddCatalogEntryRequest, CreateAssetRequest, GenerateTagsRequest, GenerateTagsResponse,
    ImportTagsRequest, ImportTagsResponse, ListAssetsRequest, ListAssetsResponse, NextTagRequest,
    NextTagResponse, ServiceRegistry, StatsResponse, UpdateAssetRequest,
};
use asset_tagger_store::BackendHealth;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::{
    error::{ApiError, ApiResult},
    responses::{created, ok, respond, ApiResponse, ComponentHealth, HealthResponse},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Service registry
    pub services: Arc<ServiceRegistry>,
}

impl AppState {
    /// Create new application state
    pub fn new(services: ServiceRegistry) -> Self {
        Self {
            services: Arc::new(services),
        }
    }
}

type JsonResponse<T> = Json<ApiResponse<T>>;

// ============================================================================
// Asset Handlers
// ============================================================================

/// List assets with optional filters and pagination
#[instrument(skip(state))]
pub async fn list_assets(
    State(state): State<AppState>,
    query: Result<Query<ListAssetsRequest>, QueryRejection>,
) -> ApiResult<JsonResponse<ListAssetsResponse>> {
    let Query(request) = query?;
    debug!("Listing assets");

    let outcome = state
        .services
        .inventory()
        .list_assets(request)
        .await
        .map_err(ApiError::from)?;

    Ok(respond(outcome))
}

/// Record an asset under an explicit tag
#[instrument(skip(state))]
pub async fn create_asset(
    State(state): State<AppState>,
    body: Result<Json<CreateAssetRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, JsonResponse<Asset>)> {
    let Json(request) = body?;
    info!("Creating asset with tag: {}", request.tag);

    let outcome = state
        .services
        .tagging()
        .create_asset(request)
        .await
        .map_err(ApiError::from)?;

    Ok(created(outcome))
}

/// Get asset by tag
#[instrument(skip(state))]
pub async fn get_asset(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> ApiResult<JsonResponse<Asset>> {
    debug!("Getting asset: {}", tag);

    let outcome = state
        .services
        .inventory()
        .get_asset(&tag)
        .await
        .map_err(ApiError::from)?;

    Ok(respond(outcome))
}

/// Update an asset's name or description
#[instrument(skip(state))]
pub async fn update_asset(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    body: Result<Json<UpdateAssetRequest>, JsonRejection>,
) -> ApiResult<JsonResponse<Asset>> {
    let Json(request) = body?;
    info!("Updating asset: {}", tag);

    let outcome = state
        .services
        .inventory()
        .update_asset(&tag, request)
        .await
        .map_err(ApiError::from)?;

    Ok(respond(outcome))
}

/// Query parameters of the QR endpoint
#[derive(Debug, Default, Deserialize)]
pub struct QrQuery {
    /// `png` (default) or `svg`
    pub format: Option<String>,
}

/// Render the QR code of an existing asset
#[instrument(skip(state))]
pub async fn asset_qr(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    query: Result<Query<QrQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let format = match query.format.as_deref() {
        Some(raw) => raw
            .parse::<QrFormat>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
        None => QrFormat::default(),
    };
    debug!("Rendering {:?} QR code for {}", format, tag);

    let image = state
        .services
        .inventory()
        .render_qr(&tag, format)
        .await
        .map_err(ApiError::from)?;

    Ok(([(header::CONTENT_TYPE, image.format.content_type())], image.bytes).into_response())
}

// ============================================================================
// Tag Handlers
// ============================================================================

/// Preview the next tag for a country and manufacturer without consuming it
#[instrument(skip(state))]
pub async fn next_tag(
    State(state): State<AppState>,
    query: Result<Query<NextTagRequest>, QueryRejection>,
) -> ApiResult<JsonResponse<NextTagResponse>> {
    let Query(request) = query?;

    let outcome = state
        .services
        .tagging()
        .preview_next_tag(request)
        .await
        .map_err(ApiError::from)?;

    Ok(respond(outcome))
}

/// Generate one or more tags and record their assets
#[instrument(skip(state))]
pub async fn generate_tags(
    State(state): State<AppState>,
    body: Result<Json<GenerateTagsRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, JsonResponse<GenerateTagsResponse>)> {
    let Json(request) = body?;
    info!(
        "Generating {} tag(s) for {}-{}",
        request.count, request.country_code, request.manufacturer_code
    );

    let outcome = state
        .services
        .tagging()
        .generate_tags(request)
        .await
        .map_err(ApiError::from)?;

    if outcome.data.dry_run {
        Ok((StatusCode::OK, respond(outcome)))
    } else {
        Ok(created(outcome))
    }
}

/// Import pasted tags, one per line
#[instrument(skip(state, body))]
pub async fn import_tags(
    State(state): State<AppState>,
    body: Result<Json<ImportTagsRequest>, JsonRejection>,
) -> ApiResult<JsonResponse<ImportTagsResponse>> {
    let Json(request) = body?;
    info!("Importing {} line(s)", request.text.lines().count());

    let outcome = state
        .services
        .tagging()
        .import_tags(request)
        .await
        .map_err(ApiError::from)?;

    Ok(respond(outcome))
}

/// Query parameters of the recent-assets endpoint
#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    /// Maximum number of assets returned
    pub limit: Option<usize>,
}

/// Most recently created assets
#[instrument(skip(state))]
pub async fn recent_tags(
    State(state): State<AppState>,
    query: Result<Query<RecentQuery>, QueryRejection>,
) -> ApiResult<JsonResponse<Vec<Asset>>> {
    let Query(query) = query?;

    let outcome = state
        .services
        .inventory()
        .recent_assets(query.limit)
        .await
        .map_err(ApiError::from)?;

    Ok(respond(outcome))
}

/// Quick statistics over all assets
#[instrument(skip(state))]
pub async fn stats(State(state): State<AppState>) -> ApiResult<JsonResponse<StatsResponse>> {
    let outcome = state
        .services
        .inventory()
        .stats()
        .await
        .map_err(ApiError::from)?;

    Ok(respond(outcome))
}

// ============================================================================
// Catalog Handlers
// ============================================================================

/// List countries
#[instrument(skip(state))]
pub async fn list_countries(State(state): State<AppState>) -> ApiResult<JsonResponse<Vec<Country>>> {
    let outcome = state
        .services
        .catalog()
        .list_countries()
        .await
        .map_err(ApiError::from)?;

    Ok(respond(outcome))
}

/// Add a country
#[instrument(skip(state))]
pub async fn add_country(
    State(state): State<AppState>,
    body: Result<Json<AddCatalogEntryRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, JsonResponse<Country>)> {
    let Json(request) = body?;
    let outcome = state
        .services
        .catalog()
        .add_country(request)
        .await
        .map_err(ApiError::from)?;

    Ok(created(outcome))
}

/// Remove a country
#[instrument(skip(state))]
pub async fn remove_country(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<JsonResponse<Country>> {
    let outcome = state
        .services
        .catalog()
        .remove_country(&code)
        .await
        .map_err(ApiError::from)?;

    Ok(respond(outcome))
}

/// List manufacturers
#[instrument(skip(state))]
pub async fn list_manufacturers(
    State(state): State<AppState>,
) -> ApiResult<JsonResponse<Vec<Manufacturer>>> {
    let outcome = state
        .services
        .catalog()
        .list_manufacturers()
        .await
        .map_err(ApiError::from)?;

    Ok(respond(outcome))
}

/// Add a manufacturer
#[instrument(skip(state))]
pub async fn add_manufacturer(
    State(state): State<AppState>,
    body: Result<Json<AddCatalogEntryRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, JsonResponse<Manufacturer>)> {
    let Json(request) = body?;
    let outcome = state
        .services
        .catalog()
        .add_manufacturer(request)
        .await
        .map_err(ApiError::from)?;

    Ok(created(outcome))
}

/// Remove a manufacturer
#[instrument(skip(state))]
pub async fn remove_manufacturer(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<JsonResponse<Manufacturer>> {
    let outcome = state
        .services
        .catalog()
        .remove_manufacturer(&code)
        .await
        .map_err(ApiError::from)?;

    Ok(respond(outcome))
}

// ============================================================================
// Health & Info Handlers
// ============================================================================

fn component_health(health: &BackendHealth, critical: bool) -> ComponentHealth {
    if health.healthy {
        return ComponentHealth::healthy();
    }

    let message = health
        .message
        .clone()
        .unwrap_or_else(|| format!("{} backend unreachable", health.backend));
    if critical {
        ComponentHealth::unhealthy(message)
    } else {
        ComponentHealth::degraded(message)
    }
}

/// Health check endpoint
///
/// A failing remote only degrades the service since writes fall back to
/// local files; a failing local directory makes it unhealthy.
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> HealthResponse {
    debug!("Health check requested");

    let status = state.services.inventory().storage_status().await;

    let mut response = HealthResponse::healthy()
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_storage_mode(status.mode)
        .with_check("local", component_health(&status.local, true));

    if let Some(remote) = &status.remote {
        response = response.with_check("remote", component_health(remote, false));
    }

    response.compute_status()
}

/// Get API version information
#[instrument]
pub async fn version_info() -> Json<ApiResponse<VersionInfo>> {
    let info = VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_version: "v1".to_string(),
        build_timestamp: option_env!("BUILD_TIMESTAMP")
            .unwrap_or("unknown")
            .to_string(),
    };

    Json(ok(info))
}

/// Version information
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Crate version
    pub version: String,

    /// API version
    pub api_version: String,

    /// Build timestamp
    pub build_timestamp: String,
}

//! API route definitions
//!
//! This module defines all API routes and builds the router.

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers::{
    add_country, add_manufacturer, asset_qr, create_asset, generate_tags, get_asset,
    health_check, import_tags, list_assets, list_countries, list_manufacturers, next_tag,
    recent_tags, remove_country, remove_manufacturer, stats, update_asset, version_info,
    AppState,
};

/// Build the API router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health and info endpoints
        .route("/health", get(health_check))
        .route("/version", get(version_info))
        // API v1 routes
        .nest("/v1", build_v1_routes())
        .with_state(state)
}

/// Build v1 API routes
fn build_v1_routes() -> Router<AppState> {
    Router::new()
        // Asset routes
        .route("/assets", get(list_assets).post(create_asset))
        .route("/assets/{tag}", get(get_asset).patch(update_asset))
        .route("/assets/{tag}/qr", get(asset_qr))
        // Tag routes
        .route("/tags/next", get(next_tag))
        .route("/tags/generate", post(generate_tags))
        .route("/tags/import", post(import_tags))
        .route("/tags/recent", get(recent_tags))
        .route("/stats", get(stats))
        // Catalog routes
        .route("/countries", get(list_countries).post(add_country))
        .route("/countries/{code}", delete(remove_country))
        .route("/manufacturers", get(list_manufacturers).post(add_manufacturer))
        .route("/manufacturers/{code}", delete(remove_manufacturer))
}

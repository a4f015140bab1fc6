//! Asset Tagger API Layer
//!
//! This crate provides the REST API layer for the asset tagger using Axum.
//! It includes request handlers, middleware, error handling, and response types.
//!
//! # Architecture
//!
//! The API layer is organized into:
//!
//! - **Handlers**: Request handlers for all API endpoints
//! - **Routes**: Route definitions and router configuration
//! - **Middleware**: Tower middleware for logging, CORS, compression and request IDs
//! - **Error Handling**: Conversion of service errors to HTTP responses
//! - **Responses**: The `{ data, warnings }` envelope and health types
//!
//! # Example
//!
//! ```rust,no_run
//! use asset_tagger_api::build_api_server;
//! use asset_tagger_service::ServiceRegistry;
//! use asset_tagger_store::{LocalFileBackend, RecordStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RecordStore::new(Arc::new(LocalFileBackend::new("data")));
//! let app = build_api_server(ServiceRegistry::new(store));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod responses;
pub mod routes;

// Re-export main types for convenience
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use handlers::{AppState, VersionInfo};
pub use middleware::{CorsConfig, MiddlewareConfig, UuidRequestIdGenerator, REQUEST_ID_HEADER};
pub use responses::{
    created, ok, respond, ApiResponse, ComponentHealth, HealthResponse, HealthStatus,
};
pub use routes::build_router;

use asset_tagger_service::ServiceRegistry;
use axum::Router;
use tower_http::{
    compression::CompressionLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
};

/// Build a complete API server with middleware
///
/// This is a convenience function that builds a router with all middleware
/// configured using default settings.
pub fn build_api_server(services: ServiceRegistry) -> Router {
    build_api_server_with_config(services, MiddlewareConfig::default())
}

/// Build API server with custom middleware configuration
///
/// # Example
///
/// ```rust,no_run
/// use asset_tagger_api::{build_api_server_with_config, CorsConfig, MiddlewareConfig};
/// use asset_tagger_service::ServiceRegistry;
///
/// # fn example(services: ServiceRegistry) {
/// let middleware_config = MiddlewareConfig::new()
///     .with_compression(false)
///     .with_cors(CorsConfig::default().with_origins(vec!["https://assets.example.com".into()]));
///
/// let app = build_api_server_with_config(services, middleware_config);
/// # }
/// ```
pub fn build_api_server_with_config(
    services: ServiceRegistry,
    middleware_config: MiddlewareConfig,
) -> Router {
    let state = AppState::new(services);
    let mut router = build_router(state);

    router = router.layer(middleware_config.cors.into_layer());

    if middleware_config.enable_compression {
        router = router.layer(CompressionLayer::new());
    }

    if middleware_config.enable_tracing {
        router = router.layer(middleware::trace_layer());
    }

    // The id must be set before propagation reads it, so SetRequestIdLayer is outermost
    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(UuidRequestIdGenerator))
}

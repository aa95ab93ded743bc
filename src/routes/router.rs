use crate::config::RateLimitConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::ClientIpKeyExtractor;
use axum::middleware;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::docs;
use super::health;
use super::url_handlers;
use super::AppState;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Create application router
pub fn create_router(
    state: Arc<AppState>,
    allowed_origins: Vec<String>,
    rate_limit_config: RateLimitConfig,
) -> AppResult<axum::Router> {
    use crate::middleware::{request_context_middleware, request_id_middleware};

    rate_limit_config
        .validate()
        .map_err(AppError::Configuration)?;

    let governor_config = |limits: &RateLimitConfig| {
        GovernorConfigBuilder::default()
            .per_millisecond(limits.period_ms())
            .burst_size(limits.burst_size)
            .key_extractor(ClientIpKeyExtractor)
            .finish()
            .ok_or_else(|| AppError::Configuration("Invalid rate limit settings".to_string()))
    };

    // Strict tier for endpoints that mutate the table
    let strict_config = governor_config(&rate_limit_config)?;
    // Lookups and redirects
    let lenient_config = governor_config(&rate_limit_config.lenient())?;

    let cors = if allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<http::HeaderValue> = allowed_origins
            .iter()
            .filter_map(|s| s.parse::<http::HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // POST /api/shorten, DELETE /api/url/{short_code}
    let sensitive_routes = axum::Router::new()
        .route("/api/shorten", post(url_handlers::shorten_url))
        .route(
            "/api/url/{short_code}",
            axum::routing::delete(url_handlers::delete_url),
        )
        .layer(GovernorLayer::new(strict_config));

    // GET /api/url/{short_code}, GET /api/urls, GET /{short_code}
    let public_routes = axum::Router::new()
        .route("/api/url/{short_code}", get(url_handlers::get_url_info))
        .route("/api/urls", get(url_handlers::list_urls))
        .route("/{short_code}", get(url_handlers::redirect))
        .layer(GovernorLayer::new(lenient_config));

    // No rate limiting
    let open_routes = axum::Router::new()
        .route("/_health", get(health::health_check))
        .route("/api-docs/openapi.json", get(docs::openapi_json));

    Ok(sensitive_routes
        .merge(public_routes)
        .merge(open_routes)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_context_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state))
}

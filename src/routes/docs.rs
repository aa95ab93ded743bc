use crate::models::{ShortenRequest, ShortenResponse, UrlInfoResponse};
use crate::routes::types::HealthCheckResponse;
use axum::Json;
use utoipa::OpenApi;

use super::{health, url_handlers};

/// OpenAPI description of the HTTP API
#[derive(OpenApi)]
#[openapi(
    paths(
        url_handlers::shorten_url,
        url_handlers::get_url_info,
        url_handlers::delete_url,
        url_handlers::list_urls,
        url_handlers::redirect,
        health::health_check,
    ),
    components(schemas(ShortenRequest, ShortenResponse, UrlInfoResponse, HealthCheckResponse)),
    tags(
        (name = "links", description = "Short link issuance and lookup"),
        (name = "health", description = "Service status")
    )
)]
pub struct ApiDoc;

/// Serve the OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

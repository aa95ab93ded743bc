use crate::error::{AppError, AppResult};
use crate::middleware::RequestContext;
use crate::models::{ListUrlsQuery, ShortenRequest, ShortenResponse, UrlInfoResponse};
use crate::services::ShortCodeService;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect};
use axum::Extension;
use std::sync::Arc;
use validator::Validate;

use super::AppState;

const DEFAULT_LIST_LIMIT: usize = 10;
const MAX_LIST_LIMIT: usize = 100;

/// Reject codes the service could never have issued without touching the table.
fn checked_code(code: String) -> AppResult<String> {
    if ShortCodeService::is_well_formed(&code) {
        Ok(code)
    } else {
        Err(AppError::UrlNotFound(code))
    }
}

/// Shorten a URL
#[utoipa::path(
    post,
    path = "/api/shorten",
    tag = "links",
    request_body = ShortenRequest,
    responses(
        (status = 201, description = "New short link issued", body = ShortenResponse),
        (status = 200, description = "Existing short link returned", body = ShortenResponse),
        (status = 400, description = "Invalid URL"),
        (status = 503, description = "Short code space exhausted")
    )
)]
pub async fn shorten_url(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ShortenRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidUrl(format!("Validation failed: {}", e)))?;

    let issuance = state
        .shortener
        .shorten_with(&payload.original_url, payload.force_new)
        .await?;

    let status = if issuance.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(ShortenResponse::from_record(issuance.record, &state.base_url)),
    ))
}

/// Get the original URL behind a short code
#[utoipa::path(
    get,
    path = "/api/url/{short_code}",
    tag = "links",
    params(("short_code" = String, Path, description = "Short code")),
    responses(
        (status = 200, description = "Link found", body = UrlInfoResponse),
        (status = 404, description = "Unknown short code")
    )
)]
pub async fn get_url_info(
    State(state): State<Arc<AppState>>,
    Path(short_code): Path<String>,
) -> AppResult<Json<UrlInfoResponse>> {
    let record = state.shortener.resolve(&checked_code(short_code)?).await?;
    Ok(Json(UrlInfoResponse::from_record(record, &state.base_url)))
}

/// Delete a short link
#[utoipa::path(
    delete,
    path = "/api/url/{short_code}",
    tag = "links",
    params(("short_code" = String, Path, description = "Short code")),
    responses(
        (status = 204, description = "Link deleted"),
        (status = 404, description = "Unknown short code")
    )
)]
pub async fn delete_url(
    State(state): State<Arc<AppState>>,
    Path(short_code): Path<String>,
) -> AppResult<StatusCode> {
    state.shortener.delete(&checked_code(short_code)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the most recently issued links
#[utoipa::path(
    get,
    path = "/api/urls",
    tag = "links",
    params(ListUrlsQuery),
    responses((status = 200, description = "Newest first", body = [UrlInfoResponse]))
)]
pub async fn list_urls(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListUrlsQuery>,
) -> Json<Vec<UrlInfoResponse>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    let links = state
        .shortener
        .recent(limit)
        .await
        .into_iter()
        .map(|record| UrlInfoResponse::from_record(record, &state.base_url))
        .collect();

    Json(links)
}

/// Redirect a short code to its original URL
#[utoipa::path(
    get,
    path = "/{short_code}",
    tag = "links",
    params(("short_code" = String, Path, description = "Short code")),
    responses(
        (status = 307, description = "Redirect to the original URL"),
        (status = 404, description = "Unknown short code")
    )
)]
pub async fn redirect(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    Path(short_code): Path<String>,
) -> AppResult<Redirect> {
    let record = state.shortener.resolve(&checked_code(short_code)?).await?;

    // Stored URLs keep the caller's spelling; the header gets the encoded form
    let location = url::Url::parse(&record.long_url).map_err(|e| {
        AppError::Internal(format!("stored URL for {} is unparseable: {}", record.short_code, e))
    })?;

    tracing::info!(
        request_id = %context.request_id,
        client_ip = %context.client_ip,
        user_agent = context.user_agent.as_deref().unwrap_or("-"),
        short_code = %record.short_code,
        "Redirecting"
    );

    Ok(Redirect::temporary(location.as_str()))
}

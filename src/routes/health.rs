use crate::routes::types::HealthCheckResponse;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use super::AppState;

/// Share of the codespace above which health reports "degraded"
const DEGRADED_UTILIZATION: f64 = 0.5;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/_health",
    tag = "health",
    responses((status = 200, description = "Service status", body = HealthCheckResponse))
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthCheckResponse> {
    let stats = state.shortener.stats().await;
    let utilization = stats.links.saturating_add(stats.quarantined) as f64 / stats.codespace as f64;

    let status = if utilization < DEGRADED_UTILIZATION {
        "healthy"
    } else {
        tracing::warn!(utilization, "Short code space is filling up");
        "degraded"
    };

    Json(HealthCheckResponse {
        status: status.to_string(),
        links: stats.links,
        quarantined: stats.quarantined,
        codespace_utilization: utilization,
        timestamp: chrono::Utc::now(),
    })
}

use serde::Serialize;
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthCheckResponse {
    pub status: String,
    pub links: usize,
    pub quarantined: usize,
    /// Share of the codespace in use, 0.0 to 1.0
    pub codespace_utilization: f64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

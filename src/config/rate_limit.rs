use serde::Deserialize;

/// Rate limiting configuration.
///
/// The configured values apply to endpoints that change the link table.
/// Read-only lookups get the [`lenient`](RateLimitConfig::lenient) tier.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum number of requests per minute
    pub requests_per_minute: u64,

    /// Maximum burst size for rate limiting
    pub burst_size: u32,
}

impl RateLimitConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=60_000).contains(&self.requests_per_minute) {
            return Err("RATE_LIMIT_PER_MINUTE must be between 1 and 60000".to_string());
        }

        if self.burst_size == 0 {
            return Err("RATE_LIMIT_BURST must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Replenish period in milliseconds for one request slot.
    pub fn period_ms(&self) -> u64 {
        60_000u64
            .checked_div(self.requests_per_minute)
            .unwrap_or(60_000)
            .max(1)
    }

    /// Twice the rate and twice the burst.
    pub fn lenient(&self) -> Self {
        Self {
            requests_per_minute: self.requests_per_minute.saturating_mul(2).min(60_000),
            burst_size: self.burst_size.saturating_mul(2),
        }
    }
}

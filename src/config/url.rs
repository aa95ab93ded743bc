use serde::Deserialize;

/// URL shortening configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UrlConfig {
    /// Length of randomly generated short codes
    pub short_code_length: usize,

    /// Base URL for constructing short URLs (e.g., "http://localhost:3001")
    pub base_url: String,

    /// Maximum number of attempts to generate a unique short code
    pub short_code_max_attempts: u32,

    /// How long a deleted short code stays quarantined before it can be reissued
    pub code_release_delay_seconds: u64,

    /// How often the background worker releases quarantined codes
    pub release_sweep_interval_seconds: u64,
}

impl UrlConfig {
    /// Validate URL configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.short_code_length < 4 || self.short_code_length > 16 {
            return Err("SHORT_CODE_LENGTH must be between 4 and 16".to_string());
        }

        if self.short_code_max_attempts < 1 || self.short_code_max_attempts > 100 {
            return Err("SHORT_CODE_MAX_ATTEMPTS must be between 1 and 100".to_string());
        }

        if self.release_sweep_interval_seconds == 0 {
            return Err("RELEASE_SWEEP_INTERVAL_SECONDS must be greater than 0".to_string());
        }

        match ::url::Url::parse(&self.base_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
            _ => Err("BASE_URL must be an absolute http:// or https:// URL".to_string()),
        }
    }
}

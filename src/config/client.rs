use crate::client::FallbackPolicy;
use serde::Deserialize;

/// API client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the shortener API (e.g., "http://localhost:3001")
    pub api_base_url: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// What to do when the API cannot be reached
    pub fallback_policy: FallbackPolicy,

    /// Base URL used to build locally generated fallback links
    pub fallback_base_url: String,
}

impl ClientConfig {
    /// Validate client configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_seconds == 0 {
            return Err("API_TIMEOUT_SECONDS must be greater than 0".to_string());
        }

        if ::url::Url::parse(&self.api_base_url).is_err() {
            return Err("API_BASE_URL must be an absolute URL".to_string());
        }

        Ok(())
    }
}

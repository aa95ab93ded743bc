use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// A single issued short link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    pub short_code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
}

/// Request to shorten a URL
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub original_url: String,

    /// Issue a fresh code even if the URL was shortened before
    #[serde(default)]
    pub force_new: bool,
}

/// Response after shortening a URL
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub short_url: String,
    pub short_code: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
}

impl ShortenResponse {
    pub fn from_record(record: LinkRecord, base_url: &str) -> Self {
        ShortenResponse {
            short_url: short_url(base_url, &record.short_code),
            short_code: record.short_code,
            original_url: record.long_url,
            created_at: record.created_at,
        }
    }
}

/// Response for a short code lookup
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UrlInfoResponse {
    pub original_url: String,
    pub short_code: String,
    pub short_url: String,
    pub created_at: DateTime<Utc>,
}

impl UrlInfoResponse {
    pub fn from_record(record: LinkRecord, base_url: &str) -> Self {
        UrlInfoResponse {
            short_url: short_url(base_url, &record.short_code),
            original_url: record.long_url,
            short_code: record.short_code,
            created_at: record.created_at,
        }
    }
}

/// Query parameters for listing recent links
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUrlsQuery {
    /// Number of links to return (default 10, max 100)
    pub limit: Option<usize>,
}

/// Join a base URL and a short code.
pub fn short_url(base_url: &str, short_code: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), short_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_url_trims_trailing_slash() {
        assert_eq!(short_url("http://localhost:3001/", "abc123"), "http://localhost:3001/abc123");
        assert_eq!(short_url("https://sn.ap", "Zz09aa"), "https://sn.ap/Zz09aa");
    }

    #[test]
    fn test_shorten_request_camel_case() {
        let request: ShortenRequest =
            serde_json::from_str(r#"{"originalUrl":"example.com"}"#).unwrap();
        assert_eq!(request.original_url, "example.com");
        assert!(!request.force_new);
        assert!(request.validate().is_ok());

        let empty: ShortenRequest = serde_json::from_str(r#"{"originalUrl":""}"#).unwrap();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_response_serializes_short_url() {
        let record = LinkRecord {
            short_code: "abc123".to_string(),
            long_url: "https://example.com".to_string(),
            created_at: Utc::now(),
        };
        let body = serde_json::to_value(ShortenResponse::from_record(record, "http://x.io")).unwrap();

        assert_eq!(body["shortUrl"], "http://x.io/abc123");
        assert_eq!(body["originalUrl"], "https://example.com");
        assert!(body.get("createdAt").is_some());
    }
}

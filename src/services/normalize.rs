//! Input normalization for long URLs.

use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static HTTP_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://").expect("valid scheme regex"));

static ANY_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z][a-z0-9+.\-]*://").expect("valid scheme regex"));

/// Normalize user input into the absolute URL that gets stored.
///
/// Input without a scheme gets `https://` prepended. The result must parse
/// as an http(s) URL with a host. The returned string keeps the input as
/// typed (apart from trimming and the prefix), so it doubles as the
/// idempotence key.
pub fn normalize_url(raw: &str) -> AppResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidUrl("URL cannot be empty".to_string()));
    }

    // `Url::parse` strips tabs and newlines silently; the stored string must not
    // carry anything the parser would have dropped or re-encoded as a separator
    if trimmed.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(AppError::InvalidUrl(format!(
            "URL must not contain whitespace or control characters: {:?}",
            trimmed
        )));
    }

    let candidate = if HTTP_SCHEME.is_match(trimmed) {
        trimmed.to_string()
    } else if ANY_SCHEME.is_match(trimmed) {
        return Err(AppError::InvalidUrl(format!(
            "only http:// and https:// URLs are supported: {}",
            trimmed
        )));
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&candidate)
        .map_err(|e| AppError::InvalidUrl(format!("{}: {}", trimmed, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::InvalidUrl(format!("unsupported scheme: {}", parsed.scheme())));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(AppError::InvalidUrl(format!("missing host: {}", trimmed)));
    }

    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepends_https() {
        assert_eq!(normalize_url("example.com").unwrap(), "https://example.com");
        assert_eq!(
            normalize_url("  localhost:3000/path?q=1 ").unwrap(),
            "https://localhost:3000/path?q=1"
        );
    }

    #[test]
    fn test_keeps_existing_scheme() {
        assert_eq!(normalize_url("http://example.com").unwrap(), "http://example.com");
        assert_eq!(normalize_url("HTTPS://Example.com/A").unwrap(), "HTTPS://Example.com/A");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(normalize_url("not a url"), Err(AppError::InvalidUrl(_))));
        assert!(matches!(normalize_url(""), Err(AppError::InvalidUrl(_))));
        assert!(matches!(normalize_url("   "), Err(AppError::InvalidUrl(_))));
        assert!(matches!(normalize_url("https://"), Err(AppError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_embedded_whitespace_and_controls() {
        for raw in [
            "https://example.com/a\nb",
            "https://example.com/a\tb",
            "example.com/a b",
            "https://exa\u{7f}mple.com",
        ] {
            assert!(
                matches!(normalize_url(raw), Err(AppError::InvalidUrl(_))),
                "accepted {:?}",
                raw
            );
        }

        // Surrounding whitespace is still trimmed
        assert_eq!(normalize_url("\texample.com\n").unwrap(), "https://example.com");
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(normalize_url("ftp://example.com").is_err());
        assert!(normalize_url("javascript:alert(1)").is_err());
    }
}

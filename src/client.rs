//! HTTP client for the shortener API plus the fallback policy applied when
//! the API is unreachable.

use crate::error::{AppError, AppResult};
use crate::models::{short_url, ShortenResponse, UrlInfoResponse};
use crate::services::{normalize_url, random_code};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Length of locally generated fallback codes
pub const FALLBACK_CODE_LENGTH: usize = 6;

/// What the client does when the API is unavailable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Surface the error
    Fail,
    /// Substitute a locally generated link, logged and marked as such
    LocalMock,
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(FallbackPolicy::Fail),
            "local-mock" | "local_mock" => Ok(FallbackPolicy::LocalMock),
            other => Err(format!("unknown fallback policy '{}'", other)),
        }
    }
}

/// Where a short link came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSource {
    /// Issued by the shortener API
    Backend,
    /// Generated locally because the API was unavailable; it does not resolve
    LocalFallback,
}

/// A short link handed back to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedLink {
    pub original_url: String,
    pub short_url: String,
    pub source: LinkSource,
}

/// Operations the shortener API offers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShortenApi: Send + Sync {
    async fn shorten(&self, original_url: &str, force_new: bool) -> AppResult<ShortenResponse>;

    async fn resolve(&self, short_code: &str) -> AppResult<UrlInfoResponse>;

    async fn delete(&self, short_code: &str) -> AppResult<()>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// `reqwest` implementation of [`ShortenApi`]
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into an `AppError`
    async fn error_from(response: Response, subject: &str) -> AppError {
        let status = response.status();
        let body: Option<ErrorBody> = response.json().await.ok();
        let code = body.as_ref().and_then(|b| b.error.clone()).unwrap_or_default();
        let message = body
            .and_then(|b| b.message)
            .unwrap_or_else(|| status.to_string());

        match (status, code.as_str()) {
            (StatusCode::NOT_FOUND, _) => AppError::UrlNotFound(subject.to_string()),
            (_, "INVALID_URL") => AppError::InvalidUrl(message),
            _ => AppError::Backend {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl ShortenApi for ApiClient {
    async fn shorten(&self, original_url: &str, force_new: bool) -> AppResult<ShortenResponse> {
        let response = self
            .http
            .post(self.endpoint("/api/shorten"))
            .json(&json!({ "originalUrl": original_url, "forceNew": force_new }))
            .send()
            .await?;

        debug!(status = %response.status(), "POST /api/shorten");
        if !response.status().is_success() {
            return Err(Self::error_from(response, original_url).await);
        }
        Ok(response.json().await?)
    }

    async fn resolve(&self, short_code: &str) -> AppResult<UrlInfoResponse> {
        let response = self
            .http
            .get(self.endpoint(&format!("/api/url/{}", short_code)))
            .send()
            .await?;

        debug!(status = %response.status(), "GET /api/url/{}", short_code);
        if !response.status().is_success() {
            return Err(Self::error_from(response, short_code).await);
        }
        Ok(response.json().await?)
    }

    async fn delete(&self, short_code: &str) -> AppResult<()> {
        let response = self
            .http
            .delete(self.endpoint(&format!("/api/url/{}", short_code)))
            .send()
            .await?;

        debug!(status = %response.status(), "DELETE /api/url/{}", short_code);
        if !response.status().is_success() {
            return Err(Self::error_from(response, short_code).await);
        }
        Ok(())
    }
}

/// Shortens URLs through a [`ShortenApi`], applying the configured fallback.
pub struct ShortenClient<A> {
    api: A,
    policy: FallbackPolicy,
    fallback_base_url: String,
}

impl<A: ShortenApi> ShortenClient<A> {
    pub fn new(api: A, policy: FallbackPolicy, fallback_base_url: impl Into<String>) -> Self {
        Self {
            api,
            policy,
            fallback_base_url: fallback_base_url.into(),
        }
    }

    /// Normalize `raw` locally, then ask the API for a short link.
    ///
    /// Invalid input fails before any request is made. Client errors from
    /// the API are always returned; unavailability is returned unless the
    /// policy is [`FallbackPolicy::LocalMock`].
    pub async fn shorten(&self, raw: &str, force_new: bool) -> AppResult<IssuedLink> {
        let original_url = normalize_url(raw)?;

        match self.api.shorten(&original_url, force_new).await {
            Ok(response) => Ok(IssuedLink {
                original_url,
                short_url: response.short_url,
                source: LinkSource::Backend,
            }),
            Err(e) if e.is_unavailable() && self.policy == FallbackPolicy::LocalMock => {
                let short_url = short_url(&self.fallback_base_url, &random_code(FALLBACK_CODE_LENGTH));
                warn!(
                    error = %e,
                    %short_url,
                    "Shortener API unavailable; substituting a locally generated link"
                );
                Ok(IssuedLink {
                    original_url,
                    short_url,
                    source: LinkSource::LocalFallback,
                })
            }
            Err(e) => Err(e),
        }
    }
}

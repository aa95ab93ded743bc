use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tower_governor::key_extractor::KeyExtractor;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID wrapper for use in request extensions
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

/// Request context containing request metadata
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub client_ip: String,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn new(request_id: String, client_ip: String, user_agent: Option<String>) -> Self {
        Self {
            request_id,
            client_ip,
            user_agent,
        }
    }
}

/// Extract client IP address from headers
pub fn extract_client_ip(headers: &HeaderMap) -> String {
    // X-Forwarded-For from a proxy or load balancer
    if let Some(first_ip) = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return first_ip.to_string();
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|h| h.to_str().ok()) {
        return real_ip.trim().to_string();
    }

    "unknown".to_string()
}

/// Extract user agent from headers
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

/// Request ID middleware - adds a unique ID to each request
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    // Keep a caller supplied ID, otherwise generate one
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| RequestId(s.to_string()))
        .unwrap_or_default();

    tracing::info!(
        request_id = %request_id.as_str(),
        method = %req.method(),
        path = %req.uri().path(),
        "Incoming request"
    );

    let header_value = HeaderValue::from_str(request_id.as_str()).ok();
    req.extensions_mut().insert(request_id);

    let mut response = next.run(req).await;

    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Request context middleware - adds context to each request
pub async fn request_context_middleware(mut req: Request, next: Next) -> Response {
    let headers = req.headers();
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| RequestId::new().0);

    let client_ip = extract_client_ip(headers);
    let user_agent = extract_user_agent(headers);

    let context = RequestContext::new(request_id, client_ip, user_agent);
    req.extensions_mut().insert(context);

    next.run(req).await
}

/// Rate limit key: the client IP as reported by proxy headers
#[derive(Clone)]
pub struct ClientIpKeyExtractor;

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = String;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, tower_governor::GovernorError> {
        Ok(format!("ip:{}", extract_client_ip(req.headers())))
    }
}

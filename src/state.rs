use crate::services::ShortenerService;

/// Shared by every handler through Axum's `State` extractor, behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub shortener: ShortenerService,

    /// Prefix for issued short URLs, e.g. "http://localhost:3001"
    pub base_url: String,
}

impl AppState {
    pub fn new(shortener: ShortenerService, base_url: impl Into<String>) -> Self {
        Self {
            shortener,
            base_url: base_url.into(),
        }
    }
}

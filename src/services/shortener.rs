use crate::config::UrlConfig;
use crate::error::{AppError, AppResult};
use crate::models::LinkRecord;
use crate::store::LinkTable;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::normalize::normalize_url;
use super::short_code::{random_code_source, CodeSource, ShortCodeService};

/// Tunables for code issuance
#[derive(Debug, Clone)]
pub struct ShortenerSettings {
    pub code_length: usize,
    pub max_attempts: u32,
    /// How long a deleted code stays unavailable
    pub release_delay: Duration,
}

impl From<&UrlConfig> for ShortenerSettings {
    fn from(config: &UrlConfig) -> Self {
        let delay_seconds = i64::try_from(config.code_release_delay_seconds).unwrap_or(i64::MAX);
        Self {
            code_length: config.short_code_length,
            max_attempts: config.short_code_max_attempts,
            release_delay: Duration::try_seconds(delay_seconds).unwrap_or(Duration::MAX),
        }
    }
}

impl Default for ShortenerSettings {
    fn default() -> Self {
        Self {
            code_length: 6,
            max_attempts: 10,
            release_delay: Duration::days(1),
        }
    }
}

/// Result of a shorten call
#[derive(Debug, Clone)]
pub struct Issuance {
    pub record: LinkRecord,
    /// False when an existing mapping was returned
    pub created: bool,
}

/// Counters reported by health checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStats {
    pub links: usize,
    pub quarantined: usize,
    pub codespace: u128,
}

/// Issues, resolves and deletes short links.
///
/// Cloning is cheap; clones share one table.
#[derive(Clone)]
pub struct ShortenerService {
    table: Arc<RwLock<LinkTable>>,
    settings: ShortenerSettings,
    code_source: CodeSource,
}

impl ShortenerService {
    pub fn new(settings: ShortenerSettings) -> Self {
        Self::with_code_source(settings, random_code_source())
    }

    /// Build a service that draws candidate codes from `code_source`.
    pub fn with_code_source(settings: ShortenerSettings, code_source: CodeSource) -> Self {
        Self {
            table: Arc::new(RwLock::new(LinkTable::new())),
            settings,
            code_source,
        }
    }

    pub fn settings(&self) -> &ShortenerSettings {
        &self.settings
    }

    /// Shorten `long_url`, returning the existing mapping if there is one.
    pub async fn shorten(&self, long_url: &str) -> AppResult<LinkRecord> {
        self.shorten_with(long_url, false)
            .await
            .map(|issuance| issuance.record)
    }

    /// Shorten `long_url`; with `force_new` a fresh code is always issued.
    ///
    /// The existence check, code generation and insert all run under the
    /// write lock, so concurrent callers for one URL observe one canonical
    /// code.
    pub async fn shorten_with(&self, long_url: &str, force_new: bool) -> AppResult<Issuance> {
        let normalized = normalize_url(long_url)?;

        let mut table = self.table.write().await;

        if !force_new {
            if let Some(existing) = table.find_by_url(&normalized) {
                debug!(short_code = %existing.short_code, "Returning existing mapping");
                return Ok(Issuance {
                    record: existing.clone(),
                    created: false,
                });
            }
        }

        let short_code = ShortCodeService::generate_short_code(
            self.settings.code_length,
            self.settings.max_attempts,
            self.code_source.as_ref(),
            |code| table.is_taken(code),
        )?;

        let record = LinkRecord {
            short_code,
            long_url: normalized,
            created_at: Utc::now(),
        };
        table.insert(record.clone())?;

        info!(
            short_code = %record.short_code,
            long_url = %record.long_url,
            force_new,
            "Issued short code"
        );

        Ok(Issuance {
            record,
            created: true,
        })
    }

    /// Look up the record for `short_code`.
    pub async fn resolve(&self, short_code: &str) -> AppResult<LinkRecord> {
        self.table
            .read()
            .await
            .get(short_code)
            .cloned()
            .ok_or_else(|| AppError::UrlNotFound(short_code.to_string()))
    }

    /// Delete a record; its code is quarantined for the release delay.
    pub async fn delete(&self, short_code: &str) -> AppResult<LinkRecord> {
        let release_at = Utc::now()
            .checked_add_signed(self.settings.release_delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let removed = self
            .table
            .write()
            .await
            .remove(short_code, release_at)
            .ok_or_else(|| AppError::UrlNotFound(short_code.to_string()))?;

        info!(short_code, %release_at, "Deleted short link");
        Ok(removed)
    }

    /// Newest-first records
    pub async fn recent(&self, limit: usize) -> Vec<LinkRecord> {
        self.table.read().await.recent(limit)
    }

    pub async fn stats(&self) -> LinkStats {
        let table = self.table.read().await;
        LinkStats {
            links: table.len(),
            quarantined: table.quarantined(),
            codespace: ShortCodeService::codespace_size(self.settings.code_length),
        }
    }

    /// Make quarantined codes whose delay elapsed before `now` reusable.
    pub async fn release_quarantined(&self, now: DateTime<Utc>) -> usize {
        let released = self.table.write().await.release_expired(now);
        if released > 0 {
            info!(released, "Released quarantined short codes");
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashSet, VecDeque};
    use std::sync::Mutex;

    fn scripted_source(codes: &[&str]) -> CodeSource {
        let queue: Mutex<VecDeque<String>> =
            Mutex::new(codes.iter().map(|c| c.to_string()).collect());
        let last = codes.last().map(|c| c.to_string()).unwrap_or_default();
        Arc::new(move |_: usize| queue.lock().unwrap().pop_front().unwrap_or_else(|| last.clone()))
    }

    #[tokio::test]
    async fn test_resolve_returns_normalized_url() {
        let service = ShortenerService::new(ShortenerSettings::default());

        for input in ["example.com", "https://rust-lang.org/learn", "http://a.b/c?d=e"] {
            let record = service.shorten(input).await.unwrap();
            let resolved = service.resolve(&record.short_code).await.unwrap();
            assert_eq!(resolved.long_url, normalize_url(input).unwrap());
        }
    }

    #[tokio::test]
    async fn test_shorten_is_idempotent() {
        let service = ShortenerService::new(ShortenerSettings::default());

        let first = service.shorten_with("example.com", false).await.unwrap();
        let second = service.shorten_with("https://example.com", false).await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.record.short_code, second.record.short_code);
        assert_eq!(first.record.long_url, "https://example.com");
        assert_eq!(service.stats().await.links, 1);
    }

    #[tokio::test]
    async fn test_distinct_urls_get_distinct_codes() {
        let service = ShortenerService::new(ShortenerSettings::default());
        let mut codes = HashSet::new();

        for i in 0..200 {
            let record = service.shorten(&format!("https://example.com/{}", i)).await.unwrap();
            assert_eq!(record.short_code.len(), 6);
            codes.insert(record.short_code);
        }

        assert_eq!(codes.len(), 200);
    }

    #[tokio::test]
    async fn test_force_new_issues_second_code() {
        let service = ShortenerService::new(ShortenerSettings::default());

        let first = service.shorten("example.com").await.unwrap();
        let forced = service.shorten_with("example.com", true).await.unwrap();
        let again = service.shorten("example.com").await.unwrap();

        assert!(forced.created);
        assert_ne!(first.short_code, forced.record.short_code);
        assert_eq!(again.short_code, first.short_code);
        assert_eq!(
            service.resolve(&forced.record.short_code).await.unwrap().long_url,
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn test_invalid_url_creates_nothing() {
        let service = ShortenerService::new(ShortenerSettings::default());

        assert!(matches!(
            service.shorten("not a url").await,
            Err(AppError::InvalidUrl(_))
        ));
        assert_eq!(service.stats().await.links, 0);
    }

    #[tokio::test]
    async fn test_resolve_missing_code() {
        let service = ShortenerService::new(ShortenerSettings::default());
        assert!(matches!(
            service.resolve("doesnotexist").await,
            Err(AppError::UrlNotFound(code)) if code == "doesnotexist"
        ));
    }

    #[tokio::test]
    async fn test_collision_exhausts_codespace() {
        let service = ShortenerService::with_code_source(
            ShortenerSettings::default(),
            scripted_source(&["AAAAAA"]),
        );

        service.shorten("https://one.example").await.unwrap();
        let result = service.shorten("https://two.example").await;

        assert!(matches!(
            result,
            Err(AppError::CodespaceExhausted { attempts: 10, length: 6 })
        ));
        assert_eq!(service.stats().await.links, 1);
    }

    #[tokio::test]
    async fn test_deleted_code_quarantined_until_release() {
        let settings = ShortenerSettings {
            release_delay: Duration::hours(1),
            ..ShortenerSettings::default()
        };
        let service = ShortenerService::with_code_source(settings, scripted_source(&["AAAAAA"]));

        service.shorten("https://one.example").await.unwrap();
        service.delete("AAAAAA").await.unwrap();
        assert!(service.resolve("AAAAAA").await.is_err());

        let blocked = service.shorten("https://two.example").await;
        assert!(matches!(blocked, Err(AppError::CodespaceExhausted { .. })));

        assert_eq!(service.release_quarantined(Utc::now()).await, 0);
        assert_eq!(
            service.release_quarantined(Utc::now() + Duration::hours(2)).await,
            1
        );

        let reissued = service.shorten("https://two.example").await.unwrap();
        assert_eq!(reissued.short_code, "AAAAAA");
        assert_eq!(reissued.long_url, "https://two.example");
    }

    #[tokio::test]
    async fn test_delete_missing_code() {
        let service = ShortenerService::new(ShortenerSettings::default());
        assert!(matches!(
            service.delete("nothere").await,
            Err(AppError::UrlNotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_shorten_yields_one_code() {
        let service = ShortenerService::new(ShortenerSettings::default());

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.shorten("example.com/race").await })
            })
            .collect();

        let mut codes = HashSet::new();
        for handle in handles {
            codes.insert(handle.await.unwrap().unwrap().short_code);
        }

        assert_eq!(codes.len(), 1);
        assert_eq!(service.stats().await.links, 1);
    }

    #[test]
    fn test_settings_from_config() {
        let config = UrlConfig {
            short_code_length: 8,
            base_url: "http://localhost:3001".to_string(),
            short_code_max_attempts: 4,
            code_release_delay_seconds: 90,
            release_sweep_interval_seconds: 60,
        };
        let settings = ShortenerSettings::from(&config);

        assert_eq!(settings.code_length, 8);
        assert_eq!(settings.max_attempts, 4);
        assert_eq!(settings.release_delay, Duration::seconds(90));
    }
}

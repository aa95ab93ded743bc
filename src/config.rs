mod client;
mod cors;
mod history;
mod logging;
mod rate_limit;
mod server;
mod url;

pub use self::client::ClientConfig;
pub use self::cors::CorsConfig;
pub use self::history::HistoryConfig;
pub use self::logging::{LogFormat, LoggingConfig};
pub use self::rate_limit::RateLimitConfig;
pub use self::server::ServerConfig;
pub use self::url::UrlConfig;

use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::env;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub url: UrlConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
    pub history: HistoryConfig,
    pub client: ClientConfig,
    pub logging: LoggingConfig,
}

/// Read `key` from the environment, falling back to `default`, and parse it.
fn env_parse<T>(key: &str, default: &str) -> AppResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|e| AppError::Configuration(format!("Invalid {}: {}", key, e)))
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let server_host = env_string("SERVER_HOST", "127.0.0.1");
        let server_port: u16 = env_parse("SERVER_PORT", "3001")?;

        let server = ServerConfig {
            host: server_host,
            port: server_port,
        };
        let base_url = env::var("BASE_URL").unwrap_or_else(|_| server.default_base_url());

        let config = Config {
            server,
            url: UrlConfig {
                short_code_length: env_parse("SHORT_CODE_LENGTH", "6")?,
                base_url,
                short_code_max_attempts: env_parse("SHORT_CODE_MAX_ATTEMPTS", "10")?,
                code_release_delay_seconds: env_parse("CODE_RELEASE_DELAY_SECONDS", "86400")?,
                release_sweep_interval_seconds: env_parse("RELEASE_SWEEP_INTERVAL_SECONDS", "60")?,
            },
            rate_limit: RateLimitConfig {
                requests_per_minute: env_parse("RATE_LIMIT_PER_MINUTE", "60")?,
                burst_size: env_parse("RATE_LIMIT_BURST", "10")?,
            },
            cors: CorsConfig {
                allowed_origins: CorsConfig::parse_origins(&env_string("ALLOWED_ORIGINS", "*")),
            },
            history: HistoryConfig {
                file: env_string("HISTORY_FILE", ".snaplink-history.json").into(),
                key: env_string("HISTORY_KEY", "urlHistory"),
                capacity: env_parse("HISTORY_CAPACITY", "10")?,
            },
            client: ClientConfig {
                api_base_url: env_string("API_BASE_URL", "http://localhost:3001"),
                timeout_seconds: env_parse("API_TIMEOUT_SECONDS", "10")?,
                fallback_policy: env_parse("FALLBACK_POLICY", "fail")?,
                fallback_base_url: env_string("FALLBACK_BASE_URL", "https://short.ly"),
            },
            logging: LoggingConfig {
                format: env_parse("LOG_FORMAT", "text")?,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> AppResult<()> {
        self.server
            .validate()
            .and_then(|_| self.url.validate())
            .and_then(|_| self.rate_limit.validate())
            .and_then(|_| self.history.validate())
            .and_then(|_| self.client.validate())
            .map_err(AppError::Configuration)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::client::FallbackPolicy;

    pub(crate) fn sample_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3001,
            },
            url: UrlConfig {
                short_code_length: 6,
                base_url: "http://localhost:3001".to_string(),
                short_code_max_attempts: 10,
                code_release_delay_seconds: 86400,
                release_sweep_interval_seconds: 60,
            },
            rate_limit: RateLimitConfig {
                requests_per_minute: 60,
                burst_size: 10,
            },
            cors: CorsConfig {
                allowed_origins: vec!["*".to_string()],
            },
            history: HistoryConfig {
                file: ".snaplink-history.json".into(),
                key: "urlHistory".to_string(),
                capacity: 10,
            },
            client: ClientConfig {
                api_base_url: "http://localhost:3001".to_string(),
                timeout_seconds: 10,
                fallback_policy: FallbackPolicy::Fail,
                fallback_base_url: "https://short.ly".to_string(),
            },
            logging: LoggingConfig {
                format: LogFormat::Text,
            },
        }
    }

    #[test]
    fn test_sample_config_is_valid() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn test_short_code_length_bounds() {
        let mut config = sample_config();
        config.url.short_code_length = 3;
        assert!(matches!(config.validate(), Err(AppError::Configuration(_))));

        config.url.short_code_length = 17;
        assert!(config.validate().is_err());

        config.url.short_code_length = 16;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_url_must_be_http() {
        let mut config = sample_config();
        config.url.base_url = "ftp://files.example.com".to_string();
        assert!(config.validate().is_err());

        config.url.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_limit_bounds() {
        let mut config = sample_config();
        config.rate_limit.requests_per_minute = 0;
        assert!(config.validate().is_err());

        config.rate_limit.requests_per_minute = 60_001;
        assert!(config.validate().is_err());

        config.rate_limit.requests_per_minute = 120;
        assert_eq!(config.rate_limit.period_ms(), 500);
    }

    #[test]
    fn test_lenient_tier_doubles_allowance() {
        let config = sample_config();
        let lenient = config.rate_limit.lenient();

        assert_eq!(lenient.requests_per_minute, 120);
        assert_eq!(lenient.burst_size, 20);
        assert_eq!(lenient.period_ms(), config.rate_limit.period_ms() / 2);
    }

    #[test]
    fn test_server_addresses() {
        let config = sample_config();
        assert_eq!(config.server.bind_addr(), "127.0.0.1:3001");
        assert_eq!(config.server.default_base_url(), "http://127.0.0.1:3001");

        let mut config = config;
        config.server.host = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_history_capacity_must_be_positive() {
        let mut config = sample_config();
        config.history.capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cors_origins_parsing() {
        assert_eq!(CorsConfig::parse_origins("*"), vec!["*"]);
        assert_eq!(
            CorsConfig::parse_origins("http://localhost:3000, https://example.com,"),
            vec!["http://localhost:3000", "https://example.com"]
        );
    }

    #[test]
    fn test_env_parse_reports_key() {
        env::set_var("SNAPLINK_TEST_BAD_NUMBER", "twelve");
        let result: AppResult<u32> = env_parse("SNAPLINK_TEST_BAD_NUMBER", "1");
        match result {
            Err(AppError::Configuration(msg)) => assert!(msg.contains("SNAPLINK_TEST_BAD_NUMBER")),
            other => panic!("unexpected result: {:?}", other),
        }

        let fallback: u32 = env_parse("SNAPLINK_TEST_UNSET_NUMBER", "7").unwrap();
        assert_eq!(fallback, 7);
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}

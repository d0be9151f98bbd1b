use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the BallDontLie-style stats API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key sent in the Authorization header
    pub api_key: String,
    /// Requests-per-minute budget (All-Star tier allows 60)
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
    /// Overall request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Minimum interval between two requests under the rate budget
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_secs_f64(60.0 / self.rate_limit_per_minute.max(1) as f64)
    }
}

fn default_base_url() -> String {
    "https://api.balldontlie.io/v1".to_string()
}

fn default_rate_limit() -> u32 {
    60
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL (e.g. "sqlite://courtline.db")
    pub url: String,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

/// Per-endpoint cache TTLs, in seconds.
///
/// Team data barely changes, so it gets a long TTL; box scores refresh twice
/// a day; line/season-average lookups go stale within minutes.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_team_info_ttl")]
    pub team_info_secs: u64,
    #[serde(default = "default_player_info_ttl")]
    pub player_info_secs: u64,
    #[serde(default = "default_player_stats_ttl")]
    pub player_stats_secs: u64,
    #[serde(default = "default_games_ttl")]
    pub games_secs: u64,
    #[serde(default = "default_short_ttl")]
    pub season_averages_secs: u64,
    #[serde(default = "default_short_ttl")]
    pub lines_secs: u64,
}

fn default_team_info_ttl() -> u64 {
    7 * 24 * 3600
}

fn default_player_info_ttl() -> u64 {
    3 * 24 * 3600
}

fn default_player_stats_ttl() -> u64 {
    12 * 3600
}

fn default_games_ttl() -> u64 {
    3 * 3600
}

fn default_short_ttl() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            team_info_secs: default_team_info_ttl(),
            player_info_secs: default_player_info_ttl(),
            player_stats_secs: default_player_stats_ttl(),
            games_secs: default_games_ttl(),
            season_averages_secs: default_short_ttl(),
            lines_secs: default_short_ttl(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct IngestConfig {
    /// Fail a stats batch on unresolved player/game references instead of
    /// skipping the row with a warning
    #[serde(default)]
    pub strict_references: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("provider.base_url", default_base_url())?
            .set_default("provider.rate_limit_per_minute", 60)?
            .set_default("provider.timeout_secs", 30)?
            .set_default("database.url", "sqlite://courtline.db")?
            .set_default("database.max_connections", 5)?
            .set_default("logging.level", "info")?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("COURTLINE_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (COURTLINE_PROVIDER__API_KEY, etc.)
            .add_source(
                Environment::with_prefix("COURTLINE")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.provider.api_key.is_empty() {
            errors.push("provider.api_key is required".to_string());
        }

        if self.provider.rate_limit_per_minute == 0 {
            errors.push("provider.rate_limit_per_minute must be positive".to_string());
        }

        if self.database.url.is_empty() {
            errors.push("database.url is required".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_request_interval() {
        let provider = ProviderConfig {
            base_url: default_base_url(),
            api_key: "key".to_string(),
            rate_limit_per_minute: 60,
            timeout_secs: 30,
        };
        assert_eq!(provider.min_request_interval(), Duration::from_secs(1));

        let fast = ProviderConfig {
            rate_limit_per_minute: 600,
            ..provider
        };
        assert_eq!(fast.min_request_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_validate_rejects_missing_api_key() {
        let cfg = AppConfig {
            provider: ProviderConfig {
                base_url: default_base_url(),
                api_key: String::new(),
                rate_limit_per_minute: 60,
                timeout_secs: 30,
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 5,
            },
            cache: CacheConfig::default(),
            ingest: IngestConfig::default(),
            logging: LoggingConfig::default(),
        };

        let errors = cfg.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("api_key")));
    }
}

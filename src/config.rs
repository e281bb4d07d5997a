use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::core::{AggregationLimits, LocatorSettings, NormalizationMode};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    pub store_directory: StoreDirectorySettings,
    pub geocoder: GeocoderSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub normalizer: NormalizerSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub locator: LocatorConfig,
    #[serde(default)]
    pub aggregation: AggregationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    File,
    Postgres,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    /// `file` or `postgres`
    pub source: SourceKind,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreDirectorySettings {
    /// `file` or `http`
    pub source: SourceKind,
    pub path: Option<String>,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_upstream_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_refresh_interval_secs() -> u64 { 900 }
fn default_upstream_timeout_secs() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderSettings {
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_upstream_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_user_agent() -> String {
    format!("pantry-match/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub redis_url: Option<String>,
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_l1_cache_size")]
    pub l1_cache_size: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            ttl_secs: default_cache_ttl_secs(),
            l1_cache_size: default_l1_cache_size(),
        }
    }
}

fn default_cache_ttl_secs() -> u64 { 86_400 }
fn default_l1_cache_size() -> u64 { 10_000 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NormalizerSettings {
    #[serde(default)]
    pub mode: NormalizationMode,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchingSettings {
    #[serde(default)]
    pub min_score: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocatorConfig {
    #[serde(default = "default_max_distance_km")]
    pub max_distance_km: f64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            max_distance_km: default_max_distance_km(),
            request_timeout_ms: default_request_timeout_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_max_distance_km() -> f64 { 25.0 }
fn default_request_timeout_ms() -> u64 { 3000 }
fn default_retry_backoff_ms() -> u64 { 200 }
fn default_concurrency() -> usize { 8 }

impl LocatorConfig {
    pub fn to_settings(&self) -> LocatorSettings {
        LocatorSettings {
            max_distance_km: self.max_distance_km,
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            concurrency: self.concurrency,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregationSettings {
    #[serde(default = "default_max_recipes")]
    pub max_recipes: usize,
    #[serde(default = "default_max_stores")]
    pub max_stores: usize,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            max_recipes: default_max_recipes(),
            max_stores: default_max_stores(),
        }
    }
}

fn default_max_recipes() -> usize { 10 }
fn default_max_stores() -> usize { 5 }

impl AggregationSettings {
    pub fn to_limits(&self) -> AggregationLimits {
        AggregationLimits {
            max_recipes: self.max_recipes,
            max_stores: self.max_stores,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with PANTRY)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., PANTRY__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("PANTRY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        let settings: Self = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject source combinations the service cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.catalog.source {
            SourceKind::File => {}
            SourceKind::Postgres if self.database.url.is_none() => {
                return Err(ConfigError::Message(
                    "catalog.source = postgres requires database.url".into(),
                ));
            }
            SourceKind::Postgres => {}
            SourceKind::Http => {
                return Err(ConfigError::Message(
                    "catalog.source must be file or postgres, got http".into(),
                ));
            }
        }

        match self.store_directory.source {
            SourceKind::File => {}
            SourceKind::Http if self.store_directory.endpoint.is_none() => {
                return Err(ConfigError::Message(
                    "store_directory.source = http requires store_directory.endpoint".into(),
                ));
            }
            SourceKind::Http => {}
            SourceKind::Postgres => {
                return Err(ConfigError::Message(
                    "store_directory.source must be file or http, got postgres".into(),
                ));
            }
        }

        Ok(())
    }
}

/// Apply the well-known variables that do not follow the PANTRY__ scheme
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let database_url = env::var("DATABASE_URL").ok();
    let geocoder_endpoint = env::var("PANTRY_GEOCODER__ENDPOINT").ok();
    let redis_url = env::var("REDIS_URL").ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(url) = database_url {
        builder = builder.set_override("database.url", url)?;
    }
    if let Some(endpoint) = geocoder_endpoint {
        builder = builder.set_override("geocoder.endpoint", endpoint)?;
    }
    if let Some(url) = redis_url {
        builder = builder.set_override("cache.redis_url", url)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(catalog_source: &str, store_source: &str) -> Settings {
        let toml = format!(
            r#"
            [server]
            host = "127.0.0.1"
            port = 8080

            [catalog]
            source = "{}"
            path = "data/catalog.toml"

            [store_directory]
            source = "{}"
            path = "data/stores.toml"

            [geocoder]
            endpoint = "https://nominatim.openstreetmap.org"
            "#,
            catalog_source, store_source
        );

        Config::builder()
            .add_source(config::File::from_str(&toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_minimal_file_uses_defaults() {
        let settings = parse("file", "file");
        assert!(settings.validate().is_ok());

        assert_eq!(settings.catalog.source, SourceKind::File);
        assert_eq!(settings.normalizer.mode, NormalizationMode::Lenient);
        assert_eq!(settings.matching.min_score, 0.0);
        assert_eq!(settings.aggregation.to_limits(), AggregationLimits::default());
        assert_eq!(settings.locator.to_settings().request_timeout, Duration::from_millis(3000));
        assert_eq!(settings.store_directory.refresh_interval_secs, 900);
        assert!(settings.cache.redis_url.is_none());
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "compact");
    }

    #[test]
    fn test_unsupported_sources_rejected() {
        let err = parse("http", "file").validate().unwrap_err();
        assert!(err.to_string().contains("catalog.source"));

        let err = parse("file", "postgres").validate().unwrap_err();
        assert!(err.to_string().contains("store_directory.source"));
    }

    #[test]
    fn test_sources_require_their_connection_settings() {
        let err = parse("postgres", "file").validate().unwrap_err();
        assert!(err.to_string().contains("database.url"));

        let mut settings = parse("postgres", "http");
        settings.database.url = Some("postgres://localhost/pantry".into());
        assert!(settings.validate().unwrap_err().to_string().contains("store_directory.endpoint"));

        settings.store_directory.endpoint = Some("https://stores.example.com".into());
        assert!(settings.validate().is_ok());
    }
}

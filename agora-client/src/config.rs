//! Configuration loading for the Agora client.
//!
//! All fields are required unless explicitly marked optional. No defaults.

use agora_query::{CacheConfig, Freshness};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub auth: AuthConfig,
    pub cache: CacheSettings,
    pub pagination: PaginationConfig,
    pub upload: UploadConfig,
    pub membership: MembershipConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// A cached id token is refreshed once it is this close to expiry.
    pub token_refresh_margin_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSettings {
    /// Age after which a cached query is refetched on its next read.
    pub stale_time_ms: u64,
    pub gc_time_ms: u64,
    pub gc_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaginationConfig {
    pub feed_page_size: u32,
    pub users_page_size: u32,
    pub reports_page_size: u32,
    pub tags_page_size: u32,
    pub window_width: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MembershipConfig {
    pub price_usd: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or AGORA_CLIENT_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.api_base_url.trim();
        if base.is_empty() {
            return Err(invalid("api_base_url", "must not be empty"));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(invalid("api_base_url", "must start with http:// or https://"));
        }
        if self.request_timeout_ms == 0 {
            return Err(invalid("request_timeout_ms", "must be > 0"));
        }
        if self.cache.gc_time_ms == 0 {
            return Err(invalid("cache.gc_time_ms", "must be > 0"));
        }
        if self.cache.gc_interval_ms == 0 {
            return Err(invalid("cache.gc_interval_ms", "must be > 0"));
        }
        let sizes = [
            ("pagination.feed_page_size", self.pagination.feed_page_size),
            ("pagination.users_page_size", self.pagination.users_page_size),
            ("pagination.reports_page_size", self.pagination.reports_page_size),
            ("pagination.tags_page_size", self.pagination.tags_page_size),
        ];
        for (field, size) in sizes {
            if size == 0 {
                return Err(invalid(field, "must be > 0"));
            }
        }
        if self.pagination.window_width < 3 {
            return Err(invalid("pagination.window_width", "must be >= 3"));
        }
        if self.upload.endpoint.trim().is_empty() {
            return Err(invalid("upload.endpoint", "must not be empty"));
        }
        if self.upload.max_bytes == 0 {
            return Err(invalid("upload.max_bytes", "must be > 0"));
        }
        if self.membership.price_usd == 0 {
            return Err(invalid("membership.price_usd", "must be > 0"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn token_refresh_margin(&self) -> Duration {
        Duration::from_secs(self.auth.token_refresh_margin_secs)
    }

    pub fn gc_interval(&self) -> Duration {
        Duration::from_millis(self.cache.gc_interval_ms)
    }

    /// Settings for the query cache. A zero stale time means "valid until
    /// invalidated".
    pub fn cache_config(&self) -> CacheConfig {
        let freshness = match self.cache.stale_time_ms {
            0 => Freshness::consistent(),
            ms => Freshness::best_effort(Duration::from_millis(ms)),
        };
        CacheConfig::new()
            .with_freshness(freshness)
            .with_gc_time(Duration::from_millis(self.cache.gc_time_ms))
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("AGORA_CLIENT_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

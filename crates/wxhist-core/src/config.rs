use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;
use wxhist_form::FormRules;
use wxhist_weather::{HttpSettings, RetryPolicy, DEFAULT_ARCHIVE_URL, DEFAULT_GEOCODING_URL};

use crate::error::ConfigError;

/// Environment variable that overrides `geocoding.api_key`.
pub const API_KEY_ENV: &str = "LOCATIONIQ_API_KEY";

const MAX_STALE_MINUTES: u64 = 7 * 24 * 60;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors joined into one line
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub form: FormConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

/// LocationIQ settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub url: String,

    /// API key; `LOCATIONIQ_API_KEY` takes precedence when set
    pub api_key: Option<String>,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_GEOCODING_URL.to_string(),
            api_key: None,
        }
    }
}

impl GeocodingConfig {
    /// The key to send, from the environment or the config file.
    pub fn effective_api_key(&self) -> Option<String> {
        pick_api_key(std::env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }
}

fn pick_api_key(from_env: Option<String>, configured: Option<&str>) -> Option<String> {
    from_env
        .filter(|k| !k.trim().is_empty())
        .or_else(|| {
            configured
                .filter(|k| !k.trim().is_empty())
                .map(str::to_string)
        })
}

/// Open-Meteo archive settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub url: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ARCHIVE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Reject start dates before the archive's first year
    pub enforce_minimum_date: bool,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            enforce_minimum_date: FormRules::default().enforce_minimum_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let settings = HttpSettings::default();
        Self {
            timeout_secs: settings.timeout.as_secs(),
            max_retries: settings.retry.max_retries,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Minutes before a cached response is refetched
    pub stale_minutes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_minutes: wxhist_weather::cache::DEFAULT_STALE_MINUTES,
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config at {}, writing defaults", path.display());
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config = Self::parse(&contents)?;
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.geocoding.url, "geocoding.url", &mut result);
        validate_url(&self.archive.url, "archive.url", &mut result);

        if self.geocoding.effective_api_key().is_none() {
            result.add_warning(
                "geocoding.api_key",
                format!("No API key set (config or {API_KEY_ENV}); location search is unavailable"),
            );
        }

        if self.http.timeout_secs == 0 {
            result.add_error("http.timeout_secs", "Timeout must be greater than 0");
        } else if self.http.timeout_secs > 120 {
            result.add_warning("http.timeout_secs", "Timeout is unusually long (>120s)");
        }

        if self.http.max_retries > 10 {
            result.add_warning("http.max_retries", "More than 10 retries per request");
        }

        if self.cache.stale_minutes == 0 {
            result.add_warning("cache.stale_minutes", "Response caching disabled (0 minutes)");
        } else if self.cache.stale_minutes > MAX_STALE_MINUTES {
            result.add_warning(
                "cache.stale_minutes",
                "Cached responses are kept for more than a week",
            );
        }

        result
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.http.timeout_secs),
            retry: RetryPolicy::default().with_max_retries(self.http.max_retries),
        }
    }

    pub fn form_rules(&self) -> FormRules {
        FormRules {
            enforce_minimum_date: self.form.enforce_minimum_date,
        }
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.cache.stale_minutes.saturating_mul(60))
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("wxhist");

        Ok(config_dir.join("config.toml"))
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }

            if url.port() == Some(0) {
                result.add_error(field_name, "Port cannot be 0");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}

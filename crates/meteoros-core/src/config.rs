use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides `weather.api_key`.
pub const API_KEY_ENV: &str = "METEOROS_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY_HERE";
const DEFAULT_CITY: &str = "Moscow";

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

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the local key-value store
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// City shown before the user has searched for one
    #[serde(default = "default_city")]
    pub default_city: String,

    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherApiConfig {
    /// Provider base URL, without a trailing endpoint
    pub base_url: String,

    /// Provider API key (`METEOROS_API_KEY` takes precedence)
    pub api_key: String,
}

impl WeatherApiConfig {
    /// Check if a real key is configured (not the placeholder)
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && self.api_key != PLACEHOLDER_API_KEY
    }

    /// The API key, or `MissingSetting` when only the placeholder is present.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        if self.is_configured() {
            Ok(&self.api_key)
        } else {
            Err(ConfigError::MissingSetting("weather.api_key".to_string()))
        }
    }
}

impl Default for WeatherApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: PLACEHOLDER_API_KEY.to_string(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("meteoros")
}

fn default_city() -> String {
    DEFAULT_CITY.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_city: default_city(),
            weather: WeatherApiConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str::<Config>(&contents)
                .map_err(|e| ConfigError::ParseError(e.to_string()))
                .context("Failed to parse config file")?
        } else {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default config to {}", path.display());
            config
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                tracing::debug!("Using API key from {}", API_KEY_ENV);
                config.weather.api_key = key;
            }
        }

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails; warnings are logged.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);

        if !self.weather.is_configured() {
            result.add_warning(
                "weather.api_key",
                format!(
                    "API key not configured - set it in the config file or {}",
                    API_KEY_ENV
                ),
            );
        }

        if self.default_city.trim().is_empty() {
            result.add_error("default_city", "Default city must not be empty");
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
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
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    /// Path of the SQLite key-value file inside `data_dir`
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("meteoros.db")
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("meteoros");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn test_default_config_is_valid_with_key_warning() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
        assert!(result.warnings.iter().any(|w| w.field == "weather.api_key"));
        assert_eq!(config.default_city, "Moscow");
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = Config::default();
        config.weather.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.weather.base_url = "ftp://example.com/data".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_empty_default_city_is_error() {
        let mut config = Config::default();
        config.default_city = "  ".to_string();
        assert!(!config.validate().is_valid());
    }

    #[test]
    fn test_require_api_key() {
        let mut weather = WeatherApiConfig::default();
        assert!(matches!(
            weather.require_api_key(),
            Err(ConfigError::MissingSetting(_))
        ));

        weather.api_key = "abc123".to_string();
        assert_eq!(weather.require_api_key().unwrap(), "abc123");
    }

    #[test]
    fn test_load_from_creates_default_then_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = Config::load_from(&path).unwrap();
        assert!(path.exists());

        let mut edited = created.clone();
        edited.default_city = "London".to_string();
        edited.weather.base_url = "http://localhost:9000".to_string();
        edited.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.default_city, "London");
        assert_eq!(reloaded.weather.base_url, "http://localhost:9000");
    }

    #[test]
    fn test_missing_sections_fall_back_to_defaults() {
        let config: Config = toml::from_str("default_city = \"Paris\"").unwrap();
        assert_eq!(config.default_city, "Paris");
        assert_eq!(config.weather.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_city = [").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}

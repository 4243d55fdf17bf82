//! Configuration management for the `skycast` update loop
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::SkycastError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Unit system used when querying the forecast API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

/// Root configuration structure for the `skycast` application
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SkycastConfig {
    /// Forecast API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Update scheduling configuration
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Display hints for consumers
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Forecast API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Free-text place name, used when no location id is set
    #[serde(default)]
    pub location: String,
    /// Provider place id (woeid), preferred over the free-text location
    #[serde(default)]
    pub location_id: String,
    /// API credential; only consulted when the API reports it invalid
    #[serde(default)]
    pub app_id: Option<String>,
    /// Unit system for temperatures
    #[serde(default)]
    pub units: Units,
    /// Base URL for the forecast API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// API version path segment
    #[serde(default = "default_weather_api_version")]
    pub api_version: String,
    /// Forecast endpoint path
    #[serde(default = "default_weather_endpoint")]
    pub forecast_endpoint: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
}

/// Update scheduling settings, all in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Normal delay between successful updates
    #[serde(default = "default_update_interval")]
    pub update_interval_ms: u64,
    /// Delay before the very first fetch after startup
    #[serde(default = "default_initial_load_delay")]
    pub initial_load_delay_ms: u64,
    /// Shorter delay used after a transient failure
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Display hints consumed by renderers, not by the update loop itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Maximum number of forecast days a renderer should show
    #[serde(default = "default_max_days")]
    pub max_days: u32,
}

// Default value functions
fn default_weather_base_url() -> String {
    "https://query.yahooapis.com/".to_string()
}

fn default_weather_api_version() -> String {
    "v1".to_string()
}

fn default_weather_endpoint() -> String {
    "public/yql".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_update_interval() -> u64 {
    // every 10 minutes
    10 * 60 * 1000
}

fn default_initial_load_delay() -> u64 {
    2500
}

fn default_retry_delay() -> u64 {
    2500
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_max_days() -> u32 {
    7
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            location: String::new(),
            location_id: String::new(),
            app_id: None,
            units: Units::default(),
            base_url: default_weather_base_url(),
            api_version: default_weather_api_version(),
            forecast_endpoint: default_weather_endpoint(),
            timeout_seconds: default_weather_timeout(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: default_update_interval(),
            initial_load_delay_ms: default_initial_load_delay(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_days: default_max_days(),
        }
    }
}

impl ScheduleConfig {
    /// Normal update interval
    #[must_use]
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    /// Delay before the first fetch
    #[must_use]
    pub fn initial_load_delay(&self) -> Duration {
        Duration::from_millis(self.initial_load_delay_ms)
    }

    /// Delay before retrying a failed fetch
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl SkycastConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config/default.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Add environment variable overrides with SKYCAST_ prefix
        builder = builder.add_source(
            Environment::with_prefix("SKYCAST")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: SkycastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("skycast").join("config.toml"))
    }

    /// True when either a place name or a place id is configured
    #[must_use]
    pub fn has_location(&self) -> bool {
        !self.weather.location.is_empty() || !self.weather.location_id.is_empty()
    }

    /// Human-readable label for the configured place
    #[must_use]
    pub fn location_label(&self) -> String {
        if !self.weather.location.is_empty() {
            self.weather.location.clone()
        } else if !self.weather.location_id.is_empty() {
            format!("woeid {}", self.weather.location_id)
        } else {
            String::new()
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_schedule()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate scheduling delays
    fn validate_schedule(&self) -> Result<()> {
        if self.schedule.update_interval_ms == 0 {
            return Err(SkycastError::config("Update interval must be greater than zero").into());
        }

        if self.schedule.retry_delay_ms == 0 {
            return Err(SkycastError::config("Retry delay must be greater than zero").into());
        }

        if self.schedule.retry_delay_ms >= self.schedule.update_interval_ms {
            return Err(SkycastError::config(
                "Retry delay must be shorter than the update interval",
            )
            .into());
        }

        if self.weather.timeout_seconds > 300 {
            return Err(SkycastError::config("Request timeout cannot exceed 300 seconds").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(SkycastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(SkycastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.weather.base_url.starts_with("http://")
            && !self.weather.base_url.starts_with("https://")
        {
            return Err(SkycastError::config(
                "Forecast API base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        if let Some(app_id) = &self.weather.app_id {
            if app_id.is_empty() {
                return Err(SkycastError::config(
                    "API credential cannot be empty if provided. Either remove it or provide a valid one.",
                )
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SkycastConfig::default();
        assert_eq!(config.weather.base_url, "https://query.yahooapis.com/");
        assert_eq!(config.weather.api_version, "v1");
        assert_eq!(config.weather.forecast_endpoint, "public/yql");
        assert_eq!(config.weather.units, Units::Metric);
        assert_eq!(config.schedule.update_interval_ms, 600_000);
        assert_eq!(config.schedule.initial_load_delay_ms, 2500);
        assert_eq!(config.schedule.retry_delay_ms, 2500);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.display.max_days, 7);
        assert!(config.weather.app_id.is_none());
        assert!(!config.has_location());
    }

    #[test]
    fn test_default_config_validates() {
        let config = SkycastConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_location_label_prefers_place_name() {
        let mut config = SkycastConfig::default();
        config.weather.location = "Lisbon".to_string();
        config.weather.location_id = "742676".to_string();
        assert_eq!(config.location_label(), "Lisbon");
        assert!(config.has_location());
    }

    #[test]
    fn test_location_label_falls_back_to_id() {
        let mut config = SkycastConfig::default();
        config.weather.location_id = "742676".to_string();
        assert_eq!(config.location_label(), "woeid 742676");
        assert!(config.has_location());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = SkycastConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_retry_not_shorter_than_interval() {
        let mut config = SkycastConfig::default();
        config.schedule.update_interval_ms = 2000;
        config.schedule.retry_delay_ms = 2000;
        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("shorter than the update interval")
        );
    }

    #[test]
    fn test_config_validation_zero_interval() {
        let mut config = SkycastConfig::default();
        config.schedule.update_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_base_url() {
        let mut config = SkycastConfig::default();
        config.weather.base_url = "ftp://example.com/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_empty_app_id() {
        let mut config = SkycastConfig::default();
        config.weather.app_id = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_schedule_durations() {
        let config = SkycastConfig::default();
        assert_eq!(config.schedule.update_interval(), Duration::from_secs(600));
        assert_eq!(
            config.schedule.initial_load_delay(),
            Duration::from_millis(2500)
        );
        assert_eq!(config.schedule.retry_delay(), Duration::from_millis(2500));
    }

    #[test]
    fn test_config_path_generation() {
        let path = SkycastConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("skycast"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}

//! Configuration management for the City Walker planner
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::PlannerError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Distance provider configuration
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Planning algorithm settings
    #[serde(default)]
    pub planner: PlannerSettings,
}

/// Which distance provider backs the planner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Osrm,
    Google,
    /// Offline straight-line estimates
    Estimate,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ProviderKind::Osrm => "osrm",
            ProviderKind::Google => "google",
            ProviderKind::Estimate => "estimate",
        })
    }
}

/// Distance provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    /// Base URL override; each provider has its own default
    #[serde(default)]
    pub base_url: Option<String>,
    /// API key (required for google)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_routing_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_routing_max_retries")]
    pub max_retries: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Distance cache TTL in hours
    #[serde(default = "default_cache_ttl")]
    pub ttl_hours: u32,
    /// Keep distance cells in an on-disk store as well
    #[serde(default)]
    pub persistent: bool,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
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

/// Planning algorithm settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerSettings {
    /// Leader clustering radius in kilometers
    #[serde(default = "default_cluster_radius")]
    pub cluster_radius_km: f64,
    /// Days planned concurrently
    #[serde(default = "default_max_concurrent_days")]
    pub max_concurrent_days: usize,
    /// Deadline for a whole planning request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

// Default value functions
fn default_routing_timeout() -> u32 {
    30
}

fn default_routing_max_retries() -> u32 {
    3
}

fn default_cache_ttl() -> u32 {
    1
}

fn default_cache_location() -> String {
    "~/.cache/city-walker".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_cluster_radius() -> f64 {
    1.0
}

fn default_max_concurrent_days() -> usize {
    4
}

/// Upper bound for `planner.request_timeout_seconds`
pub const MAX_REQUEST_TIMEOUT_SECONDS: u64 = 3600;

fn default_request_timeout() -> u64 {
    60
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: None,
            api_key: None,
            timeout_seconds: default_routing_timeout(),
            max_retries: default_routing_max_retries(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_cache_ttl(),
            persistent: false,
            location: default_cache_location(),
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

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            cluster_radius_km: default_cluster_radius(),
            max_concurrent_days: default_max_concurrent_days(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl RoutingConfig {
    /// Configured base URL, or the provider's public endpoint
    #[must_use]
    pub fn effective_base_url(&self) -> String {
        match &self.base_url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => match self.provider {
                ProviderKind::Osrm => crate::routing::osrm::DEFAULT_OSRM_URL.to_string(),
                ProviderKind::Google => crate::routing::google::DEFAULT_GOOGLE_URL.to_string(),
                ProviderKind::Estimate => String::new(),
            },
        }
    }
}

impl CacheConfig {
    /// Cache location with a leading `~` expanded to the home directory
    #[must_use]
    pub fn resolved_location(&self) -> PathBuf {
        match self.location.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(&self.location)),
            None => PathBuf::from(&self.location),
        }
    }
}

impl PlannerSettings {
    /// Deadline for one planning request, capped at [`MAX_REQUEST_TIMEOUT_SECONDS`]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.min(MAX_REQUEST_TIMEOUT_SECONDS))
    }
}

impl PlannerConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // CITYWALKER__ROUTING__API_KEY -> routing.api_key
        builder = builder.add_source(
            Environment::with_prefix("CITYWALKER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: PlannerConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("city-walker").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.routing.timeout_seconds == 0 {
            self.routing.timeout_seconds = default_routing_timeout();
        }
        if self.cache.ttl_hours == 0 {
            self.cache.ttl_hours = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.planner.max_concurrent_days == 0 {
            self.planner.max_concurrent_days = default_max_concurrent_days();
        }
        if self.planner.request_timeout_seconds == 0 {
            self.planner.request_timeout_seconds = default_request_timeout();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        match (&self.routing.provider, &self.routing.api_key) {
            (ProviderKind::Google, None) => {
                return Err(PlannerError::config(
                    "The google distance provider requires routing.api_key",
                )
                .into());
            }
            (_, Some(api_key)) if api_key.trim().is_empty() => {
                return Err(PlannerError::config(
                    "Routing API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }
            (_, Some(api_key)) if api_key.len() < 8 => {
                return Err(PlannerError::config(
                    "Routing API key appears to be invalid (too short). Please check your API key.",
                )
                .into());
            }
            _ => {}
        }
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.routing.timeout_seconds > 300 {
            return Err(PlannerError::config("Routing timeout cannot exceed 300 seconds").into());
        }

        if self.routing.max_retries > 10 {
            return Err(PlannerError::config("Routing max retries cannot exceed 10").into());
        }

        if self.cache.ttl_hours > 168 {
            return Err(PlannerError::config("Cache TTL cannot exceed 168 hours (1 week)").into());
        }

        let radius = self.planner.cluster_radius_km;
        if !(radius > 0.0 && radius <= 50.0) {
            return Err(PlannerError::config(format!(
                "Cluster radius must be within (0, 50] km, got {radius}"
            ))
            .into());
        }

        if !(1..=32).contains(&self.planner.max_concurrent_days) {
            return Err(PlannerError::config(
                "Concurrent days must be between 1 and 32",
            )
            .into());
        }

        if self.planner.request_timeout_seconds > MAX_REQUEST_TIMEOUT_SECONDS {
            return Err(PlannerError::config(format!(
                "Request timeout cannot exceed {MAX_REQUEST_TIMEOUT_SECONDS} seconds"
            ))
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(PlannerError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(PlannerError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if let Some(url) = &self.routing.base_url
            && !url.starts_with("http://")
            && !url.starts_with("https://")
        {
            return Err(PlannerError::config(
                "Routing base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }
}

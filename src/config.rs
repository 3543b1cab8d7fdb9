//! Configuration management for the `SafeRoute` pipeline
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings. All
//! provider credentials and base URLs live here and are passed
//! explicitly into each component at construction; there is no
//! process-global credential state.

use crate::SafeRouteError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the `SafeRoute` pipeline
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SafeRouteConfig {
    /// Provider endpoints and credentials
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Segment scoring configuration
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Map rendering configuration
    #[serde(default)]
    pub render: RenderConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Default pipeline settings
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Provider endpoints, credentials, and retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Geoapify API key, used by geocoding and routing
    pub geoapify_api_key: Option<String>,
    /// Geocoding endpoint
    #[serde(default = "default_geocode_url")]
    pub geocode_url: String,
    /// Routing endpoint
    #[serde(default = "default_routing_url")]
    pub routing_url: String,
    /// Overpass interpreter endpoint
    #[serde(default = "default_overpass_url")]
    pub overpass_url: String,
    /// Places (foot-traffic) API base URL
    #[serde(default = "default_places_url")]
    pub places_url: String,
    /// Places API key
    pub places_api_key: Option<String>,
    /// Risk-inference endpoint
    #[serde(default = "default_inference_url")]
    pub inference_url: String,
    /// Risk-inference API key
    pub inference_api_key: Option<String>,
    /// Request timeout in seconds, applied per call
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Maximum attempts for retryable calls (geocoding, inference)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed delay between retry attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// Segment scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Scoring strategy: "heuristic" (POI counting) or "inference"
    /// (external risk classification)
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// POI search radius around each segment, in meters
    #[serde(default = "default_radius_meters")]
    pub radius_meters: u32,
    /// Numeric weight for a low-risk classification
    #[serde(default)]
    pub weight_low: u32,
    /// Numeric weight for a medium-risk classification
    #[serde(default = "default_weight_medium")]
    pub weight_medium: u32,
    /// Numeric weight for a high-risk classification
    #[serde(default = "default_weight_high")]
    pub weight_high: u32,
}

/// Map rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Directory the map artifact is written to, created on demand
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Default pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Country codes the geocoder biases toward when no explicit
    /// country filter is supplied
    #[serde(default = "default_region_bias")]
    pub region_bias: Vec<String>,
    /// Travel mode passed to the routing provider
    #[serde(default = "default_travel_mode")]
    pub travel_mode: String,
    /// Geocoder fuzzy-match factor
    #[serde(default = "default_fuzziness")]
    pub fuzziness: f64,
}

// Default value functions
fn default_geocode_url() -> String {
    "https://api.geoapify.com/v1/geocode/search".to_string()
}

fn default_routing_url() -> String {
    "https://api.geoapify.com/v1/routing".to_string()
}

fn default_overpass_url() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}

fn default_places_url() -> String {
    "https://api.safegraph.com/v1".to_string()
}

fn default_inference_url() -> String {
    "https://api.gemini.com/analyze".to_string()
}

fn default_timeout() -> u32 {
    15
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_strategy() -> String {
    "heuristic".to_string()
}

fn default_radius_meters() -> u32 {
    500
}

fn default_weight_medium() -> u32 {
    1
}

fn default_weight_high() -> u32 {
    2
}

fn default_output_dir() -> String {
    "safety_routes".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_region_bias() -> Vec<String> {
    // South Asian country codes, the original deployment target
    ["in", "pk", "bd", "np", "lk", "bt", "mv", "af"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_travel_mode() -> String {
    "drive".to_string()
}

fn default_fuzziness() -> f64 {
    0.8
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            geoapify_api_key: None,
            geocode_url: default_geocode_url(),
            routing_url: default_routing_url(),
            overpass_url: default_overpass_url(),
            places_url: default_places_url(),
            places_api_key: None,
            inference_url: default_inference_url(),
            inference_api_key: None,
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            radius_meters: default_radius_meters(),
            weight_low: 0,
            weight_medium: default_weight_medium(),
            weight_high: default_weight_high(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            region_bias: default_region_bias(),
            travel_mode: default_travel_mode(),
            fuzziness: default_fuzziness(),
        }
    }
}

impl SafeRouteConfig {
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

        // Add environment variable overrides with SAFEROUTE_ prefix
        builder = builder.add_source(
            Environment::with_prefix("SAFEROUTE")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: SafeRouteConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("saferoute").join("config.toml"))
    }

    /// Request timeout as a [`Duration`]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.provider.timeout_seconds))
    }

    /// Fixed retry delay as a [`Duration`]
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.provider.retry_delay_ms)
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
        let api_key = self.provider.geoapify_api_key.as_deref().ok_or_else(|| {
            SafeRouteError::config(
                "Missing Geoapify API key. Set provider.geoapify_api_key or SAFEROUTE_PROVIDER__GEOAPIFY_API_KEY.",
            )
        })?;

        if api_key.len() < 32 {
            return Err(SafeRouteError::config(
                "Geoapify API key appears to be invalid (too short). Please check your API key.",
            )
            .into());
        }

        if let Some(inference_key) = &self.provider.inference_api_key {
            if inference_key.is_empty() {
                return Err(SafeRouteError::config(
                    "Inference API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if !(5..=60).contains(&self.provider.timeout_seconds) {
            return Err(SafeRouteError::config(
                "Provider timeout must be between 5 and 60 seconds",
            )
            .into());
        }

        if self.provider.max_retries == 0 || self.provider.max_retries > 10 {
            return Err(
                SafeRouteError::config("Provider max retries must be between 1 and 10").into(),
            );
        }

        if self.scoring.radius_meters == 0 || self.scoring.radius_meters > 5000 {
            return Err(
                SafeRouteError::config("POI search radius must be between 1 and 5000 meters")
                    .into(),
            );
        }

        if !(0.0..=1.0).contains(&self.defaults.fuzziness) {
            return Err(
                SafeRouteError::config("Geocoder fuzziness must be between 0.0 and 1.0").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_strategies = ["heuristic", "inference"];
        if !valid_strategies.contains(&self.scoring.strategy.as_str()) {
            return Err(SafeRouteError::config(format!(
                "Invalid scoring strategy '{}'. Must be one of: {}",
                self.scoring.strategy,
                valid_strategies.join(", ")
            ))
            .into());
        }

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(SafeRouteError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("geocode_url", &self.provider.geocode_url),
            ("routing_url", &self.provider.routing_url),
            ("overpass_url", &self.provider.overpass_url),
            ("places_url", &self.provider.places_url),
            ("inference_url", &self.provider.inference_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(SafeRouteError::config(format!(
                    "Provider {name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        for code in &self.defaults.region_bias {
            if code.len() != 2 || !code.chars().all(|c| c.is_ascii_lowercase()) {
                return Err(SafeRouteError::config(format!(
                    "Invalid region bias entry '{code}'. Use lowercase ISO 3166-1 alpha-2 codes."
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key() -> SafeRouteConfig {
        let mut config = SafeRouteConfig::default();
        config.provider.geoapify_api_key = Some("a".repeat(32));
        config
    }

    #[test]
    fn test_default_config() {
        let config = SafeRouteConfig::default();
        assert_eq!(
            config.provider.geocode_url,
            "https://api.geoapify.com/v1/geocode/search"
        );
        assert_eq!(config.provider.timeout_seconds, 15);
        assert_eq!(config.provider.max_retries, 3);
        assert_eq!(config.scoring.strategy, "heuristic");
        assert_eq!(config.scoring.radius_meters, 500);
        assert_eq!(config.render.output_dir, "safety_routes");
        assert_eq!(config.defaults.region_bias[0], "in");
        assert!(config.provider.geoapify_api_key.is_none());
    }

    #[test]
    fn test_config_validation_missing_api_key() {
        let config = SafeRouteConfig::default();
        let result = config.validate_api_keys();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Missing Geoapify API key")
        );
    }

    #[test]
    fn test_config_validation_short_api_key() {
        let mut config = SafeRouteConfig::default();
        config.provider.geoapify_api_key = Some("too_short".to_string());
        let result = config.validate_api_keys();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("too short"));
    }

    #[test]
    fn test_config_validation_valid_api_key() {
        let config = config_with_key();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_strategy() {
        let mut config = config_with_key();
        config.scoring.strategy = "oracle".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid scoring strategy")
        );
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = config_with_key();
        config.provider.timeout_seconds = 300; // Too high
        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("timeout must be between")
        );
    }

    #[test]
    fn test_config_validation_region_bias_codes() {
        let mut config = config_with_key();
        config.defaults.region_bias = vec!["india".to_string()];
        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid region bias entry")
        );
    }

    #[test]
    fn test_config_path_generation() {
        let path = SafeRouteConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("saferoute"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_duration_helpers() {
        let config = SafeRouteConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.retry_delay(), Duration::from_millis(1000));
    }
}

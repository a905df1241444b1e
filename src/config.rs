//! Configuration module for loading and parsing TOML configuration files.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse TOML configuration.
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// Invalid configuration value.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Upstream market-data gateway configuration.
    pub provider: ProviderConfig,
    /// Analytics tuning values.
    pub analytics: AnalyticsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port number to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Upstream market-data gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Gateway base URL.
    pub base_url: String,
    /// Bearer API key; may be empty for unauthenticated gateways.
    pub api_key: String,
    /// Dataset code for equity symbols.
    pub equity_dataset: String,
    /// Dataset code for listed-option symbols.
    pub options_dataset: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9100".to_string(),
            api_key: String::new(),
            equity_dataset: "XNAS.ITCH".to_string(),
            options_dataset: "OPRA.PILLAR".to_string(),
        }
    }
}

/// Analytics tuning values.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    /// Annualized risk-free rate used for implied volatility.
    pub risk_free_rate: f64,
    /// Target axis ratio for the high-frequency quote chart.
    pub quote_chart_ratio_target: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.04,
            quote_chart_ratio_target: 0.7,
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file.
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Arguments
    /// * `content` - TOML content as string.
    ///
    /// # Errors
    /// Returns error if content cannot be parsed.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.base_url.is_empty() {
            return Err(ConfigError::InvalidValue(
                "provider base_url cannot be empty".to_string(),
            ));
        }
        if self.provider.equity_dataset.is_empty() {
            return Err(ConfigError::InvalidValue(
                "provider equity_dataset cannot be empty".to_string(),
            ));
        }
        if self.provider.options_dataset.is_empty() {
            return Err(ConfigError::InvalidValue(
                "provider options_dataset cannot be empty".to_string(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.analytics.risk_free_rate) {
            return Err(ConfigError::InvalidValue(
                "analytics risk_free_rate must be between -1 and 1".to_string(),
            ));
        }
        if self.analytics.quote_chart_ratio_target <= 0.0
            || self.analytics.quote_chart_ratio_target >= 1.0
        {
            return Err(ConfigError::InvalidValue(
                "analytics quote_chart_ratio_target must be between 0 and 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            provider: ProviderConfig::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

//! Application configuration
//!
//! Loaded in layers with the `config` crate:
//! 1. struct defaults
//! 2. optional `cycle-tracker.{toml,json,yaml}` in the working directory
//! 3. environment variables prefixed `CYCLE_TRACKER`, nested with `__`
//!    (e.g. `CYCLE_TRACKER__PREDICTION__STRATEGY=last_cycle`)
//!
//! A `.env` file is read first when present.

use crate::predictor::{CyclePredictor, PredictionStrategy, RoundingMode};
use serde::Deserialize;
use std::net::SocketAddr;
use thiserror::Error;

/// Env var consulted for the tracing filter before `log_level`
pub const LOG_ENV: &str = "CYCLE_TRACKER_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid socket address: {0}")]
    InvalidAddress(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub strategy: PredictionStrategy,
    pub rounding: RoundingMode,
}

impl PredictionConfig {
    /// Apply the configured policies to a predictor
    pub fn apply(&self, predictor: CyclePredictor) -> CyclePredictor {
        predictor
            .with_strategy(self.strategy)
            .with_rounding(self.rounding)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::InvalidAddress(addr))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub prediction: PredictionConfig,
    pub server: ServerConfig,
    /// Tracing filter directive, used when `CYCLE_TRACKER_LOG` is unset
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            prediction: PredictionConfig::default(),
            server: ServerConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("cycle-tracker").required(false))
            .add_source(
                config::Environment::with_prefix("CYCLE_TRACKER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        self.server.socket_addr()?;
        Ok(())
    }
}

/// Install the global fmt subscriber
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

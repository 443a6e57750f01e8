//! Server configuration.
//!
//! Defaults are overridden by a JSON file named in `ORBIT_CONFIG`, then by
//! `ORBIT_ADDR`. Log filtering goes through `RUST_LOG`.

use std::{net::SocketAddr, path::Path, time::Duration};

use orbit_core::{SimulationConfig, SimulationError};
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "ORBIT_CONFIG";
pub const ADDR_ENV: &str = "ORBIT_ADDR";

/// About 60 broadcasts per second.
pub const DEFAULT_BROADCAST_PERIOD_MS: u64 = 16;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid listen address {0:?}")]
    InvalidAddr(String),

    #[error("broadcast_period_ms must be > 0")]
    ZeroPeriod,

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Wall-clock interval between ticks, decoupled from the simulated `dt`.
    pub broadcast_period_ms: u64,
    pub simulation: SimulationConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            broadcast_period_ms: DEFAULT_BROADCAST_PERIOD_MS,
            simulation: SimulationConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        if let Ok(addr) = std::env::var(ADDR_ENV) {
            config.addr = addr.parse().map_err(|_| ConfigError::InvalidAddr(addr))?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broadcast_period_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        self.simulation.validate()?;
        Ok(())
    }

    pub fn broadcast_period(&self) -> Duration {
        Duration::from_millis(self.broadcast_period_ms)
    }
}

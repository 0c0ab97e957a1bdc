//! Ledger configuration.

use powchain_consensus::MAX_TARGET;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("batch size must be at least 1")]
    ZeroBatchSize,

    #[error("target {0} is unreachable (maximum is 64)")]
    UnreachableTarget(u32),

    #[error("pool capacity {capacity} is smaller than batch size {batch_size}")]
    PoolTooSmall { capacity: usize, batch_size: usize },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Header version written into mined blocks.
    pub version: u32,
    /// Transactions per block (Merkle capacity).
    pub batch_size: usize,
    /// Required leading zero bits in word 0 of a block hash.
    pub target: u32,
    /// Maximum number of pending transactions.
    pub pool_capacity: usize,
    /// Seed for deterministic demo wallets.
    pub rng_seed: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            version: 0,
            batch_size: 5,
            target: 5,
            pool_capacity: 10_000,
            rng_seed: "powchain".to_string(),
        }
    }
}

impl ChainConfig {
    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.target > MAX_TARGET {
            return Err(ConfigError::UnreachableTarget(self.target));
        }
        if self.pool_capacity < self.batch_size {
            return Err(ConfigError::PoolTooSmall {
                capacity: self.pool_capacity,
                batch_size: self.batch_size,
            });
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

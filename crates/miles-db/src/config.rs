//! Ledger configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::str::FromStr;

use miles_core::expiry::DEFAULT_EXPIRY_HORIZON_DAYS;
use miles_core::redemption::{DEFAULT_MINIMUM_MILES, DEFAULT_STEP_MILES};
use miles_core::validation::validate_horizon_days;
use miles_core::RedemptionPolicy;
use serde::{Deserialize, Serialize};

use crate::pool::DbConfig;

/// Miles ledger configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilesConfig {
    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub max_connections: u32,

    /// Redemption rules applied at checkout
    pub redemption: RedemptionPolicy,

    /// Look-ahead window for the expiring-soon summary
    pub expiry_horizon_days: i64,
}

impl Default for MilesConfig {
    fn default() -> Self {
        MilesConfig {
            database_path: "./miles_dev.db".to_string(),
            max_connections: 5,
            redemption: RedemptionPolicy::default(),
            expiry_horizon_days: DEFAULT_EXPIRY_HORIZON_DAYS,
        }
    }
}

impl MilesConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                    | Default          |
    /// |-----------------------------|------------------|
    /// | `MILES_DB_PATH`             | `./miles_dev.db` |
    /// | `MILES_DB_MAX_CONNECTIONS`  | `5`              |
    /// | `MILES_REDEEM_MINIMUM`      | `100`            |
    /// | `MILES_REDEEM_STEP`         | `100`            |
    /// | `MILES_EXPIRY_HORIZON_DAYS` | `90`             |
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup. `load` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = MilesConfig {
            database_path: lookup("MILES_DB_PATH").unwrap_or_else(|| "./miles_dev.db".to_string()),

            max_connections: parse_var(&lookup, "MILES_DB_MAX_CONNECTIONS", 5)?,

            redemption: RedemptionPolicy {
                minimum_miles: parse_var(&lookup, "MILES_REDEEM_MINIMUM", DEFAULT_MINIMUM_MILES)?,
                step_miles: parse_var(&lookup, "MILES_REDEEM_STEP", DEFAULT_STEP_MILES)?,
            },

            expiry_horizon_days: parse_var(
                &lookup,
                "MILES_EXPIRY_HORIZON_DAYS",
                DEFAULT_EXPIRY_HORIZON_DAYS,
            )?,
        };

        if config.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("MILES_DB_PATH".to_string()));
        }
        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("MILES_DB_MAX_CONNECTIONS".to_string()));
        }
        if config.redemption.minimum_miles < 1 {
            return Err(ConfigError::InvalidValue("MILES_REDEEM_MINIMUM".to_string()));
        }
        if config.redemption.step_miles < 1 {
            return Err(ConfigError::InvalidValue("MILES_REDEEM_STEP".to_string()));
        }
        validate_horizon_days(config.expiry_horizon_days)
            .map_err(|_| ConfigError::InvalidValue("MILES_EXPIRY_HORIZON_DAYS".to_string()))?;

        Ok(config)
    }

    /// Pool settings for this config.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

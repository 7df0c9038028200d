//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                          | Default                    |
//! |-----------------------------------|----------------------------|
//! | `VASTRA_BIND`                     | `0.0.0.0:3001`             |
//! | `VASTRA_DB_PATH`                  | `data/kalan_vastralya.db`  |
//! | `VASTRA_DB_MAX_CONNECTIONS`       | `5`                        |
//! | `VASTRA_ALLOW_NEGATIVE_STOCK`     | `false`                    |
//! | `VASTRA_MAX_UPLOAD_BYTES`         | `10485760` (10 MiB)        |
//! | `VASTRA_TIMEZONE_OFFSET_MINUTES`  | `330` (IST)                |

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use vastra_core::StockPolicy;
use vastra_db::{DbConfig, ShopClock};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind: SocketAddr,

    /// SQLite database file
    pub db_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// Let sales take stock below zero
    pub allow_negative_stock: bool,

    /// Largest accepted request body (spreadsheet uploads)
    pub max_upload_bytes: usize,

    /// Shop clock, minutes east of UTC
    pub timezone_offset_minutes: i32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ServerConfig {
            bind: parse_or(&lookup, "VASTRA_BIND", "0.0.0.0:3001")?,

            db_path: lookup("VASTRA_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/kalan_vastralya.db")),

            db_max_connections: parse_or(&lookup, "VASTRA_DB_MAX_CONNECTIONS", "5")?,

            allow_negative_stock: parse_or(&lookup, "VASTRA_ALLOW_NEGATIVE_STOCK", "false")?,

            max_upload_bytes: parse_or(&lookup, "VASTRA_MAX_UPLOAD_BYTES", "10485760")?,

            timezone_offset_minutes: parse_or(&lookup, "VASTRA_TIMEZONE_OFFSET_MINUTES", "330")?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("VASTRA_DB_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    /// The shop clock for the configured offset.
    pub fn clock(&self) -> Result<ShopClock, ConfigError> {
        ShopClock::from_offset_minutes(self.timezone_offset_minutes)
            .ok_or_else(|| ConfigError::InvalidValue("VASTRA_TIMEZONE_OFFSET_MINUTES".to_string()))
    }

    pub fn stock_policy(&self) -> StockPolicy {
        if self.allow_negative_stock {
            StockPolicy::AllowNegative
        } else {
            StockPolicy::Enforce
        }
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> Result<DbConfig, ConfigError> {
        Ok(DbConfig::new(&self.db_path)
            .max_connections(self.db_max_connections)
            .stock_policy(self.stock_policy())
            .utc_offset(self.clock()?.offset()))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

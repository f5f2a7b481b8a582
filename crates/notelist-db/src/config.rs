//! Database configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | `postgres://localhost/notelist` |
//! | `DATABASE_MAX_CONNECTIONS` | [`DEFAULT_MAX_CONNECTIONS`](crate::pool::DEFAULT_MAX_CONNECTIONS) |
//! | `DATABASE_MIN_CONNECTIONS` | `1` |
//! | `DATABASE_CONNECT_TIMEOUT_SECS` | [`DEFAULT_CONNECT_TIMEOUT_SECS`](crate::pool::DEFAULT_CONNECT_TIMEOUT_SECS) |
//! | `DATABASE_IDLE_TIMEOUT_SECS` | [`DEFAULT_IDLE_TIMEOUT_SECS`](crate::pool::DEFAULT_IDLE_TIMEOUT_SECS) |

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;
use tracing::debug;

use notelist_core::{Error, Result};

use crate::pool::{parse_database_url, PoolConfig};

/// Connection string used when `DATABASE_URL` is unset.
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/notelist";

/// Everything needed to open a [`Database`](crate::Database).
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub pool: PoolConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            pool: PoolConfig::default(),
        }
    }
}

impl DatabaseConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = PoolConfig::default();

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let pool = PoolConfig {
            max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(defaults.max_connections),
            min_connections: parse_var(&lookup, "DATABASE_MIN_CONNECTIONS")?
                .unwrap_or(defaults.min_connections),
            connect_timeout: parse_var(&lookup, "DATABASE_CONNECT_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            idle_timeout: parse_var(&lookup, "DATABASE_IDLE_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_timeout),
            max_lifetime: defaults.max_lifetime,
        };

        if pool.min_connections > pool.max_connections {
            return Err(Error::Config(format!(
                "DATABASE_MIN_CONNECTIONS ({}) exceeds DATABASE_MAX_CONNECTIONS ({})",
                pool.min_connections, pool.max_connections
            )));
        }

        debug!(
            subsystem = "database",
            component = "config",
            max_connections = pool.max_connections,
            min_connections = pool.min_connections,
            "Loaded database configuration"
        );

        Ok(Self { database_url, pool })
    }

    /// Parsed connection options for `database_url`.
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        parse_database_url(&self.database_url)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {raw:?}"))),
    }
}

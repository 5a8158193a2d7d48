//! Record store selection.
//!
//! - `STORE_BACKEND`: `memory` (default) or `postgres`
//! - `DATABASE_URL`: required for `postgres`
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default 10)
//! - `STORE_TIMEOUT_MS`: bound on every repository store call (default 10000)

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::{env_lookup, parse_or};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Postgres => f.write_str("postgres"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: None,
            max_connections: 10,
            timeout: Duration::from_secs(10),
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<L: Fn(&str) -> Option<String>>(lookup: L) -> Self {
        let defaults = Self::default();
        let timeout_ms = parse_or(
            &lookup,
            "STORE_TIMEOUT_MS",
            defaults.timeout.as_millis() as u64,
        );

        Self {
            backend: parse_or(&lookup, "STORE_BACKEND", defaults.backend),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                defaults.max_connections,
            ),
            timeout: Duration::from_millis(timeout_ms.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_memory() {
        let config = StoreConfig::from_lookup(|_| None);
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_postgres_backend() {
        let config = StoreConfig::from_lookup(|key| match key {
            "STORE_BACKEND" => Some("Postgres".into()),
            "DATABASE_URL" => Some("postgres://localhost/admitdesk".into()),
            "STORE_TIMEOUT_MS" => Some("2500".into()),
            _ => None,
        });
        assert_eq!(config.backend, StoreBackend::Postgres);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/admitdesk")
        );
        assert_eq!(config.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_unknown_backend_falls_back() {
        let config = StoreConfig::from_lookup(|key| (key == "STORE_BACKEND").then(|| "redis".into()));
        assert_eq!(config.backend, StoreBackend::Memory);
    }
}

//! # admitdesk Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`cors`]: allowed browser origins
//! - [`server`]: listen address
//! - [`store`]: record store backend and operation timeout
//! - [`upload`]: attachment storage directory and size limit
//!
//! Every struct has a `from_env()` constructor and a `Default` matching the
//! documented fallbacks. Unparseable values fall back to the default with a
//! warning.
//!
//! # Example
//!
//! ```ignore
//! use admitdesk_config::{ServerConfig, StoreConfig};
//!
//! let server = ServerConfig::from_env();
//! let store = StoreConfig::from_env();
//! ```

pub mod cors;
pub mod server;
pub mod store;
pub mod upload;

use std::str::FromStr;

pub use cors::CorsConfig;
pub use server::ServerConfig;
pub use store::{StoreBackend, StoreConfig};
pub use upload::UploadConfig;

/// Reads `key` through `lookup` and parses it, falling back to `default`.
pub(crate) fn parse_or<T, L>(lookup: &L, key: &str, default: T) -> T
where
    T: FromStr,
    L: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid configuration value, using default");
            default
        }),
        None => default,
    }
}

pub(crate) fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

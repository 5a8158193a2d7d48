use std::path::PathBuf;

use crate::{env_lookup, parse_or};

/// Where uploaded admission documents are written and how they are addressed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadConfig {
    /// `UPLOAD_DIR`, default `./uploads`.
    pub dir: PathBuf,
    /// `UPLOAD_BASE_URL`, default `/files`.
    pub base_url: String,
    /// `UPLOAD_MAX_BYTES`, default 5 MiB.
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./uploads"),
            base_url: "/files".to_string(),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

impl UploadConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<L: Fn(&str) -> Option<String>>(lookup: L) -> Self {
        let defaults = Self::default();
        Self {
            dir: lookup("UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.dir),
            base_url: lookup("UPLOAD_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            max_bytes: parse_or(&lookup, "UPLOAD_MAX_BYTES", defaults.max_bytes),
        }
    }
}

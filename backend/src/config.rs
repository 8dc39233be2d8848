//! Runtime configuration.
//!
//! Values come from the environment (a `.env` file is loaded by the binary
//! via dotenvy) and can be overridden by command-line flags.

use std::path::PathBuf;
use tracing::warn;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Largest accepted upload body.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Bearer token accepted when `API_TOKEN` is unset.
pub const DEFAULT_API_TOKEN: &str = "dev-token";

pub const ENV_PORT: &str = "PORT";
pub const ENV_DATA_DIR: &str = "STOCKCHECK_DATA_DIR";
pub const ENV_MAX_UPLOAD_BYTES: &str = "STOCKCHECK_MAX_UPLOAD_BYTES";
pub const ENV_API_TOKEN: &str = "API_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// Where uploads are persisted. `None` keeps them in memory.
    pub data_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
    /// Token every `/api` request must present as `Authorization: Bearer <token>`.
    pub api_token: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            api_token: DEFAULT_API_TOKEN.to_string(),
        }
    }
}

impl AppConfig {
    /// Read the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable numbers fall back to
    /// the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            port: parse_or(&lookup, ENV_PORT, defaults.port),
            data_dir: lookup(ENV_DATA_DIR)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            max_upload_bytes: parse_or(&lookup, ENV_MAX_UPLOAD_BYTES, defaults.max_upload_bytes),
            api_token: lookup(ENV_API_TOKEN)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.api_token),
        }
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, port: Option<u16>, data_dir: Option<PathBuf>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        if data_dir.is_some() {
            self.data_dir = data_dir;
        }
        self
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, fallback = %default, "invalid configuration value");
            default
        }),
        None => default,
    }
}

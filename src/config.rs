//! Configuration Module
//!
//! Handles loading and managing configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::transient::{DEFAULT_NETWORK_NO_TIMEOUT, DEFAULT_SWEEP_GRACE};

/// Store and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the JSON option table
    pub db_path: PathBuf,
    /// HTTP server port
    pub server_port: u16,
    /// Background sweep interval in seconds
    pub sweep_interval: u64,
    /// Seconds an entry must be expired before the sweep reclaims it
    pub sweep_grace: i64,
    /// Network keys that never expire
    pub network_no_timeout: Vec<String>,
    /// Let the sweep remove timeout records whose value record is gone
    pub purge_orphaned_timeouts: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DB_PATH` - Option table file (default: transients.json)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds (default: 300)
    /// - `SWEEP_GRACE` - Sweep grace window in seconds (default: 60)
    /// - `NETWORK_NO_TIMEOUT` - Comma separated never-expiring network keys
    /// - `PURGE_ORPHANED_TIMEOUTS` - `true`/`1` to purge orphans (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: env::var("DB_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            sweep_interval: env::var("SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&secs| secs > 0)
                .unwrap_or(defaults.sweep_interval),
            sweep_grace: env::var("SWEEP_GRACE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&secs| secs >= 0)
                .unwrap_or(defaults.sweep_grace),
            network_no_timeout: env::var("NETWORK_NO_TIMEOUT")
                .ok()
                .map(|v| parse_key_list(&v))
                .unwrap_or(defaults.network_no_timeout),
            purge_orphaned_timeouts: env::var("PURGE_ORPHANED_TIMEOUTS")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.purge_orphaned_timeouts),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("transients.json"),
            server_port: 3000,
            sweep_interval: 300,
            sweep_grace: DEFAULT_SWEEP_GRACE,
            network_no_timeout: DEFAULT_NETWORK_NO_TIMEOUT
                .iter()
                .map(|key| key.to_string())
                .collect(),
            purge_orphaned_timeouts: false,
        }
    }
}

fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

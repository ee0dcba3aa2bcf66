//! Server configuration schema.
//!
//! This module defines the configuration file read by the `tube` binary.
//! All types derive Serde traits for deserialization from TOML.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::observability::LogLevel;

/// Root configuration for the server binary.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, timeouts).
    pub listener: ListenerConfig,

    /// Logging settings.
    pub logging: LoggingConfig,

    /// Metrics exporter settings.
    pub metrics: MetricsConfig,

    /// Directory mounts.
    pub static_dirs: Vec<StaticDirConfig>,

    /// Single file routes.
    pub static_files: Vec<StaticFileConfig>,

    /// Empty the caches when files below a static directory change.
    pub watch: bool,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Subscriber filter directive, used when `RUST_LOG` is unset.
    pub filter: String,

    /// Router verbosity.
    pub level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "tube=info,tower_http=info".to_string(),
            level: LogLevel::Info,
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable the Prometheus endpoint.
    pub enabled: bool,

    /// Metrics endpoint bind address.
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A directory served below a URL prefix.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticDirConfig {
    /// URL prefix (e.g., "/assets" or "/").
    pub mount: String,

    /// Directory on disk.
    pub dir: PathBuf,

    /// Register in the late tier so other routes take precedence.
    #[serde(default)]
    pub late: bool,
}

/// A single file served on a fixed route.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticFileConfig {
    /// Route string (placeholders allowed).
    pub route: String,

    /// File on disk.
    pub file: PathBuf,
}

//! Shared configuration for the couchview view server.
//!
//! Configuration is layered by `ortho_config`: built-in defaults, then an
//! optional configuration file, then `COUCHVIEW_`-prefixed environment
//! variables, then command-line flags. The database launches the server with
//! no arguments, so most deployments rely on the environment or a file.

mod defaults;
mod logging;

use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_FUNCTION_CACHE_CAPACITY, DEFAULT_LOG_FILTER, default_function_cache_capacity,
    default_log_filter_string, default_log_format,
};
pub use logging::LogFormat;

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "COUCHVIEW")]
pub struct Config {
    /// Tracing filter expression (for example `info` or `couchviewd=debug`).
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for log records.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Optional file receiving log records instead of stderr.
    #[serde(default)]
    pub log_file: Option<Utf8PathBuf>,
    /// Treats unsupported commands as fatal instead of reporting and
    /// continuing.
    #[serde(default)]
    #[ortho_config(default = false)]
    pub strict_mode: bool,
    /// Number of compiled user functions retained between invocations.
    #[serde(default = "default_function_cache_capacity")]
    #[ortho_config(default = default_function_cache_capacity())]
    pub function_cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            log_file: None,
            strict_mode: false,
            function_cache_capacity: default_function_cache_capacity(),
        }
    }
}

impl Config {
    /// Returns the tracing filter expression.
    #[must_use]
    pub const fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the log file path, when one is configured.
    #[must_use]
    pub const fn log_file(&self) -> Option<&Utf8PathBuf> {
        self.log_file.as_ref()
    }

    /// Returns whether unsupported commands end the session.
    #[must_use]
    pub const fn strict_mode(&self) -> bool {
        self.strict_mode
    }

    /// Returns the compiled function cache capacity.
    #[must_use]
    pub const fn function_cache_capacity(&self) -> usize {
        self.function_cache_capacity
    }
}

/// Errors surfaced while loading configuration.
pub type ConfigError = Arc<OrthoError>;

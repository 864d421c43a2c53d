//! Process bootstrap: configuration, telemetry, engine, and the serve loop.

use std::io::{BufRead, Write};

use couchview_config::{Config, ConfigError};
use couchview_eval::RhaiEngine;
use ortho_config::OrthoConfig;
use thiserror::Error;
use tracing::info;

use crate::errors::ServeError;
use crate::server::{SERVER_TARGET, run_with_engine};
use crate::telemetry::{self, TelemetryError};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader {
    /// Loads the server configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when no valid configuration can be built.
    fn load(&self) -> Result<Config, ConfigError>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load()
    }
}

/// Loader that always yields the wrapped configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps a fixed configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(self.config.clone())
    }
}

/// Errors that end the process with a failure status.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Config {
        /// Underlying loader error.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The serve loop ended with a fatal error.
    #[error(transparent)]
    Serve(#[from] ServeError),
}

/// Loads configuration, installs telemetry, and serves `input` until it
/// closes.
///
/// # Errors
///
/// Returns [`LaunchError`] for bootstrap failures and for fatal protocol or
/// command failures.
pub fn launch(
    loader: &dyn ConfigLoader,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<(), LaunchError> {
    let config = loader
        .load()
        .map_err(|source| LaunchError::Config { source })?;
    telemetry::initialise(&config).map_err(|source| LaunchError::Telemetry { source })?;

    info!(
        target: SERVER_TARGET,
        strict_mode = config.strict_mode(),
        function_cache_capacity = config.function_cache_capacity(),
        "view server starting"
    );
    let engine = RhaiEngine::new(config.function_cache_capacity());
    run_with_engine(input, output, engine, config.strict_mode())?;
    Ok(())
}

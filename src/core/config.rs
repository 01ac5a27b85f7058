//! Configuration module for SkinHost
//!
//! Host settings are layered through the `config` crate:
//! - Built-in defaults (every field is optional)
//! - An optional TOML/JSON settings file
//! - `SKINHOST_*` environment overrides

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;
use crate::logging::LoggingConfig;

/// Interval between periodic statistics flushes (two minutes)
pub const DEFAULT_STATS_INTERVAL_MS: u64 = 120_000;

/// Environment prefix for overrides
pub const ENV_PREFIX: &str = "SKINHOST";

/// Main host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Root directory holding `Skins/`, `Layouts/` and the default stores
    pub work_directory: PathBuf,

    /// Layout file; `<work>/SkinHost.ini` when unset
    pub layout_file: Option<PathBuf>,

    /// Statistics store; `<work>/SkinHost.stats` when unset
    pub stats_file: Option<PathBuf>,

    /// Minimum spacing between non-forced statistics writes
    pub stats_interval_ms: u64,

    /// Verbose work-area and lifecycle logging
    pub debug: bool,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            work_directory: default_work_directory(),
            layout_file: None,
            stats_file: None,
            stats_interval_ms: DEFAULT_STATS_INTERVAL_MS,
            debug: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl HostConfig {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: HostConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration rooted at the given work directory
    pub fn with_work_directory(work_directory: impl Into<PathBuf>) -> Self {
        Self {
            work_directory: work_directory.into(),
            ..Self::default()
        }
    }

    /// Reject values the host cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stats_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "stats_interval_ms".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Directory skins are resolved against
    pub fn skins_path(&self) -> PathBuf {
        self.work_directory.join("Skins")
    }

    /// Directory holding named layouts
    pub fn layouts_path(&self) -> PathBuf {
        self.work_directory.join("Layouts")
    }

    /// Effective layout file
    pub fn layout_path(&self) -> PathBuf {
        self.layout_file
            .clone()
            .unwrap_or_else(|| self.work_directory.join("SkinHost.ini"))
    }

    /// Effective statistics store
    pub fn stats_path(&self) -> PathBuf {
        self.stats_file
            .clone()
            .unwrap_or_else(|| self.work_directory.join("SkinHost.stats"))
    }

    /// Statistics flush interval
    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }
}

fn default_work_directory() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("SkinHost"))
        .unwrap_or_else(|| PathBuf::from("."))
}

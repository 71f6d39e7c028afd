//! Configuration manager implementation
//!
//! This module provides the configuration manager for the orchestrator,
//! resolving settings from an optional TOML file, environment-variable
//! overrides, and built-in defaults, in that priority order.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info};

use common::error::Error;

use crate::settings::Settings;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "ORCHESTRATOR_";

/// Configuration manager for the inference orchestrator
#[derive(Debug)]
pub struct ConfigManager {
    /// Resolved settings
    settings: Settings,
}

impl ConfigManager {
    /// Creates a configuration manager from defaults, an optional TOML file,
    /// and environment overrides
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let mut settings = match config_path {
            Some(path) => Self::read_file(path)?,
            None => Settings::default(),
        };

        Self::apply_env(&mut settings)?;

        debug!("Resolved configuration: {:?}", settings);

        Ok(Self { settings })
    }

    /// Creates a configuration manager from already-resolved settings
    pub fn from_settings(settings: Settings) -> Self {
        Self { settings }
    }

    /// Reads settings from a TOML file
    fn read_file(path: &Path) -> Result<Settings> {
        if !path.exists() {
            return Err(Error::NotFound(format!("Config file not found: {:?}", path)).into());
        }

        info!("Loading configuration from {:?}", path);

        let contents = std::fs::read_to_string(path)?;
        let settings = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {:?}: {}", path, e)))?;

        Ok(settings)
    }

    /// Applies ORCHESTRATOR_* environment overrides
    fn apply_env(settings: &mut Settings) -> Result<()> {
        if let Ok(dir) = std::env::var(format!("{}MODELS_DIR", ENV_PREFIX)) {
            settings.models_dir = PathBuf::from(dir);
        }

        if let Ok(mmap) = std::env::var(format!("{}ENABLE_MMAP", ENV_PREFIX)) {
            settings.enable_mmap = mmap.parse().map_err(|_| {
                Error::Config(format!("Invalid boolean for {}ENABLE_MMAP: {}", ENV_PREFIX, mmap))
            })?;
        }

        if let Ok(device) = std::env::var(format!("{}DEFAULT_DEVICE", ENV_PREFIX)) {
            settings.default_device = device;
        }

        if let Ok(filter) = std::env::var(format!("{}LOG_FILTER", ENV_PREFIX)) {
            settings.log_filter = filter;
        }

        Ok(())
    }

    /// Gets the models directory
    pub fn models_dir(&self) -> &Path {
        &self.settings.models_dir
    }

    /// Gets whether the engine memory-maps model files
    pub fn enable_mmap(&self) -> bool {
        self.settings.enable_mmap
    }

    /// Gets the default device name
    pub fn default_device(&self) -> &str {
        &self.settings.default_device
    }

    /// Gets the log filter
    pub fn log_filter(&self) -> &str {
        &self.settings.log_filter
    }
}

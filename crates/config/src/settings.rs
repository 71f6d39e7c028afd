//! Configuration schema and defaults
//!
//! This module defines the settings recognized by the orchestrator and their
//! default values.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Settings for the inference orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory containing model definition files
    pub models_dir: PathBuf,

    /// Whether the engine memory-maps model files when reading them
    pub enable_mmap: bool,

    /// Device models are compiled for when the caller does not name one
    pub default_device: String,

    /// Log filter used when RUST_LOG is not set
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("models"),
            enable_mmap: true,
            default_device: "CPU".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

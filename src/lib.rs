//! Main integration module for the inference orchestrator
//!
//! This crate wires the configuration layer, the reference engine, and the
//! orchestrator core together, and owns logging initialization for the
//! binary.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use config::ConfigManager;
use inference_engine::GraphEngine;
use orchestrator_core::InferenceOrchestrator;

pub mod manifest;

// Re-export the caller-facing types
pub use common::error::Error;
pub use common::tensor::{Tensor, TensorMap};
pub use common::types::Device;
pub use manifest::PipelineManifest;
pub use orchestrator_core::{PipelineStage, Transform};

/// Initializes logging
///
/// RUST_LOG wins when set; otherwise the configured filter applies. Safe to
/// call more than once.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.to_string()));

    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}

/// Builds an orchestrator over the reference engine from resolved
/// configuration
pub fn build_orchestrator(config: &ConfigManager) -> Result<InferenceOrchestrator> {
    let engine = Arc::new(GraphEngine::new(config.enable_mmap()));

    info!(
        "Building orchestrator: models_dir={:?}, mmap={}",
        config.models_dir(),
        config.enable_mmap()
    );

    Ok(InferenceOrchestrator::new(engine, config.models_dir()))
}

/// Parses the configured default device
pub fn default_device(config: &ConfigManager) -> Result<Device> {
    config
        .default_device()
        .parse::<Device>()
        .map_err(|e| Error::Config(e).into())
}

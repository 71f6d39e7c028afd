//! Configuration management for the inference orchestrator
//!
//! This crate provides the configuration layer for the orchestrator, with a
//! TOML file source, environment-variable overrides, and built-in defaults.

pub mod manager;
pub mod settings;

// Re-export commonly used types
pub use manager::ConfigManager;
pub use settings::Settings;

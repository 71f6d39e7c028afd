//! Core orchestration logic for the inference orchestrator
//!
//! This crate owns the single-slot model lifecycle (load, infer, release)
//! and the sequential multi-model pipeline built on top of it.

pub mod orchestrator;
pub mod pipeline;
pub mod state;

// Re-export commonly used types
pub use orchestrator::InferenceOrchestrator;
pub use pipeline::{PipelineStage, Transform};
pub use state::{ActiveModel, ModelSlot};

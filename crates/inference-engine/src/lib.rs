//! Model inference execution for the orchestrator
//!
//! This crate defines the capability interface the orchestrator programs
//! against (context, model reading, compilation, requests) and provides the
//! bundled reference engine: a CPU interpreter for JSON graph definitions
//! with memory-mapped model file reading.

pub mod api;
pub mod graph;
pub mod runtime;

// Re-export commonly used types
pub use api::{CompiledModel, Engine, InferRequest, OutputSpec, MODEL_FILE_EXTENSION};
pub use graph::{GraphDefinition, InputSpec, OpSpec};
pub use runtime::GraphEngine;

//! Engine capability interface
//!
//! This module defines the traits the orchestrator uses to talk to an
//! inference engine. The orchestrator never assumes a concrete engine type;
//! anything implementing these traits (the bundled reference engine, a fake
//! in tests, a binding to a native runtime) can sit behind them.

use std::path::Path;

use common::error::Result;
use common::tensor::Tensor;
use common::types::Device;

use crate::graph::GraphDefinition;

/// File extension of model definition files on disk
pub const MODEL_FILE_EXTENSION: &str = "json";

/// Declared output of a compiled model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    /// Output slot name
    pub name: String,

    /// Output index in the compiled model's output list
    pub index: usize,
}

/// Top-level engine context
///
/// Reads model definitions from disk and compiles them for a device. The
/// concrete context owns engine-level options such as memory-mapped file
/// access.
pub trait Engine: Send + Sync {
    /// Reads a model definition from a file path
    fn read_model(&self, path: &Path) -> Result<GraphDefinition>;

    /// Compiles a model definition for the named device
    fn compile(&self, model: GraphDefinition, device: &Device) -> Result<Box<dyn CompiledModel>>;
}

/// Device-bound executable form of a model
pub trait CompiledModel: Send {
    /// Name of the model this was compiled from
    fn name(&self) -> &str;

    /// Declared outputs, by name and index
    fn outputs(&self) -> &[OutputSpec];

    /// Creates an execution request bound to this compiled model
    fn create_request(&self) -> Result<Box<dyn InferRequest>>;
}

impl std::fmt::Debug for dyn CompiledModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledModel")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Execution context bound to one compiled model
pub trait InferRequest: Send {
    /// Binds a tensor to the named input slot
    fn set_input(&mut self, name: &str, tensor: Tensor) -> Result<()>;

    /// Executes the model, blocking until computation completes
    fn run(&mut self) -> Result<()>;

    /// Reads back the named output tensor from the last run
    fn output(&self, name: &str) -> Result<Tensor>;
}

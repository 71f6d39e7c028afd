//! Reference engine implementation
//!
//! This module provides the bundled CPU engine: it reads graph definitions
//! from disk (memory-mapped when enabled on the context), compiles them into
//! an executable plan, and runs them synchronously over ndarray tensors.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;
use tracing::{debug, info};

use common::error::{Error, Result};
use common::tensor::{Tensor, TensorMap};
use common::types::Device;

use crate::api::{CompiledModel, Engine, InferRequest, OutputSpec};
use crate::graph::{GraphDefinition, OpSpec};

/// Reference engine context
///
/// Holds the engine-level options; currently just the memory-mapping toggle
/// for model file reads.
pub struct GraphEngine {
    /// Whether model files are read through a memory mapping
    enable_mmap: bool,
}

impl GraphEngine {
    /// Creates an engine context
    pub fn new(enable_mmap: bool) -> Self {
        Self { enable_mmap }
    }

    /// Returns whether memory-mapped model reading is enabled
    pub fn mmap_enabled(&self) -> bool {
        self.enable_mmap
    }
}

impl Default for GraphEngine {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Engine for GraphEngine {
    fn read_model(&self, path: &Path) -> Result<GraphDefinition> {
        let definition = if self.enable_mmap {
            debug!("Reading model definition from {:?} via mmap", path);
            let file = File::open(path)?;
            // Safety: the mapping is dropped before this call returns and the
            // file is opened read-only.
            let mapped = unsafe { Mmap::map(&file)? };
            serde_json::from_slice(&mapped)?
        } else {
            debug!("Reading model definition from {:?}", path);
            let bytes = std::fs::read(path)?;
            serde_json::from_slice(&bytes)?
        };

        Ok(definition)
    }

    fn compile(&self, model: GraphDefinition, device: &Device) -> Result<Box<dyn CompiledModel>> {
        if !device.is_cpu() {
            return Err(Error::UnsupportedOperation(format!(
                "Reference engine cannot compile for device {}",
                device
            )));
        }

        model.validate()?;

        let outputs = model
            .outputs
            .iter()
            .enumerate()
            .map(|(index, name)| OutputSpec {
                name: name.clone(),
                index,
            })
            .collect();

        info!("Compiled model {} for {}", model.name, device);

        let plan = Arc::new(Plan {
            definition: model,
            outputs,
        });

        Ok(Box::new(CompiledGraph { plan }))
    }
}

/// Executable plan shared between a compiled model and its requests
struct Plan {
    /// Validated graph definition
    definition: GraphDefinition,

    /// Declared outputs, in export order
    outputs: Vec<OutputSpec>,
}

/// Compiled form of a graph definition
pub struct CompiledGraph {
    /// Shared plan
    plan: Arc<Plan>,
}

impl CompiledModel for CompiledGraph {
    fn name(&self) -> &str {
        &self.plan.definition.name
    }

    fn outputs(&self) -> &[OutputSpec] {
        &self.plan.outputs
    }

    fn create_request(&self) -> Result<Box<dyn InferRequest>> {
        Ok(Box::new(GraphRequest {
            plan: self.plan.clone(),
            bound: TensorMap::new(),
            results: None,
        }))
    }
}

/// Execution request bound to one compiled graph
pub struct GraphRequest {
    /// Shared plan
    plan: Arc<Plan>,

    /// Tensors bound to input slots
    bound: TensorMap,

    /// Values produced by the last run
    results: Option<TensorMap>,
}

impl InferRequest for GraphRequest {
    fn set_input(&mut self, name: &str, tensor: Tensor) -> Result<()> {
        let spec = self.plan.definition.input(name).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "Model {} has no input slot {}",
                self.plan.definition.name, name
            ))
        })?;

        if tensor.shape() != spec.shape.as_slice() {
            return Err(Error::InvalidArgument(format!(
                "Input {} expects shape {:?}, got {:?}",
                name,
                spec.shape,
                tensor.shape()
            )));
        }

        self.bound.insert(name.to_string(), tensor);
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        for input in &self.plan.definition.inputs {
            if !self.bound.contains_key(&input.name) {
                return Err(Error::InvalidArgument(format!(
                    "Input {} was not bound before run",
                    input.name
                )));
            }
        }

        let mut values = self.bound.clone();

        for op in &self.plan.definition.ops {
            // Validation guarantees the source value exists by now.
            let source = values.get(op.input()).ok_or_else(|| {
                Error::Engine(format!("Value {} missing during execution", op.input()))
            })?;

            let produced = match op {
                OpSpec::Identity { .. } => source.clone(),
                OpSpec::Scale { factor, .. } => source.mapv(|x| x * factor),
                OpSpec::Offset { addend, .. } => source.mapv(|x| x + addend),
                OpSpec::Relu { .. } => source.mapv(|x| x.max(0.0)),
            };

            values.insert(op.output().to_string(), produced);
        }

        self.results = Some(values);
        Ok(())
    }

    fn output(&self, name: &str) -> Result<Tensor> {
        let results = self.results.as_ref().ok_or_else(|| {
            Error::InvalidState("Request has not been run".to_string())
        })?;

        results
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("No output named {}", name)))
    }
}

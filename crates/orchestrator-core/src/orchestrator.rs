//! Inference orchestrator implementation
//!
//! This module provides the orchestrator owning at most one compiled model
//! and its execution request at any time. Loading resolves a model file under
//! the configured models directory, compiles it through the engine capability
//! interface, and replaces the resident pair; inference binds named tensors,
//! runs synchronously, and reads back every declared output.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use common::error::{Error, Result};
use common::tensor::TensorMap;
use common::types::Device;
use inference_engine::api::{Engine, MODEL_FILE_EXTENSION};

use crate::state::{ActiveModel, ModelSlot};

/// Orchestrates the load → infer → release lifecycle over one model slot
pub struct InferenceOrchestrator {
    /// Directory containing model definition files
    models_dir: PathBuf,

    /// Engine the orchestrator compiles and executes through
    engine: Arc<dyn Engine>,

    /// The single resident model slot
    slot: ModelSlot,
}

impl InferenceOrchestrator {
    /// Creates an orchestrator over the given engine and models directory
    pub fn new(engine: Arc<dyn Engine>, models_dir: impl Into<PathBuf>) -> Self {
        let models_dir = models_dir.into();
        info!("Initialized inference orchestrator with models_dir {:?}", models_dir);
        Self {
            engine,
            models_dir,
            slot: ModelSlot::new(),
        }
    }

    /// Gets the models directory
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Name and device of the resident model, if any
    pub fn loaded_model(&self) -> Option<(&str, &Device)> {
        self.slot
            .get()
            .map(|active| (active.name.as_str(), &active.device))
    }

    /// Loads the named model, compiled for the given device
    ///
    /// The resolved file must exist before the previously resident model is
    /// released, so a load of a nonexistent name leaves the previous model
    /// usable. On success the new pair becomes the resident state.
    pub fn load_model(&mut self, name: &str, device: Device) -> Result<()> {
        let path = self.model_path(name);

        if !path.exists() {
            return Err(Error::NotFound(format!("Model not found: {:?}", path)));
        }

        if let Some(previous) = self.slot.clear() {
            info!("Releasing model {} to load {}", previous.name, name);
        }

        info!("Loading model {} for device {}", name, device);

        let definition = self.engine.read_model(&path)?;
        let compiled = self.engine.compile(definition, &device)?;
        let request = compiled.create_request()?;

        self.slot.replace(ActiveModel {
            name: name.to_string(),
            device: device.clone(),
            compiled,
            request,
        });

        info!("Model {} loaded successfully on {}", name, device);

        Ok(())
    }

    /// Runs the resident model against the supplied inputs
    ///
    /// Binds every supplied tensor to its named input slot, executes
    /// synchronously, and reads back every output the compiled model
    /// declares. Fails with an invalid-state error when no model is loaded.
    pub fn infer(&mut self, inputs: &TensorMap) -> Result<TensorMap> {
        let active = self
            .slot
            .get_mut()
            .ok_or_else(|| Error::InvalidState("no model loaded".to_string()))?;

        for (name, tensor) in inputs {
            debug!("Binding input {} with shape {:?}", name, tensor.shape());
            active.request.set_input(name, tensor.clone())?;
        }

        active.request.run()?;

        let mut outputs = TensorMap::with_capacity(active.compiled.outputs().len());
        for spec in active.compiled.outputs() {
            outputs.insert(spec.name.clone(), active.request.output(&spec.name)?);
        }

        Ok(outputs)
    }

    /// Releases the resident model and request, if any
    ///
    /// Idempotent: releasing an empty orchestrator is a no-op.
    pub fn release(&mut self) {
        if let Some(active) = self.slot.clear() {
            info!("Releasing model {}", active.name);
        }
    }

    /// Names of the model definition files under the models directory, sorted
    pub fn available_models(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in std::fs::read_dir(&self.models_dir)? {
            let path = entry?.path();
            let is_model = path.is_file()
                && path
                    .extension()
                    .map_or(false, |ext| ext == MODEL_FILE_EXTENSION);
            if is_model {
                if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    fn model_path(&self, name: &str) -> PathBuf {
        self.models_dir
            .join(format!("{}.{}", name, MODEL_FILE_EXTENSION))
    }
}

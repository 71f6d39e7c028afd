//! Pipeline manifest format
//!
//! This module defines the JSON manifest the CLI uses to describe a
//! pipeline: an ordered stage list where each stage names a model, an
//! optional device override, and an optional declarative rename transform
//! mapping stage output names to the next stage's input names.

use std::collections::HashMap;

use serde::Deserialize;

use common::error::{Error, Result};
use common::tensor::TensorMap;
use common::types::Device;
use orchestrator_core::PipelineStage;

/// A pipeline described in a manifest file
#[derive(Debug, Deserialize)]
pub struct PipelineManifest {
    /// Stages in execution order
    pub stages: Vec<StageSpec>,
}

/// One stage entry of a pipeline manifest
#[derive(Debug, Deserialize)]
pub struct StageSpec {
    /// Model name to run
    pub model: String,

    /// Device override; the configured default applies when absent
    #[serde(default)]
    pub device: Option<String>,

    /// Output-to-input renames applied to the stage output; outputs not
    /// listed pass through under their own name
    #[serde(default)]
    pub rename: Option<HashMap<String, String>>,
}

impl PipelineManifest {
    /// Parses a manifest from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let manifest: PipelineManifest = serde_json::from_str(text)?;
        Ok(manifest)
    }

    /// Builds executable stages, resolving devices against the default
    pub fn into_stages(self, default_device: &Device) -> Result<Vec<PipelineStage>> {
        self.stages
            .into_iter()
            .map(|spec| spec.into_stage(default_device))
            .collect()
    }
}

impl StageSpec {
    /// Builds an executable stage from this entry
    pub fn into_stage(self, default_device: &Device) -> Result<PipelineStage> {
        let device = match &self.device {
            Some(name) => name.parse::<Device>().map_err(Error::Config)?,
            None => default_device.clone(),
        };

        let mut stage = PipelineStage::new(self.model).on_device(device);

        if let Some(renames) = self.rename {
            stage = stage.with_transform(move |outputs| apply_renames(&renames, outputs));
        }

        Ok(stage)
    }
}

/// Renames stage outputs per the manifest mapping
fn apply_renames(renames: &HashMap<String, String>, outputs: TensorMap) -> Result<TensorMap> {
    let mut renamed = TensorMap::with_capacity(outputs.len());

    for (name, tensor) in outputs {
        let target = renames.get(&name).cloned().unwrap_or(name);
        if renamed.insert(target.clone(), tensor).is_some() {
            return Err(Error::InvalidArgument(format!(
                "Rename produces duplicate tensor name {}",
                target
            )));
        }
    }

    Ok(renamed)
}

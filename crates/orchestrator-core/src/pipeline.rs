//! Sequential multi-model pipeline execution
//!
//! This module chains models into an ordered pipeline with optional data
//! transforms between stages. Stages run strictly one after another over the
//! orchestrator's single model slot: each stage loads its model, infers,
//! applies its transform, and releases the model before the next stage loads.
//! Peak memory is bounded by one compiled model at the cost of per-stage
//! load/unload churn in the engine.

use tracing::info;

use common::error::Result;
use common::tensor::TensorMap;
use common::types::Device;

use crate::orchestrator::InferenceOrchestrator;

/// Per-stage data transform applied to a stage's inference output
pub type Transform = Box<dyn Fn(TensorMap) -> Result<TensorMap>>;

/// One step of a multi-model pipeline
pub struct PipelineStage {
    /// Name of the model to run
    pub model: String,

    /// Device the stage's model is compiled for
    pub device: Device,

    /// Transform applied to the stage output, identity when absent
    transform: Option<Transform>,
}

impl std::fmt::Debug for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineStage")
            .field("model", &self.model)
            .field("device", &self.device)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl PipelineStage {
    /// Creates a stage running the named model on the default device
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            device: Device::default(),
            transform: None,
        }
    }

    /// Sets the device the stage's model is compiled for
    pub fn on_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Sets the transform applied to the stage's inference output
    pub fn with_transform(
        mut self,
        transform: impl Fn(TensorMap) -> Result<TensorMap> + 'static,
    ) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    /// Applies the stage transform, passing the output through unchanged
    /// when none was set
    fn apply(&self, outputs: TensorMap) -> Result<TensorMap> {
        match &self.transform {
            Some(transform) => transform(outputs),
            None => Ok(outputs),
        }
    }
}

impl InferenceOrchestrator {
    /// Runs models in sequence, handing each stage's (transformed) output to
    /// the next stage as input
    ///
    /// At most one compiled model is resident at any point: each stage
    /// releases its model before the next one loads. The first failing stage
    /// aborts the remainder and its error propagates unchanged. Zero stages
    /// return the initial input untouched.
    pub fn run_pipeline(
        &mut self,
        stages: Vec<PipelineStage>,
        initial_input: TensorMap,
    ) -> Result<TensorMap> {
        let mut current = initial_input;

        for (index, stage) in stages.iter().enumerate() {
            info!(
                "Running pipeline stage {}/{}: {}",
                index + 1,
                stages.len(),
                stage.model
            );

            self.load_model(&stage.model, stage.device.clone())?;
            let outputs = self.infer(&current)?;
            current = stage.apply(outputs)?;
            self.release();
        }

        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use ndarray::arr1;

    use common::error::Error;
    use common::tensor::Tensor;
    use inference_engine::api::{CompiledModel, Engine, InferRequest, OutputSpec};
    use inference_engine::graph::{GraphDefinition, InputSpec};

    use crate::orchestrator::tests::{orchestrator_over, write_scale_model};

    fn input_x(values: &[f32; 2]) -> TensorMap {
        let mut map = TensorMap::new();
        map.insert("x".to_string(), arr1(values).into_dyn());
        map
    }

    /// Renames the stage output `y` to the next stage's input `x`
    fn rename_y_to_x(mut outputs: TensorMap) -> Result<TensorMap> {
        let y = outputs
            .remove("y")
            .ok_or_else(|| Error::InvalidArgument("missing output y".to_string()))?;
        let mut next = TensorMap::new();
        next.insert("x".to_string(), y);
        Ok(next)
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let dir = tempfile::tempdir().unwrap();
        let mut orchestrator = orchestrator_over(dir.path());

        let input = input_x(&[1.5, -2.0]);
        let result = orchestrator.run_pipeline(Vec::new(), input.clone()).unwrap();
        assert_eq!(result, input);
        assert!(orchestrator.loaded_model().is_none());
    }

    #[test]
    fn test_two_stage_pipeline_composes() {
        let dir = tempfile::tempdir().unwrap();
        write_scale_model(dir.path(), "double", 2.0);
        write_scale_model(dir.path(), "triple", 3.0);

        let mut orchestrator = orchestrator_over(dir.path());
        let stages = vec![
            PipelineStage::new("double").with_transform(rename_y_to_x),
            PipelineStage::new("triple"),
        ];

        let result = orchestrator
            .run_pipeline(stages, input_x(&[1.0, 2.0]))
            .unwrap();

        assert_eq!(result["y"], arr1(&[6.0, 12.0]).into_dyn());
        assert!(orchestrator.loaded_model().is_none());
    }

    #[test]
    fn test_raw_output_passes_through_without_transform() {
        let dir = tempfile::tempdir().unwrap();
        write_scale_model(dir.path(), "double", 2.0);

        let mut orchestrator = orchestrator_over(dir.path());
        let result = orchestrator
            .run_pipeline(vec![PipelineStage::new("double")], input_x(&[4.0, 0.5]))
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result["y"], arr1(&[8.0, 1.0]).into_dyn());
    }

    #[test]
    fn test_failing_stage_aborts_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        write_scale_model(dir.path(), "double", 2.0);

        let mut orchestrator = orchestrator_over(dir.path());
        let stages = vec![
            PipelineStage::new("double").with_transform(rename_y_to_x),
            PipelineStage::new("ghost"),
            PipelineStage::new("double"),
        ];

        let err = orchestrator
            .run_pipeline(stages, input_x(&[1.0, 1.0]))
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(orchestrator.loaded_model().is_none());
    }

    #[test]
    fn test_transform_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        write_scale_model(dir.path(), "double", 2.0);

        let mut orchestrator = orchestrator_over(dir.path());
        let stages = vec![PipelineStage::new("double").with_transform(|_| {
            Err(Error::InvalidArgument("transform rejected output".to_string()))
        })];

        let err = orchestrator
            .run_pipeline(stages, input_x(&[1.0, 1.0]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    /// Compiled-model residency counters shared with a counting fake engine
    #[derive(Default)]
    struct Residency {
        live: AtomicUsize,
        peak: AtomicUsize,
    }

    /// Fake engine whose compiled models count their own residency
    struct CountingEngine {
        residency: Arc<Residency>,
    }

    struct CountingCompiled {
        definition: GraphDefinition,
        outputs: Vec<OutputSpec>,
        residency: Arc<Residency>,
    }

    struct EchoRequest {
        bound: TensorMap,
        results: Option<TensorMap>,
        output_names: Vec<String>,
    }

    impl Engine for CountingEngine {
        fn read_model(&self, path: &Path) -> common::error::Result<GraphDefinition> {
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("model")
                .to_string();
            Ok(GraphDefinition {
                name,
                inputs: vec![InputSpec {
                    name: "x".to_string(),
                    shape: vec![2],
                }],
                ops: Vec::new(),
                outputs: vec!["x".to_string()],
            })
        }

        fn compile(
            &self,
            model: GraphDefinition,
            _device: &common::types::Device,
        ) -> common::error::Result<Box<dyn CompiledModel>> {
            let live = self.residency.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.residency.peak.fetch_max(live, Ordering::SeqCst);

            let outputs = model
                .outputs
                .iter()
                .enumerate()
                .map(|(index, name)| OutputSpec {
                    name: name.clone(),
                    index,
                })
                .collect();

            Ok(Box::new(CountingCompiled {
                definition: model,
                outputs,
                residency: self.residency.clone(),
            }))
        }
    }

    impl Drop for CountingCompiled {
        fn drop(&mut self) {
            self.residency.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl CompiledModel for CountingCompiled {
        fn name(&self) -> &str {
            &self.definition.name
        }

        fn outputs(&self) -> &[OutputSpec] {
            &self.outputs
        }

        fn create_request(&self) -> common::error::Result<Box<dyn InferRequest>> {
            Ok(Box::new(EchoRequest {
                bound: TensorMap::new(),
                results: None,
                output_names: self.definition.outputs.clone(),
            }))
        }
    }

    impl InferRequest for EchoRequest {
        fn set_input(&mut self, name: &str, tensor: Tensor) -> common::error::Result<()> {
            self.bound.insert(name.to_string(), tensor);
            Ok(())
        }

        fn run(&mut self) -> common::error::Result<()> {
            let mut results = TensorMap::new();
            for name in &self.output_names {
                let tensor = self.bound.get(name).cloned().ok_or_else(|| {
                    Error::InvalidArgument(format!("input {} not bound", name))
                })?;
                results.insert(name.clone(), tensor);
            }
            self.results = Some(results);
            Ok(())
        }

        fn output(&self, name: &str) -> common::error::Result<Tensor> {
            self.results
                .as_ref()
                .and_then(|results| results.get(name))
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("no output {}", name)))
        }
    }

    #[test]
    fn test_pipeline_never_holds_two_models() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("first.json"), "{}").unwrap();
        std::fs::write(dir.path().join("second.json"), "{}").unwrap();
        std::fs::write(dir.path().join("third.json"), "{}").unwrap();

        let residency = Arc::new(Residency::default());
        let engine = Arc::new(CountingEngine {
            residency: residency.clone(),
        });
        let mut orchestrator = InferenceOrchestrator::new(engine, dir.path());

        let stages = vec![
            PipelineStage::new("first"),
            PipelineStage::new("second"),
            PipelineStage::new("third"),
        ];
        let result = orchestrator
            .run_pipeline(stages, input_x(&[1.0, 2.0]))
            .unwrap();

        assert_eq!(result["x"], arr1(&[1.0, 2.0]).into_dyn());
        assert_eq!(residency.peak.load(Ordering::SeqCst), 1);
        assert_eq!(residency.live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_back_to_back_loads_swap_residency() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();

        let residency = Arc::new(Residency::default());
        let engine = Arc::new(CountingEngine {
            residency: residency.clone(),
        });
        let mut orchestrator = InferenceOrchestrator::new(engine, dir.path());

        orchestrator.load_model("a", common::types::Device::Cpu).unwrap();
        orchestrator.load_model("b", common::types::Device::Cpu).unwrap();

        assert_eq!(orchestrator.loaded_model().unwrap().0, "b");
        assert_eq!(residency.live.load(Ordering::SeqCst), 1);

        orchestrator.release();
        assert_eq!(residency.live.load(Ordering::SeqCst), 0);
    }
}

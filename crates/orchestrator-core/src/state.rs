//! Current-model state for the orchestrator
//!
//! This module represents the orchestrator's single resident model as an
//! explicit slot type. Replacing the slot hands back the displaced pair, so
//! the at-most-one-resident invariant holds by construction rather than by
//! discipline over two nullable fields.

use common::types::Device;
use inference_engine::api::{CompiledModel, InferRequest};

/// The resident compiled model and its execution request
///
/// The request is created from the compiled model and the two are only ever
/// stored and dropped together.
pub struct ActiveModel {
    /// Model name the pair was loaded from
    pub name: String,

    /// Device the model was compiled for
    pub device: Device,

    /// Compiled model handle
    pub compiled: Box<dyn CompiledModel>,

    /// Execution request bound to the compiled model
    pub request: Box<dyn InferRequest>,
}

/// Holder for zero or one active model
#[derive(Default)]
pub struct ModelSlot {
    /// Resident pair, if any
    current: Option<ActiveModel>,
}

impl ModelSlot {
    /// Creates an empty slot
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Returns true if no model is resident
    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Installs a new pair, returning the displaced one if any
    pub fn replace(&mut self, active: ActiveModel) -> Option<ActiveModel> {
        self.current.replace(active)
    }

    /// Empties the slot, returning the resident pair if any
    pub fn clear(&mut self) -> Option<ActiveModel> {
        self.current.take()
    }

    /// Gets the resident pair
    pub fn get(&self) -> Option<&ActiveModel> {
        self.current.as_ref()
    }

    /// Gets the resident pair mutably
    pub fn get_mut(&mut self) -> Option<&mut ActiveModel> {
        self.current.as_mut()
    }
}

//! Common types for the inference orchestrator
//!
//! This crate provides the error type, tensor representation, and device
//! identifier shared by every other crate in the workspace.

pub mod error;
pub mod tensor;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use tensor::{Tensor, TensorMap};
pub use types::Device;

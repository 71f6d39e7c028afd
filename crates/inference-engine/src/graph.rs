//! Graph definition format for the reference engine
//!
//! This module defines the on-disk model format the reference engine
//! executes: declared input slots, a sequence of elementwise ops over named
//! values, and the names exported as outputs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use common::error::{Error, Result};

/// Declared input slot of a graph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputSpec {
    /// Input slot name
    pub name: String,

    /// Required tensor shape
    pub shape: Vec<usize>,
}

/// One elementwise operation over named values
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OpSpec {
    /// Copies the input value unchanged
    Identity {
        /// Source value name
        input: String,
        /// Produced value name
        output: String,
    },

    /// Multiplies every element by a constant factor
    Scale {
        /// Source value name
        input: String,
        /// Produced value name
        output: String,
        /// Multiplication factor
        factor: f32,
    },

    /// Adds a constant to every element
    Offset {
        /// Source value name
        input: String,
        /// Produced value name
        output: String,
        /// Added constant
        addend: f32,
    },

    /// Clamps every element to be non-negative
    Relu {
        /// Source value name
        input: String,
        /// Produced value name
        output: String,
    },
}

impl OpSpec {
    /// Name of the value this op consumes
    pub fn input(&self) -> &str {
        match self {
            OpSpec::Identity { input, .. }
            | OpSpec::Scale { input, .. }
            | OpSpec::Offset { input, .. }
            | OpSpec::Relu { input, .. } => input,
        }
    }

    /// Name of the value this op produces
    pub fn output(&self) -> &str {
        match self {
            OpSpec::Identity { output, .. }
            | OpSpec::Scale { output, .. }
            | OpSpec::Offset { output, .. }
            | OpSpec::Relu { output, .. } => output,
        }
    }
}

/// A model definition as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphDefinition {
    /// Model name
    pub name: String,

    /// Declared input slots
    pub inputs: Vec<InputSpec>,

    /// Operations, executed in order
    #[serde(default)]
    pub ops: Vec<OpSpec>,

    /// Value names exported as outputs, in declaration order
    pub outputs: Vec<String>,
}

impl GraphDefinition {
    /// Validates that the graph is executable
    ///
    /// Every op must consume a value that exists by the time it runs, value
    /// names must be unique, and every exported output must be produced.
    pub fn validate(&self) -> Result<()> {
        let mut known: HashSet<&str> = HashSet::new();

        for input in &self.inputs {
            if !known.insert(input.name.as_str()) {
                return Err(Error::Engine(format!(
                    "Model {}: duplicate input slot {}",
                    self.name, input.name
                )));
            }
        }

        if self.inputs.is_empty() {
            return Err(Error::Engine(format!(
                "Model {}: no input slots declared",
                self.name
            )));
        }

        for op in &self.ops {
            if !known.contains(op.input()) {
                return Err(Error::Engine(format!(
                    "Model {}: op consumes unknown value {}",
                    self.name,
                    op.input()
                )));
            }
            if !known.insert(op.output()) {
                return Err(Error::Engine(format!(
                    "Model {}: value {} produced twice",
                    self.name,
                    op.output()
                )));
            }
        }

        if self.outputs.is_empty() {
            return Err(Error::Engine(format!(
                "Model {}: no outputs declared",
                self.name
            )));
        }

        let mut exported: HashSet<&str> = HashSet::new();
        for output in &self.outputs {
            if !known.contains(output.as_str()) {
                return Err(Error::Engine(format!(
                    "Model {}: output {} is never produced",
                    self.name, output
                )));
            }
            if !exported.insert(output.as_str()) {
                return Err(Error::Engine(format!(
                    "Model {}: output {} exported twice",
                    self.name, output
                )));
            }
        }

        Ok(())
    }

    /// Looks up a declared input slot by name
    pub fn input(&self, name: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|input| input.name == name)
    }
}

//! Tensor representation for the inference orchestrator
//!
//! This module defines the tensor types exchanged between the caller, the
//! orchestrator, and the inference engine, plus the JSON conversions used by
//! the CLI to read inputs and print outputs.

use std::collections::HashMap;

use ndarray::{ArrayD, IxDyn};
use serde_json::Value;

use crate::error::{Error, Result};

/// Multi-dimensional array of 32-bit floats
pub type Tensor = ArrayD<f32>;

/// Mapping from named input/output slot to a tensor
pub type TensorMap = HashMap<String, Tensor>;

/// Parses a tensor from a JSON value of nested arrays
///
/// The nesting depth determines the rank; every sibling list must have the
/// same length. A bare number parses as a rank-0 tensor.
pub fn tensor_from_json(value: &Value) -> Result<Tensor> {
    let shape = shape_of(value)?;

    let mut data = Vec::with_capacity(shape.iter().product());
    flatten(value, &mut data)?;

    ArrayD::from_shape_vec(IxDyn(&shape), data)
        .map_err(|e| Error::InvalidArgument(format!("Invalid tensor literal: {}", e)))
}

/// Serializes a tensor into a JSON value of nested arrays
pub fn tensor_to_json(tensor: &Tensor) -> Value {
    let data: Vec<f32> = tensor.iter().copied().collect();
    nest(tensor.shape(), &data)
}

/// Parses a `{name: nested-array}` JSON object into a tensor map
pub fn tensor_map_from_json(value: &Value) -> Result<TensorMap> {
    let object = value.as_object().ok_or_else(|| {
        Error::InvalidArgument("Expected a JSON object of named tensors".to_string())
    })?;

    let mut map = TensorMap::with_capacity(object.len());
    for (name, literal) in object {
        map.insert(name.clone(), tensor_from_json(literal)?);
    }
    Ok(map)
}

/// Serializes a tensor map into a `{name: nested-array}` JSON object
pub fn tensor_map_to_json(map: &TensorMap) -> Value {
    let mut object = serde_json::Map::with_capacity(map.len());
    for (name, tensor) in map {
        object.insert(name.clone(), tensor_to_json(tensor));
    }
    Value::Object(object)
}

/// Computes the shape of a nested-array literal, requiring every sibling at
/// every level to have the same sub-shape
fn shape_of(value: &Value) -> Result<Vec<usize>> {
    match value {
        Value::Array(items) => {
            let mut inner: Option<Vec<usize>> = None;

            for item in items {
                let item_shape = shape_of(item)?;
                match &inner {
                    None => inner = Some(item_shape),
                    Some(expected) if *expected == item_shape => {}
                    Some(expected) => {
                        return Err(Error::InvalidArgument(format!(
                            "Ragged tensor literal: sibling with shape {:?} next to {:?}",
                            item_shape, expected
                        )));
                    }
                }
            }

            let mut shape = vec![items.len()];
            shape.extend(inner.unwrap_or_default());
            Ok(shape)
        }
        Value::Number(_) => Ok(Vec::new()),
        other => Err(Error::InvalidArgument(format!(
            "Expected a number or nested array in tensor literal, found {}",
            other
        ))),
    }
}

fn flatten(value: &Value, data: &mut Vec<f32>) -> Result<()> {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten(item, data)?;
            }
            Ok(())
        }
        Value::Number(n) => {
            let x = n.as_f64().ok_or_else(|| {
                Error::InvalidArgument(format!("Non-finite number in tensor literal: {}", n))
            })?;
            data.push(x as f32);
            Ok(())
        }
        other => Err(Error::InvalidArgument(format!(
            "Expected a number in tensor literal, found {}",
            other
        ))),
    }
}

fn nest(shape: &[usize], data: &[f32]) -> Value {
    match shape.split_first() {
        None => {
            let x = data.first().copied().unwrap_or(0.0);
            serde_json::json!(x)
        }
        Some((&len, rest)) => {
            let stride: usize = rest.iter().product();
            let items = (0..len)
                .map(|i| nest(rest, &data[i * stride..(i + 1) * stride]))
                .collect();
            Value::Array(items)
        }
    }
}

//! Common types for the inference orchestrator
//!
//! This module defines the device identifier used when compiling models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Named execution target for which a model is compiled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Device {
    /// General-purpose CPU
    Cpu,
    /// CUDA GPU with ordinal
    Cuda(usize),
    /// Custom device name, passed through to the engine
    Custom(String),
}

impl Device {
    /// Returns true if this is the CPU device
    pub fn is_cpu(&self) -> bool {
        matches!(self, Device::Cpu)
    }
}

impl Default for Device {
    fn default() -> Self {
        Device::Cpu
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "CPU"),
            Device::Cuda(ordinal) => write!(f, "CUDA:{}", ordinal),
            Device::Custom(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        if upper == "CPU" {
            return Ok(Device::Cpu);
        }
        if let Some(ordinal) = upper.strip_prefix("CUDA:") {
            return ordinal
                .parse::<usize>()
                .map(Device::Cuda)
                .map_err(|_| format!("Invalid CUDA ordinal: {}", s));
        }
        if upper == "CUDA" {
            return Ok(Device::Cuda(0));
        }
        if s.is_empty() {
            return Err("Empty device name".to_string());
        }
        Ok(Device::Custom(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("CPU".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("CUDA".parse::<Device>().unwrap(), Device::Cuda(0));
        assert_eq!("cuda:1".parse::<Device>().unwrap(), Device::Cuda(1));
        assert_eq!(
            "NPU".parse::<Device>().unwrap(),
            Device::Custom("NPU".to_string())
        );
        assert!("cuda:x".parse::<Device>().is_err());
        assert!("".parse::<Device>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Device::Cpu.to_string(), "CPU");
        assert_eq!(Device::Cuda(2).to_string(), "CUDA:2");
        assert_eq!(Device::Custom("NPU".to_string()).to_string(), "NPU");
    }

    #[test]
    fn test_default() {
        assert_eq!(Device::default(), Device::Cpu);
        assert!(Device::default().is_cpu());
    }
}

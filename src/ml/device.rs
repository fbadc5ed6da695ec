//! Compute device selection for candle inference
//!
//! GPU backends are only compiled in with the `cuda` or `metal` features;
//! the CPU is always available as a fallback.

use candle_core::Device;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Device types supported for inference
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeviceType {
    /// CPU inference
    Cpu,
    /// CUDA GPU inference
    Cuda(usize),
    /// Metal GPU inference (macOS)
    Metal,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Cpu => write!(f, "CPU"),
            DeviceType::Cuda(ordinal) => write!(f, "CUDA GPU {}", ordinal),
            DeviceType::Metal => write!(f, "Metal GPU"),
        }
    }
}

/// Pick the best compiled-in device, preferring GPUs over the CPU
pub fn select_device() -> (DeviceType, Device) {
    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => return (DeviceType::Cuda(0), device),
            Err(e) => log::warn!("CUDA device unavailable, falling back: {}", e),
        }
    }

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => return (DeviceType::Metal, device),
            Err(e) => log::warn!("Metal device unavailable, falling back: {}", e),
        }
    }

    (DeviceType::Cpu, Device::Cpu)
}

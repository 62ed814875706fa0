//! Hardware detection and compute device selection

use candle_core::Device;
use sysinfo::System;
use tracing::{debug, info, warn};

const GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Detected hardware capabilities
#[derive(Debug, Clone)]
pub struct HardwareCapabilities {
    pub total_ram_bytes: u64,
    pub available_ram_bytes: u64,
    pub cuda_available: bool,
    pub metal_available: bool,
    pub cpu_cores: usize,
}

impl HardwareCapabilities {
    pub fn available_ram_gb(&self) -> f64 {
        self.available_ram_bytes as f64 / GB
    }

    pub fn total_ram_gb(&self) -> f64 {
        self.total_ram_bytes as f64 / GB
    }

    /// Returns the best available compute device
    pub fn best_device(&self) -> ComputeDevice {
        if self.cuda_available {
            ComputeDevice::Cuda
        } else if self.metal_available {
            ComputeDevice::Metal
        } else {
            ComputeDevice::Cpu
        }
    }
}

/// Available compute devices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeDevice {
    Cpu,
    Cuda,
    Metal,
}

impl std::fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComputeDevice::Cpu => write!(f, "CPU"),
            ComputeDevice::Cuda => write!(f, "CUDA"),
            ComputeDevice::Metal => write!(f, "Metal"),
        }
    }
}

pub struct HardwareDetector;

impl HardwareDetector {
    pub fn detect() -> HardwareCapabilities {
        let mut sys = System::new_all();
        sys.refresh_all();

        // Both report false unless candle was built with the matching feature
        let cuda_available = candle_core::utils::cuda_is_available();
        let metal_available = candle_core::utils::metal_is_available();

        let capabilities = HardwareCapabilities {
            total_ram_bytes: sys.total_memory(),
            available_ram_bytes: sys.available_memory(),
            cuda_available,
            metal_available,
            cpu_cores: sys.cpus().len(),
        };

        info!(
            "Hardware detected: {:.1}GB RAM available ({:.1}GB total), {} cores, device: {}",
            capabilities.available_ram_gb(),
            capabilities.total_ram_gb(),
            capabilities.cpu_cores,
            capabilities.best_device()
        );
        debug!("Hardware capabilities: {:?}", capabilities);

        capabilities
    }
}

/// Creates the candle device for `preferred`, falling back to CPU
pub fn create_device(preferred: ComputeDevice) -> Device {
    let device = match preferred {
        ComputeDevice::Cuda => Device::new_cuda(0),
        ComputeDevice::Metal => Device::new_metal(0),
        ComputeDevice::Cpu => return Device::Cpu,
    };

    match device {
        Ok(device) => device,
        Err(e) => {
            warn!("Failed to create {} device: {}. Falling back to CPU", preferred, e);
            Device::Cpu
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(cuda: bool, metal: bool) -> HardwareCapabilities {
        HardwareCapabilities {
            total_ram_bytes: 16 * 1024 * 1024 * 1024,
            available_ram_bytes: 8 * 1024 * 1024 * 1024,
            cuda_available: cuda,
            metal_available: metal,
            cpu_cores: 8,
        }
    }

    #[test]
    fn test_hardware_detection() {
        let caps = HardwareDetector::detect();
        assert!(caps.total_ram_bytes > 0);
        assert!(caps.available_ram_bytes <= caps.total_ram_bytes);
    }

    #[test]
    fn test_ram_gb_conversion() {
        let caps = caps(false, false);
        assert!((caps.total_ram_gb() - 16.0).abs() < 0.01);
        assert!((caps.available_ram_gb() - 8.0).abs() < 0.01);
    }

    #[test]
    fn test_best_device_priority() {
        assert_eq!(caps(true, true).best_device(), ComputeDevice::Cuda);
        assert_eq!(caps(false, true).best_device(), ComputeDevice::Metal);
        assert_eq!(caps(false, false).best_device(), ComputeDevice::Cpu);
    }

    #[test]
    fn test_cpu_device() {
        assert!(create_device(ComputeDevice::Cpu).is_cpu());
    }
}

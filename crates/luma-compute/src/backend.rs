//! Backend selection and enum dispatch.
//!
//! [`Backend`] names a compute backend; [`create_device`] resolves it into an
//! [`AnyDevice`]. The OpenCL backend is feature-gated, so a selection of
//! [`Backend::OpenCl`] in a build without the `opencl` feature yields
//! [`ComputeError::BackendNotAvailable`] instead of a link-time surprise.

use std::fmt;
use std::str::FromStr;

use luma_core::PlanarImage;

use crate::chain::{run_chain, ChainRun, TransformChain};
use crate::cpu::CpuDevice;
use crate::{ComputeError, ComputeResult};

#[cfg(feature = "opencl")]
use crate::opencl::ClDevice;

/// Compute backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Prefer OpenCL when compiled in and a device exists, else CPU.
    #[default]
    Auto,
    /// Host reference implementation.
    Cpu,
    /// OpenCL device (requires the `opencl` feature).
    OpenCl,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Auto => "auto",
            Backend::Cpu => "cpu",
            Backend::OpenCl => "opencl",
        };
        f.write_str(name)
    }
}

impl FromStr for Backend {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Backend::Auto),
            "cpu" => Ok(Backend::Cpu),
            "opencl" | "cl" => Ok(Backend::OpenCl),
            other => Err(ComputeError::BackendNotAvailable(other.to_string())),
        }
    }
}

/// A created device of any backend.
pub enum AnyDevice {
    /// CPU reference device.
    Cpu(CpuDevice),
    /// OpenCL device.
    #[cfg(feature = "opencl")]
    OpenCl(ClDevice),
}

impl AnyDevice {
    /// Runs the three-stage chain on whichever device this is.
    pub fn run_chain(
        &self,
        image: &PlanarImage,
        chain: &TransformChain,
    ) -> ComputeResult<ChainRun> {
        match self {
            AnyDevice::Cpu(device) => run_chain(device, image, chain),
            #[cfg(feature = "opencl")]
            AnyDevice::OpenCl(device) => run_chain(device, image, chain),
        }
    }

    /// The underlying device name.
    pub fn name(&self) -> &str {
        match self {
            AnyDevice::Cpu(device) => {
                use crate::device::ComputeDevice;
                device.name()
            }
            #[cfg(feature = "opencl")]
            AnyDevice::OpenCl(device) => {
                use crate::device::ComputeDevice;
                device.name()
            }
        }
    }

    /// Which backend this device belongs to.
    pub fn backend(&self) -> Backend {
        match self {
            AnyDevice::Cpu(_) => Backend::Cpu,
            #[cfg(feature = "opencl")]
            AnyDevice::OpenCl(_) => Backend::OpenCl,
        }
    }
}

/// Creates a device for the requested backend.
///
/// [`Backend::Auto`] tries OpenCL first when compiled in, falling back to
/// the CPU device if no OpenCL device is usable. An explicit
/// [`Backend::OpenCl`] request never falls back.
pub fn create_device(backend: Backend) -> ComputeResult<AnyDevice> {
    match backend {
        Backend::Cpu => Ok(AnyDevice::Cpu(CpuDevice::new())),

        #[cfg(feature = "opencl")]
        Backend::OpenCl => Ok(AnyDevice::OpenCl(ClDevice::new()?)),
        #[cfg(not(feature = "opencl"))]
        Backend::OpenCl => Err(ComputeError::BackendNotAvailable(
            "opencl (feature not compiled in)".to_string(),
        )),

        Backend::Auto => {
            #[cfg(feature = "opencl")]
            match ClDevice::new() {
                Ok(device) => return Ok(AnyDevice::OpenCl(device)),
                Err(err) => {
                    tracing::info!(%err, "OpenCL unavailable, falling back to CPU");
                }
            }
            Ok(AnyDevice::Cpu(CpuDevice::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("cpu".parse::<Backend>().unwrap(), Backend::Cpu);
        assert_eq!("OpenCL".parse::<Backend>().unwrap(), Backend::OpenCl);
        assert_eq!("auto".parse::<Backend>().unwrap(), Backend::Auto);
        assert!("vulkan".parse::<Backend>().is_err());
    }

    #[test]
    fn test_cpu_always_creatable() {
        let device = create_device(Backend::Cpu).unwrap();
        assert_eq!(device.backend(), Backend::Cpu);
        assert_eq!(device.name(), "cpu");
    }

    #[cfg(not(feature = "opencl"))]
    #[test]
    fn test_opencl_rejected_without_feature() {
        assert!(matches!(
            create_device(Backend::OpenCl),
            Err(ComputeError::BackendNotAvailable(_))
        ));
    }
}

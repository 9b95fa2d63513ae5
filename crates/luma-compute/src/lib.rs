//! Compute backends and the three-stage colour transform pipeline.
//!
//! Provides a CPU reference backend (always available) and an OpenCL backend
//! (feature `opencl`) behind one device abstraction, plus the orchestrator
//! that drives a fixed chain of three dependent kernel stages over planar
//! image channels.
//!
//! # Architecture
//!
//! ```text
//! run_chain<D: ComputeDevice>
//!     +-- CpuDevice (host closures, logical device clock)
//!     +-- ClDevice  (opencl3: context + profiling queue + compiled program)
//! ```
//!
//! The orchestrator expresses inter-stage dependencies as completion events
//! chained through the device's wait-list mechanism; the host blocks only
//! once, on the final stage's event.
//!
//! # Example
//!
//! ```
//! use luma_compute::{CpuDevice, TransformChain, run_chain};
//! use luma_core::PlanarImage;
//!
//! let device = CpuDevice::new();
//! let image = PlanarImage::from_bgra_bytes(&[128, 64, 32, 255], 1, 1)?;
//! let run = run_chain(&device, &image, &TransformChain::rgb_roundtrip())?;
//! assert_eq!(run.red.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backend;
pub mod chain;
pub mod color;
pub mod cpu;
pub mod device;
mod kernels;

#[cfg(feature = "opencl")]
pub mod opencl;

pub use backend::{create_device, AnyDevice, Backend};
pub use chain::{run_chain, ChainRun, StageSpec, TransformChain, LOCAL_WORK_SIZE, STAGE_ARITY};
pub use cpu::{CpuDevice, CpuEvent};
pub use device::{Access, ComputeDevice, StageEvent};
pub use kernels::COLORSPACE_KERNEL_SOURCE;

#[cfg(feature = "opencl")]
pub use opencl::{probe_devices, ClDevice, DeviceInfo};

use thiserror::Error;

/// Errors raised by device setup, pipeline submission, and readback.
#[derive(Error, Debug)]
pub enum ComputeError {
    /// No suitable compute device or platform was found.
    #[error("no suitable compute device found")]
    DeviceUnavailable,

    /// The requested backend was not compiled in or is not usable here.
    #[error("backend not available: {0}")]
    BackendNotAvailable(String),

    /// Kernel source failed to build; carries the device build log.
    #[error("kernel program failed to compile:\n{log}")]
    CompileFailure {
        /// Compiler diagnostic log
        log: String,
    },

    /// A host or device buffer could not be allocated.
    #[error("failed to allocate {what}")]
    Allocation {
        /// What was being allocated
        what: String,
    },

    /// The program has no kernel with the requested name.
    #[error("kernel not found: {name}")]
    KernelMissing {
        /// Requested kernel name
        name: String,
    },

    /// A kernel's declared signature does not match the stage contract.
    #[error("kernel {kernel}: expected {expected} arguments, found {got}")]
    SignatureMismatch {
        /// Kernel name
        kernel: String,
        /// Arguments the stage contract requires
        expected: u32,
        /// Arguments the kernel declares
        got: u32,
    },

    /// A stage failed to enqueue or its dependency wait failed.
    #[error("stage {stage} failed to submit: {reason}")]
    Submission {
        /// Stage label
        stage: &'static str,
        /// Underlying failure
        reason: String,
    },

    /// Blocking on a completion event failed.
    #[error("event wait failed: {0}")]
    Wait(String),

    /// Reading a result buffer back to the host failed.
    #[error("readback failed: {0}")]
    Readback(String),

    /// Querying profiling timestamps from an event failed.
    #[error("profiling query failed: {0}")]
    Profiling(String),

    /// Channel planes of unequal or unexpected length were passed in.
    #[error("dimension mismatch: expected {expected} samples, got {got}")]
    DimensionMismatch {
        /// Expected plane length
        expected: usize,
        /// Actual plane length
        got: usize,
    },
}

/// Result type alias using [`ComputeError`].
pub type ComputeResult<T> = Result<T, ComputeError>;

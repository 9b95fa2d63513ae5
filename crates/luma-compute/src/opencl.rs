//! OpenCL backend.
//!
//! Owns the long-lived device context, one command queue created with
//! `CL_QUEUE_PROFILING_ENABLE`, and the compiled colour program. Buffers,
//! kernels, and events are created per pipeline run and dropped with it.
//!
//! Only available with the `opencl` feature; requires an OpenCL runtime at
//! load time.

use std::ptr;

use opencl3::command_queue::{CommandQueue, CL_QUEUE_PROFILING_ENABLE};
use opencl3::context::Context;
use opencl3::device::{get_all_devices, Device, CL_DEVICE_TYPE_ALL, CL_DEVICE_TYPE_GPU};
use opencl3::event::Event;
use opencl3::kernel::{ExecuteKernel, Kernel};
use opencl3::memory::{Buffer, CL_MEM_READ_ONLY, CL_MEM_READ_WRITE};
use opencl3::program::Program;
use opencl3::types::{cl_device_type, cl_event, cl_float, cl_int, CL_BLOCKING};
use tracing::{debug, info};

use crate::device::{ComputeDevice, StageEvent};
use crate::kernels::COLORSPACE_KERNEL_SOURCE;
use crate::{ComputeError, ComputeResult};

/// Information about a discovered OpenCL device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Human-readable device name.
    pub name: String,
    /// Device vendor string.
    pub vendor: String,
    /// Whether this is a GPU device (vs CPU or accelerator).
    pub is_gpu: bool,
    /// Maximum work-group size supported by the device.
    pub max_work_group_size: usize,
    /// Global memory size in bytes.
    pub global_mem_size: u64,
}

/// Probe all available OpenCL devices without creating a context.
///
/// Returns an empty vec if no OpenCL runtime is installed or no devices are
/// found (never errors).
pub fn probe_devices() -> Vec<DeviceInfo> {
    let device_ids = match get_all_devices(CL_DEVICE_TYPE_ALL) {
        Ok(ids) => ids,
        Err(_) => return Vec::new(),
    };

    device_ids
        .into_iter()
        .map(|id| {
            let dev = Device::new(id);
            let dev_type: cl_device_type = dev.dev_type().unwrap_or(0);
            DeviceInfo {
                name: dev.name().unwrap_or_default().trim().to_string(),
                vendor: dev.vendor().unwrap_or_default().trim().to_string(),
                is_gpu: (dev_type & CL_DEVICE_TYPE_GPU) != 0,
                max_work_group_size: dev.max_work_group_size().unwrap_or(1),
                global_mem_size: dev.global_mem_size().unwrap_or(0),
            }
        })
        .collect()
}

/// Device buffer handle: one `f32` plane in device memory.
pub struct ClBuffer {
    buf: Buffer<cl_float>,
    len: usize,
}

/// Kernel handle from the compiled colour program.
pub struct ClKernel {
    kernel: Kernel,
    name: String,
}

/// Completion event wrapping the device event object.
pub struct ClEvent(Event);

impl StageEvent for ClEvent {
    fn start_ticks(&self) -> ComputeResult<u64> {
        self.0
            .profiling_command_start()
            .map_err(|e| ComputeError::Profiling(e.to_string()))
    }

    fn end_ticks(&self) -> ComputeResult<u64> {
        self.0
            .profiling_command_end()
            .map_err(|e| ComputeError::Profiling(e.to_string()))
    }
}

/// OpenCL compute device.
///
/// Context, queue, and program are created once and shared read-only by
/// every run; the single host control thread is the only writer to the
/// queue's work list.
pub struct ClDevice {
    _device: Device,
    context: Context,
    queue: CommandQueue,
    program: Program,
    device_name: String,
}

impl ClDevice {
    /// Creates a device with the built-in colour program, preferring a GPU.
    pub fn new() -> ComputeResult<Self> {
        Self::from_source(COLORSPACE_KERNEL_SOURCE)
    }

    /// Creates a device compiling the given kernel source.
    ///
    /// Prefers a GPU device, falling back to the first available device of
    /// any type. Fails with [`ComputeError::DeviceUnavailable`] when no
    /// device exists and [`ComputeError::CompileFailure`] (carrying the
    /// build log) when the source does not build.
    pub fn from_source(source: &str) -> ComputeResult<Self> {
        let all_ids =
            get_all_devices(CL_DEVICE_TYPE_ALL).map_err(|_| ComputeError::DeviceUnavailable)?;
        if all_ids.is_empty() {
            return Err(ComputeError::DeviceUnavailable);
        }

        let gpu_ids = get_all_devices(CL_DEVICE_TYPE_GPU).unwrap_or_default();
        let selected_id = *gpu_ids.first().unwrap_or(&all_ids[0]);

        let device = Device::new(selected_id);
        let device_name = device.name().unwrap_or_default().trim().to_string();
        info!(device = %device_name, "selected OpenCL device");

        let context =
            Context::from_device(&device).map_err(|_| ComputeError::DeviceUnavailable)?;

        // OpenCL 1.2 queue API (create_default): the 2.0 variant is not
        // available everywhere. Profiling is always on; stage timing is part
        // of the pipeline contract.
        #[allow(deprecated)]
        let queue = CommandQueue::create_default(&context, CL_QUEUE_PROFILING_ENABLE)
            .map_err(|_| ComputeError::DeviceUnavailable)?;

        let program = Program::create_and_build_from_source(&context, source, "-Werror")
            .map_err(|log| ComputeError::CompileFailure { log })?;

        Ok(Self {
            _device: device,
            context,
            queue,
            program,
            device_name,
        })
    }
}

impl ComputeDevice for ClDevice {
    type Buffer = ClBuffer;
    type Kernel = ClKernel;
    type Event = ClEvent;

    fn input_buffer(&self, data: &[f32]) -> ComputeResult<Self::Buffer> {
        let mut buf = unsafe {
            Buffer::<cl_float>::create(&self.context, CL_MEM_READ_ONLY, data.len(), ptr::null_mut())
                .map_err(|e| ComputeError::Allocation {
                    what: format!("read-only buffer of {} samples: {e}", data.len()),
                })?
        };

        // Blocking upload: the caller may reuse the host array immediately.
        let write_event = unsafe {
            self.queue
                .enqueue_write_buffer(&mut buf, CL_BLOCKING, 0, data, &[])
                .map_err(|e| ComputeError::Submission {
                    stage: "input upload",
                    reason: e.to_string(),
                })?
        };
        write_event
            .wait()
            .map_err(|e| ComputeError::Wait(e.to_string()))?;

        Ok(ClBuffer {
            buf,
            len: data.len(),
        })
    }

    fn working_buffer(&self, len: usize) -> ComputeResult<Self::Buffer> {
        let buf = unsafe {
            Buffer::<cl_float>::create(&self.context, CL_MEM_READ_WRITE, len, ptr::null_mut())
                .map_err(|e| ComputeError::Allocation {
                    what: format!("read-write buffer of {len} samples: {e}"),
                })?
        };
        Ok(ClBuffer { buf, len })
    }

    fn kernel(&self, name: &str) -> ComputeResult<Self::Kernel> {
        let kernel = Kernel::create(&self.program, name).map_err(|_| {
            ComputeError::KernelMissing {
                name: name.to_string(),
            }
        })?;
        Ok(ClKernel {
            kernel,
            name: name.to_string(),
        })
    }

    fn kernel_arity(&self, kernel: &Self::Kernel) -> ComputeResult<u32> {
        kernel
            .kernel
            .num_args()
            .map_err(|e| ComputeError::Submission {
                stage: "signature query",
                reason: format!("{}: {e}", kernel.name),
            })
    }

    fn enqueue(
        &self,
        kernel: &Self::Kernel,
        inputs: [&Self::Buffer; 3],
        outputs: [&Self::Buffer; 3],
        width: u32,
        global: [usize; 2],
        local: [usize; 2],
        wait_list: &[&Self::Event],
    ) -> ComputeResult<Self::Event> {
        let wait_events: Vec<cl_event> = wait_list.iter().map(|e| e.0.get()).collect();
        let width = width as cl_int;

        debug!(kernel = %kernel.name, ?global, ?local, waits = wait_events.len(), "enqueue");

        // Binding is positional and must match the kernel's declared
        // parameter order: inputs, outputs, width.
        let event = unsafe {
            let mut exec = ExecuteKernel::new(&kernel.kernel);
            exec.set_arg(&inputs[0].buf)
                .set_arg(&inputs[1].buf)
                .set_arg(&inputs[2].buf)
                .set_arg(&outputs[0].buf)
                .set_arg(&outputs[1].buf)
                .set_arg(&outputs[2].buf)
                .set_arg(&width)
                .set_global_work_sizes(&global)
                .set_local_work_sizes(&local);
            if !wait_events.is_empty() {
                exec.set_event_wait_list(&wait_events);
            }
            exec.enqueue_nd_range(&self.queue)
                .map_err(|e| ComputeError::Submission {
                    stage: "kernel enqueue",
                    reason: format!("{}: {e}", kernel.name),
                })?
        };

        Ok(ClEvent(event))
    }

    fn wait(&self, event: &Self::Event) -> ComputeResult<()> {
        event
            .0
            .wait()
            .map_err(|e| ComputeError::Wait(e.to_string()))
    }

    fn read_buffer(&self, buffer: &Self::Buffer, dst: &mut [f32]) -> ComputeResult<()> {
        if buffer.len != dst.len() {
            return Err(ComputeError::DimensionMismatch {
                expected: dst.len(),
                got: buffer.len,
            });
        }

        let read_event = unsafe {
            self.queue
                .enqueue_read_buffer(&buffer.buf, CL_BLOCKING, 0, dst, &[])
                .map_err(|e| ComputeError::Readback(e.to_string()))?
        };
        read_event
            .wait()
            .map_err(|e| ComputeError::Wait(e.to_string()))
    }

    fn name(&self) -> &str {
        &self.device_name
    }
}

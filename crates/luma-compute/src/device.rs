//! Compute-device abstraction the orchestrator is generic over.
//!
//! Mirrors the shape of the underlying device API: opaque buffers tagged by
//! access mode, kernels fetched by name from a pre-compiled program, and
//! non-blocking stage submission that returns a completion event usable both
//! for dependency chaining and for profiling timestamps.

use crate::ComputeResult;

/// Access mode of a device buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Uploaded once from the host, read by kernels.
    ReadOnly,
    /// Written and read by kernels, read back by the host.
    ReadWrite,
}

/// Completion event for one submitted stage.
///
/// Records device-clock start/end timestamps once the device reports
/// completion. Tick unit is nanoseconds for every backend in this crate;
/// seconds are `ticks as f64 * 1e-9`.
pub trait StageEvent {
    /// Device-clock timestamp at which the stage began executing.
    fn start_ticks(&self) -> ComputeResult<u64>;

    /// Device-clock timestamp at which the stage finished executing.
    fn end_ticks(&self) -> ComputeResult<u64>;
}

/// One compute device: a context, a profiling-enabled command queue, and a
/// compiled program.
///
/// The queue is driven from a single host control thread; submission is
/// non-blocking and ordering between stages is expressed through event
/// wait-lists, not host-side blocking. The only blocking trait operations
/// are [`wait`](ComputeDevice::wait) and
/// [`read_buffer`](ComputeDevice::read_buffer).
pub trait ComputeDevice {
    /// Opaque device memory handle.
    type Buffer;
    /// Kernel handle from the compiled program.
    type Kernel;
    /// Completion event per submitted stage.
    type Event: StageEvent;

    /// Creates a read-only device buffer initialized with `data`.
    ///
    /// The upload completes before this returns; the caller may free or
    /// reuse `data` immediately.
    fn input_buffer(&self, data: &[f32]) -> ComputeResult<Self::Buffer>;

    /// Creates an uninitialized read-write buffer of `len` samples.
    fn working_buffer(&self, len: usize) -> ComputeResult<Self::Buffer>;

    /// Fetches a kernel handle by name.
    fn kernel(&self, name: &str) -> ComputeResult<Self::Kernel>;

    /// Number of arguments the kernel declares.
    ///
    /// Binding is positional; the orchestrator validates this against the
    /// stage contract before any submission instead of letting a mismatch
    /// surface as a device-side error mid-run.
    fn kernel_arity(&self, kernel: &Self::Kernel) -> ComputeResult<u32>;

    /// Submits one stage over a 2-D work domain and returns its event.
    ///
    /// Argument binding order is: the three input buffers, the three output
    /// buffers, then the image width as a scalar. The submission returns as
    /// soon as the work is enqueued; `wait_list` orders this stage after its
    /// predecessors on the device without blocking the host.
    #[allow(clippy::too_many_arguments)]
    fn enqueue(
        &self,
        kernel: &Self::Kernel,
        inputs: [&Self::Buffer; 3],
        outputs: [&Self::Buffer; 3],
        width: u32,
        global: [usize; 2],
        local: [usize; 2],
        wait_list: &[&Self::Event],
    ) -> ComputeResult<Self::Event>;

    /// Blocks the calling thread until `event` reports completion.
    ///
    /// There is no bounded-wait variant yet; a hung device operation hangs
    /// the caller. This method is the extension point for adding a timeout.
    fn wait(&self, event: &Self::Event) -> ComputeResult<()>;

    /// Reads a device buffer back into `dst`, blocking until the transfer
    /// is confirmed complete.
    fn read_buffer(&self, buffer: &Self::Buffer, dst: &mut [f32]) -> ComputeResult<()>;

    /// Human-readable device name.
    fn name(&self) -> &str;
}

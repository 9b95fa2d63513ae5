//! CPU reference backend.
//!
//! Kernels are host closures registered by name, executing eagerly at
//! enqueue time on the single host control thread. Events carry timestamps
//! from a monotonic logical clock in nanosecond units, so dependency
//! ordering and elapsed-time reporting behave like a profiling-enabled
//! device queue: a stage's start tick is never earlier than its
//! predecessor's end tick.
//!
//! The backend ships the same colour kernels as the embedded OpenCL source
//! (`rgb_to_xyy`, `xyy_to_xyz`, `xyz_to_rgb_out`, `xyz_to_luma`) and accepts
//! custom registrations, which the integration tests use for identity
//! stages.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::color;
use crate::device::{Access, ComputeDevice, StageEvent};
use crate::{ComputeError, ComputeResult};

/// Host kernel: three input planes, three output planes, image width.
pub type KernelFn = Rc<dyn Fn([&[f32]; 3], [&mut [f32]; 3], u32)>;

/// Kernel handle for the CPU backend.
#[derive(Clone)]
pub struct CpuKernel {
    name: String,
    arity: u32,
    func: KernelFn,
}

/// Device buffer for the CPU backend.
pub struct CpuBuffer {
    data: RefCell<Vec<f32>>,
    access: Access,
}

impl CpuBuffer {
    /// Sample count.
    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    /// `true` when the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Completion event for one CPU stage.
#[derive(Debug, Clone)]
pub struct CpuEvent {
    start: u64,
    end: u64,
}

impl StageEvent for CpuEvent {
    fn start_ticks(&self) -> ComputeResult<u64> {
        Ok(self.start)
    }

    fn end_ticks(&self) -> ComputeResult<u64> {
        Ok(self.end)
    }
}

/// One submission record, retained for ordering assertions in tests.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Kernel name.
    pub kernel: String,
    /// Logical start tick.
    pub start: u64,
    /// Logical end tick.
    pub end: u64,
}

/// CPU compute device.
///
/// Not `Send`/`Sync`: the pipeline is driven by a single host control
/// thread, and the logical clock and submission log use `Cell`/`RefCell`.
pub struct CpuDevice {
    kernels: HashMap<String, CpuKernel>,
    clock: Cell<u64>,
    log: RefCell<Vec<Submission>>,
}

impl CpuDevice {
    /// Creates a device with the built-in colour kernels registered.
    pub fn new() -> Self {
        let mut device = Self {
            kernels: HashMap::new(),
            clock: Cell::new(0),
            log: RefCell::new(Vec::new()),
        };

        device.register("rgb_to_xyy", |ins, mut outs, _w| {
            for idx in 0..ins[0].len() {
                let (x, y, z) = color::rgb_to_xyz(ins[0][idx], ins[1][idx], ins[2][idx]);
                let (cx, cy, by) = color::xyz_to_xyy(x, y, z);
                outs[0][idx] = cx;
                outs[1][idx] = cy;
                outs[2][idx] = by;
            }
        });
        device.register("xyy_to_xyz", |ins, mut outs, _w| {
            for idx in 0..ins[0].len() {
                let (x, y, z) = color::xyy_to_xyz(ins[0][idx], ins[1][idx], ins[2][idx]);
                outs[0][idx] = x;
                outs[1][idx] = y;
                outs[2][idx] = z;
            }
        });
        device.register("xyz_to_rgb_out", |ins, mut outs, _w| {
            for idx in 0..ins[0].len() {
                let (r, g, b) = color::xyz_to_rgb(ins[0][idx], ins[1][idx], ins[2][idx]);
                outs[0][idx] = r;
                outs[1][idx] = g;
                outs[2][idx] = b;
            }
        });
        device.register("xyz_to_luma", |ins, mut outs, _w| {
            for idx in 0..ins[0].len() {
                let y = ins[1][idx];
                outs[0][idx] = y;
                outs[1][idx] = y;
                outs[2][idx] = y;
            }
        });

        device
    }

    /// Registers (or replaces) a kernel under `name` with the standard
    /// seven-argument stage signature.
    pub fn register(
        &mut self,
        name: &str,
        func: impl Fn([&[f32]; 3], [&mut [f32]; 3], u32) + 'static,
    ) {
        self.register_with_arity(name, crate::chain::STAGE_ARITY, func);
    }

    /// Registers a kernel declaring an arbitrary arity.
    ///
    /// Only useful for exercising the pre-submission signature validation;
    /// the closure is still called with the standard plane layout.
    pub fn register_with_arity(
        &mut self,
        name: &str,
        arity: u32,
        func: impl Fn([&[f32]; 3], [&mut [f32]; 3], u32) + 'static,
    ) {
        self.kernels.insert(
            name.to_string(),
            CpuKernel {
                name: name.to_string(),
                arity,
                func: Rc::new(func),
            },
        );
    }

    /// Submission records in enqueue order.
    pub fn submissions(&self) -> Vec<Submission> {
        self.log.borrow().clone()
    }
}

impl Default for CpuDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeDevice for CpuDevice {
    type Buffer = CpuBuffer;
    type Kernel = CpuKernel;
    type Event = CpuEvent;

    fn input_buffer(&self, data: &[f32]) -> ComputeResult<Self::Buffer> {
        Ok(CpuBuffer {
            data: RefCell::new(data.to_vec()),
            access: Access::ReadOnly,
        })
    }

    fn working_buffer(&self, len: usize) -> ComputeResult<Self::Buffer> {
        Ok(CpuBuffer {
            data: RefCell::new(vec![0.0; len]),
            access: Access::ReadWrite,
        })
    }

    fn kernel(&self, name: &str) -> ComputeResult<Self::Kernel> {
        self.kernels
            .get(name)
            .cloned()
            .ok_or_else(|| ComputeError::KernelMissing {
                name: name.to_string(),
            })
    }

    fn kernel_arity(&self, kernel: &Self::Kernel) -> ComputeResult<u32> {
        Ok(kernel.arity)
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
        let submit = |reason: String| ComputeError::Submission {
            stage: "cpu enqueue",
            reason,
        };

        // Same constraint a device queue would enforce on the work shape.
        if local[0] == 0 || local[1] == 0 || global[0] % local[0] != 0 || global[1] % local[1] != 0
        {
            return Err(submit(format!(
                "local shape {local:?} does not divide global domain {global:?}"
            )));
        }
        if outputs.iter().any(|b| b.access != Access::ReadWrite) {
            return Err(submit("output buffer is not read-write".into()));
        }

        // Execution is eager, so every wait-list predecessor has already
        // completed; ordering still shows up in the event timestamps.
        let ready_at = wait_list
            .iter()
            .map(|e| e.end)
            .fold(self.clock.get(), u64::max);

        let ins: Vec<_> = inputs
            .iter()
            .map(|b| b.data.try_borrow().map_err(|_| submit("input buffer aliases an output".into())))
            .collect::<ComputeResult<_>>()?;
        let mut outs: Vec<_> = outputs
            .iter()
            .map(|b| {
                b.data
                    .try_borrow_mut()
                    .map_err(|_| submit("output buffer bound twice".into()))
            })
            .collect::<ComputeResult<_>>()?;

        let len = ins[0].len();
        if ins.iter().any(|p| p.len() != len) || outs.iter().any(|p| p.len() != len) {
            return Err(ComputeError::DimensionMismatch {
                expected: len,
                got: ins
                    .iter()
                    .map(|p| p.len())
                    .chain(outs.iter().map(|p| p.len()))
                    .find(|&l| l != len)
                    .unwrap_or(len),
            });
        }

        {
            let (first, rest) = outs.split_at_mut(1);
            let (second, third) = rest.split_at_mut(1);
            (kernel.func)(
                [ins[0].as_slice(), ins[1].as_slice(), ins[2].as_slice()],
                [
                    first[0].as_mut_slice(),
                    second[0].as_mut_slice(),
                    third[0].as_mut_slice(),
                ],
                width,
            );
        }

        let start = ready_at;
        let cost = (global[0] as u64 * global[1] as u64).max(1);
        let end = start + cost;
        self.clock.set(end);

        self.log.borrow_mut().push(Submission {
            kernel: kernel.name.clone(),
            start,
            end,
        });

        Ok(CpuEvent { start, end })
    }

    fn wait(&self, _event: &Self::Event) -> ComputeResult<()> {
        // Eager execution: the event is already complete.
        Ok(())
    }

    fn read_buffer(&self, buffer: &Self::Buffer, dst: &mut [f32]) -> ComputeResult<()> {
        let data = buffer
            .data
            .try_borrow()
            .map_err(|_| ComputeError::Readback("buffer still bound to a stage".into()))?;
        if data.len() != dst.len() {
            return Err(ComputeError::DimensionMismatch {
                expected: dst.len(),
                got: data.len(),
            });
        }
        dst.copy_from_slice(&data);
        Ok(())
    }

    fn name(&self) -> &str {
        "cpu"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_runs_kernel_and_ticks() {
        let device = CpuDevice::new();
        let input = device.input_buffer(&[0.5; 4]).unwrap();
        let zero = device.input_buffer(&[0.0; 4]).unwrap();
        let out: Vec<_> = (0..3).map(|_| device.working_buffer(4).unwrap()).collect();

        let k = device.kernel("xyz_to_luma").unwrap();
        let ev = device
            .enqueue(
                &k,
                [&zero, &input, &zero],
                [&out[0], &out[1], &out[2]],
                2,
                [2, 2],
                [2, 2],
                &[],
            )
            .unwrap();

        assert!(ev.end_ticks().unwrap() > ev.start_ticks().unwrap());

        let mut host = vec![0.0; 4];
        device.read_buffer(&out[0], &mut host).unwrap();
        assert_eq!(host, vec![0.5; 4]);
    }

    #[test]
    fn test_unknown_kernel() {
        let device = CpuDevice::new();
        assert!(matches!(
            device.kernel("nope"),
            Err(ComputeError::KernelMissing { .. })
        ));
    }

    #[test]
    fn test_local_shape_must_divide() {
        let device = CpuDevice::new();
        let input = device.input_buffer(&[0.0; 4]).unwrap();
        let out: Vec<_> = (0..3).map(|_| device.working_buffer(4).unwrap()).collect();
        let k = device.kernel("xyz_to_luma").unwrap();
        let err = device
            .enqueue(
                &k,
                [&input, &input, &input],
                [&out[0], &out[1], &out[2]],
                2,
                [2, 2],
                [3, 1],
                &[],
            )
            .unwrap_err();
        assert!(matches!(err, ComputeError::Submission { .. }));
    }
}

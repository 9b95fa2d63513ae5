//! Pipeline orchestrator for the fixed three-stage transform chain.
//!
//! One run uploads the red/green/blue planes of a [`PlanarImage`] into three
//! read-only device buffers, allocates two read-write buffer triples, and
//! submits three kernel stages chained by completion events:
//!
//! ```text
//! inputs ──A──> set0 ──B──> set1 ──C──> set0
//! ```
//!
//! The ping-pong is intentional: stage C writes back into the triple stage A
//! produced, so the final result is read through the same buffer identities
//! bound as A's outputs and no third read-write triple is needed.
//!
//! Submission is non-blocking; the host blocks exactly once, on stage C's
//! event, then queries stage A's start and stage C's end timestamps for the
//! device-side elapsed time (nanosecond ticks, reported as a `Duration`).

use std::time::Duration;

use luma_core::PlanarImage;
use tracing::debug;

use crate::device::{ComputeDevice, StageEvent};
use crate::{ComputeError, ComputeResult};

/// Preferred work-group edge for stage dispatch.
pub const LOCAL_WORK_SIZE: usize = 16;

/// Arguments every stage kernel must declare: three input planes, three
/// output planes, and the image width.
pub const STAGE_ARITY: u32 = 7;

/// One stage of the chain: a kernel name plus a label used in errors and
/// logs.
#[derive(Debug, Clone)]
pub struct StageSpec {
    /// Kernel name inside the device's compiled program.
    pub kernel: String,
    /// Stable label for diagnostics.
    pub label: &'static str,
}

impl StageSpec {
    /// Creates a stage spec.
    pub fn new(kernel: impl Into<String>, label: &'static str) -> Self {
        Self {
            kernel: kernel.into(),
            label,
        }
    }
}

/// The fixed three-stage transform chain.
#[derive(Debug, Clone)]
pub struct TransformChain {
    stages: [StageSpec; 3],
}

impl TransformChain {
    /// Chain built from three explicit stages.
    pub fn from_stages(stages: [StageSpec; 3]) -> Self {
        Self { stages }
    }

    /// RGB -> xyY -> XYZ -> RGB: a round trip that reproduces the input
    /// within floating-point tolerance.
    pub fn rgb_roundtrip() -> Self {
        Self::from_stages([
            StageSpec::new("rgb_to_xyy", "stage A (rgb_to_xyy)"),
            StageSpec::new("xyy_to_xyz", "stage B (xyy_to_xyz)"),
            StageSpec::new("xyz_to_rgb_out", "stage C (xyz_to_rgb_out)"),
        ])
    }

    /// RGB -> xyY -> XYZ -> replicated luminance (greyscale result planes).
    pub fn rgb_to_luma() -> Self {
        Self::from_stages([
            StageSpec::new("rgb_to_xyy", "stage A (rgb_to_xyy)"),
            StageSpec::new("xyy_to_xyz", "stage B (xyy_to_xyz)"),
            StageSpec::new("xyz_to_luma", "stage C (xyz_to_luma)"),
        ])
    }

    /// The three stages in execution order.
    pub fn stages(&self) -> &[StageSpec; 3] {
        &self.stages
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct ChainRun {
    /// Red result plane, `width * height` samples.
    pub red: Vec<f32>,
    /// Green result plane.
    pub green: Vec<f32>,
    /// Blue result plane.
    pub blue: Vec<f32>,
    /// Device-side elapsed time from stage A's start to stage C's end.
    pub device_time: Duration,
}

/// Largest work-group edge `<= LOCAL_WORK_SIZE` that evenly divides
/// `extent`.
///
/// The chain dispatches an exact `width x height` global domain, so the
/// local shape must divide it; kernels then never see an out-of-range work
/// item. Worst case (prime extents) this degrades to 1.
fn local_edge(extent: usize) -> usize {
    (1..=LOCAL_WORK_SIZE)
        .rev()
        .find(|d| extent % d == 0)
        .unwrap_or(1)
}

/// Executes the three-stage chain over `image` on `device`.
///
/// Validates every stage kernel's declared arity against [`STAGE_ARITY`]
/// before allocating device memory or submitting anything. Any allocation,
/// binding, submission, or readback failure aborts the run; device buffers
/// created earlier are released by drop on every exit path. No retry is
/// attempted.
pub fn run_chain<D: ComputeDevice>(
    device: &D,
    image: &PlanarImage,
    chain: &TransformChain,
) -> ComputeResult<ChainRun> {
    let width = image.width();
    let height = image.height();
    let len = image.pixel_count();

    if len == 0 {
        return Err(ComputeError::DimensionMismatch {
            expected: 1,
            got: 0,
        });
    }
    let expected = width as usize * height as usize;
    if len != expected {
        return Err(ComputeError::DimensionMismatch { expected, got: len });
    }

    // Resolve and validate all three kernels before touching device memory.
    let stages = chain.stages();
    let mut kernels = Vec::with_capacity(3);
    for stage in stages {
        let kernel = device.kernel(&stage.kernel)?;
        let arity = device.kernel_arity(&kernel)?;
        if arity != STAGE_ARITY {
            return Err(ComputeError::SignatureMismatch {
                kernel: stage.kernel.clone(),
                expected: STAGE_ARITY,
                got: arity,
            });
        }
        kernels.push(kernel);
    }

    debug!(
        device = device.name(),
        width, height, "uploading input planes"
    );
    let in_r = device.input_buffer(image.red())?;
    let in_g = device.input_buffer(image.green())?;
    let in_b = device.input_buffer(image.blue())?;

    let set0 = [
        device.working_buffer(len)?,
        device.working_buffer(len)?,
        device.working_buffer(len)?,
    ];
    let set1 = [
        device.working_buffer(len)?,
        device.working_buffer(len)?,
        device.working_buffer(len)?,
    ];

    let global = [width as usize, height as usize];
    let local = [local_edge(global[0]), local_edge(global[1])];

    // Strict linear dependency chain A -> B -> C; only C is awaited by the
    // host.
    let submit = |err: ComputeError, stage: &'static str| match err {
        e @ ComputeError::Submission { .. } => e,
        other => ComputeError::Submission {
            stage,
            reason: other.to_string(),
        },
    };

    let ev_a = device
        .enqueue(
            &kernels[0],
            [&in_r, &in_g, &in_b],
            [&set0[0], &set0[1], &set0[2]],
            width,
            global,
            local,
            &[],
        )
        .map_err(|e| submit(e, stages[0].label))?;

    let ev_b = device
        .enqueue(
            &kernels[1],
            [&set0[0], &set0[1], &set0[2]],
            [&set1[0], &set1[1], &set1[2]],
            width,
            global,
            local,
            &[&ev_a],
        )
        .map_err(|e| submit(e, stages[1].label))?;

    let ev_c = device
        .enqueue(
            &kernels[2],
            [&set1[0], &set1[1], &set1[2]],
            [&set0[0], &set0[1], &set0[2]],
            width,
            global,
            local,
            &[&ev_b],
        )
        .map_err(|e| submit(e, stages[2].label))?;

    // Single synchronization point for the whole chain.
    device.wait(&ev_c)?;

    let t0 = ev_a.start_ticks()?;
    let t1 = ev_c.end_ticks()?;
    let device_time = Duration::from_nanos(t1.saturating_sub(t0));
    debug!(?device_time, "chain complete");

    let mut red = vec![0.0f32; len];
    let mut green = vec![0.0f32; len];
    let mut blue = vec![0.0f32; len];
    device.read_buffer(&set0[0], &mut red)?;
    device.read_buffer(&set0[1], &mut green)?;
    device.read_buffer(&set0[2], &mut blue)?;

    Ok(ChainRun {
        red,
        green,
        blue,
        device_time,
    })
}

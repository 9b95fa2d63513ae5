//! Integration tests for the three-stage pipeline on the CPU reference
//! device.

use approx::assert_relative_eq;
use luma_compute::{
    run_chain, ChainRun, ComputeError, CpuDevice, StageSpec, TransformChain, STAGE_ARITY,
};
use luma_core::PlanarImage;

fn test_image() -> PlanarImage {
    PlanarImage::from_planes(
        2,
        2,
        vec![0.0, 0.5, 1.0, 0.25],
        vec![1.0, 0.0, 0.5, 0.75],
        vec![0.5, 0.5, 0.5, 0.5],
        vec![1.0; 4],
    )
    .unwrap()
}

#[test]
fn test_roundtrip_recovers_input() {
    let device = CpuDevice::new();
    let image = test_image();

    let run = run_chain(&device, &image, &TransformChain::rgb_roundtrip()).unwrap();

    for idx in 0..image.pixel_count() {
        assert_relative_eq!(run.red[idx], image.red()[idx], epsilon = 1e-5);
        assert_relative_eq!(run.green[idx], image.green()[idx], epsilon = 1e-5);
        assert_relative_eq!(run.blue[idx], image.blue()[idx], epsilon = 1e-5);
    }
}

#[test]
fn test_device_time_is_nonzero_and_ordered() {
    let device = CpuDevice::new();
    let run = run_chain(&device, &test_image(), &TransformChain::rgb_roundtrip()).unwrap();

    // Three stages of four work items each on the logical clock.
    assert!(run.device_time.as_nanos() > 0);

    let subs = device.submissions();
    assert_eq!(subs.len(), 3);
    assert_eq!(subs[0].kernel, "rgb_to_xyy");
    assert_eq!(subs[1].kernel, "xyy_to_xyz");
    assert_eq!(subs[2].kernel, "xyz_to_rgb_out");

    // Each stage starts no earlier than its predecessor ends.
    assert!(subs[1].start >= subs[0].end);
    assert!(subs[2].start >= subs[1].end);
    assert_eq!(
        run.device_time.as_nanos() as u64,
        subs[2].end - subs[0].start
    );
}

#[test]
fn test_luma_chain_replicates_planes() {
    let device = CpuDevice::new();
    let run = run_chain(&device, &test_image(), &TransformChain::rgb_to_luma()).unwrap();

    assert_eq!(run.red, run.green);
    assert_eq!(run.green, run.blue);
    // Luminance of non-black input is positive.
    assert!(run.red.iter().all(|&y| y > 0.0));
}

#[test]
fn test_identity_stages_ping_pong_correctly() {
    let mut device = CpuDevice::new();
    device.register("copy", |ins, mut outs, _w| {
        for plane in 0..3 {
            outs[plane].copy_from_slice(ins[plane]);
        }
    });

    let image = test_image();
    let chain = TransformChain::from_stages([
        StageSpec::new("copy", "stage A (copy)"),
        StageSpec::new("copy", "stage B (copy)"),
        StageSpec::new("copy", "stage C (copy)"),
    ]);

    let run = run_chain(&device, &image, &chain).unwrap();
    assert_eq!(run.red, image.red());
    assert_eq!(run.green, image.green());
    assert_eq!(run.blue, image.blue());
}

#[test]
fn test_signature_mismatch_rejected_before_submission() {
    let mut device = CpuDevice::new();
    device.register_with_arity("short_sig", STAGE_ARITY - 1, |_ins, _outs, _w| {});

    let chain = TransformChain::from_stages([
        StageSpec::new("rgb_to_xyy", "stage A"),
        StageSpec::new("short_sig", "stage B"),
        StageSpec::new("xyz_to_rgb_out", "stage C"),
    ]);

    let err = run_chain(&device, &test_image(), &chain).unwrap_err();
    assert!(matches!(
        err,
        ComputeError::SignatureMismatch {
            expected: STAGE_ARITY,
            got,
            ..
        } if got == STAGE_ARITY - 1
    ));

    // Validation failed before anything reached the queue.
    assert!(device.submissions().is_empty());
}

#[test]
fn test_missing_kernel_rejected() {
    let device = CpuDevice::new();
    let chain = TransformChain::from_stages([
        StageSpec::new("rgb_to_xyy", "stage A"),
        StageSpec::new("does_not_exist", "stage B"),
        StageSpec::new("xyz_to_rgb_out", "stage C"),
    ]);
    let err = run_chain(&device, &test_image(), &chain).unwrap_err();
    assert!(matches!(err, ComputeError::KernelMissing { name } if name == "does_not_exist"));
}

#[test]
fn test_black_pixels_survive_roundtrip() {
    let device = CpuDevice::new();
    let image = PlanarImage::from_planes(
        2,
        1,
        vec![0.0, 0.2],
        vec![0.0, 0.4],
        vec![0.0, 0.6],
        vec![1.0; 2],
    )
    .unwrap();

    let run = run_chain(&device, &image, &TransformChain::rgb_roundtrip()).unwrap();

    // Black has no chromaticity; the xyY guard must carry it through as
    // exact zero rather than NaN.
    assert_eq!(run.red[0], 0.0);
    assert_eq!(run.green[0], 0.0);
    assert_eq!(run.blue[0], 0.0);
    assert_relative_eq!(run.red[1], 0.2, epsilon = 1e-5);
    assert_relative_eq!(run.green[1], 0.4, epsilon = 1e-5);
    assert_relative_eq!(run.blue[1], 0.6, epsilon = 1e-5);
}

#[test]
fn test_non_square_image() {
    let device = CpuDevice::new();
    let width = 5u32;
    let height = 3u32;
    let len = (width * height) as usize;
    let ramp: Vec<f32> = (0..len).map(|i| i as f32 / (len - 1) as f32).collect();
    let image = PlanarImage::from_planes(
        width,
        height,
        ramp.clone(),
        ramp.clone(),
        ramp.clone(),
        vec![1.0; len],
    )
    .unwrap();

    let ChainRun { red, green, blue, .. } =
        run_chain(&device, &image, &TransformChain::rgb_roundtrip()).unwrap();
    for idx in 0..len {
        assert_relative_eq!(red[idx], ramp[idx], epsilon = 1e-5);
        assert_relative_eq!(green[idx], ramp[idx], epsilon = 1e-5);
        assert_relative_eq!(blue[idx], ramp[idx], epsilon = 1e-5);
    }
}

//! Pipeline run command: decode, transform on a compute device, encode.

use anyhow::{Context, Result};
use luma_compute::{create_device, Backend, TransformChain};
use luma_io::{Codec, CodecConfig};
use tracing::info;

use crate::{BackendArg, ChainKind, RunArgs};

pub fn run(args: RunArgs) -> Result<()> {
    let codec = Codec::new(CodecConfig::default());

    let image = codec
        .load_planar(&args.input)
        .with_context(|| format!("Failed to load: {}", args.input.display()))?;
    info!(
        width = image.width(),
        height = image.height(),
        "loaded input image"
    );

    let backend = match args.backend {
        BackendArg::Auto => Backend::Auto,
        BackendArg::Cpu => Backend::Cpu,
        BackendArg::Opencl => Backend::OpenCl,
    };
    let device = create_device(backend).context("Failed to create compute device")?;
    info!(device = device.name(), "created compute device");

    let chain = match args.chain {
        ChainKind::Roundtrip => TransformChain::rgb_roundtrip(),
        ChainKind::Luma => TransformChain::rgb_to_luma(),
    };
    let result = device
        .run_chain(&image, &chain)
        .context("Pipeline run failed")?;

    match args.chain {
        ChainKind::Roundtrip => codec.save_planar(
            &args.output,
            &result.red,
            &result.green,
            &result.blue,
            image.width(),
            image.height(),
        ),
        // The luma chain replicates luminance across all three planes; save
        // one of them normalized to full greyscale range.
        ChainKind::Luma => codec.save_gray(
            &args.output,
            &result.red,
            image.width(),
            image.height(),
        ),
    }
    .with_context(|| format!("Failed to save: {}", args.output.display()))?;

    println!(
        "{} -> {} [{}]",
        args.input.display(),
        args.output.display(),
        device.name()
    );
    println!("device time: {:.6} s", result.device_time.as_secs_f64());

    Ok(())
}

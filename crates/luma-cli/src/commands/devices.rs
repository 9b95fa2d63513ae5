//! Compute device listing command.

use anyhow::Result;

pub fn run() -> Result<()> {
    println!("cpu: host reference device");

    #[cfg(feature = "opencl")]
    {
        use crate::commands::format_size;

        let devices = luma_compute::probe_devices();
        if devices.is_empty() {
            println!("opencl: no devices found");
        }
        for dev in devices {
            println!(
                "opencl: {} ({}) [{}], max work-group {}, {} global memory",
                dev.name,
                dev.vendor,
                if dev.is_gpu { "gpu" } else { "non-gpu" },
                dev.max_work_group_size,
                format_size(dev.global_mem_size),
            );
        }
    }

    #[cfg(not(feature = "opencl"))]
    println!("opencl: not compiled in (build with --features opencl)");

    Ok(())
}

//! luma - planar colour pipeline CLI
//!
//! Decodes a raster image, runs the three-stage colour transform chain on a
//! compute device, and writes the result as a Deflate-compressed TIFF.

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "luma")]
#[command(author, version, about = "Planar colour pipeline over CPU/OpenCL compute devices")]
#[command(long_about = "
Runs a fixed chain of three dependent colour-space kernels over the channel
planes of an image.

Examples:
  luma run input.png -o output.tiff                 # RGB round trip
  luma run input.jpg -o gray.tiff --chain luma      # normalized luminance
  luma run input.png -o out.tiff --backend cpu -v
  luma devices                                      # list compute devices
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the transform chain over an image file
    #[command(visible_alias = "r")]
    Run(RunArgs),

    /// List available compute devices
    #[command(visible_alias = "d")]
    Devices,
}

#[derive(Args)]
struct RunArgs {
    /// Input image (any supported raster format)
    input: PathBuf,

    /// Output TIFF path
    #[arg(short, long)]
    output: PathBuf,

    /// Transform chain to run
    #[arg(long, value_enum, default_value = "roundtrip")]
    chain: ChainKind,

    /// Compute backend
    #[arg(short, long, value_enum, default_value = "auto")]
    backend: BackendArg,
}

/// Which three-stage chain to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ChainKind {
    /// RGB -> xyY -> XYZ -> RGB (reproduces the input)
    Roundtrip,
    /// RGB -> xyY -> XYZ -> normalized luminance greyscale
    Luma,
}

/// Compute backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    /// OpenCL when available, else CPU
    Auto,
    /// Host reference implementation
    Cpu,
    /// OpenCL device (requires the `opencl` feature)
    Opencl,
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Devices => commands::devices::run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}

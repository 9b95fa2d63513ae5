//! Codec adapters between raster files and packed byte buffers.
//!
//! Decoding accepts any raster format the `image` crate is compiled for and
//! yields packed BGRA bytes; encoding writes packed BGR bytes as 8-bit RGB
//! TIFF with Deflate compression. The container and compression choice live
//! in a caller-owned [`Codec`] value.
//!
//! The planar float representation itself belongs to `luma-core`; this crate
//! only moves bytes in and out of files. Convenience wrappers
//! ([`Codec::load_planar`], [`Codec::save_planar`], [`Codec::save_gray`])
//! compose the two.

#![warn(missing_docs)]

mod codec;

pub use codec::{Codec, CodecConfig, Compression, Container, DecodedImage};

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while decoding or encoding raster files.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The input file could not be decoded.
    #[error("failed to decode {path}: {reason}")]
    Decode {
        /// Input path
        path: PathBuf,
        /// Underlying decoder diagnostic
        reason: String,
    },

    /// The output file could not be encoded.
    #[error("failed to encode {path}: {reason}")]
    Encode {
        /// Output path
        path: PathBuf,
        /// Underlying encoder diagnostic
        reason: String,
    },

    /// Filesystem failure outside the codec itself.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Buffer shape or allocation failure from the core image model.
    #[error(transparent)]
    Core(#[from] luma_core::Error),
}

/// Result type alias using [`CodecError`].
pub type CodecResult<T> = Result<T, CodecError>;

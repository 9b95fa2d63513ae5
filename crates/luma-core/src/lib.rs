//! # luma-core
//!
//! Host-side image model for the luma colour pipeline.
//!
//! This crate provides the foundational types shared by the rest of the
//! workspace:
//!
//! - [`PlanarImage`] - four independently-owned `f32` channel planes in `[0, 1]`
//! - [`interleave_bgr`] / [`PlanarImage::from_bgra_bytes`] - conversion between
//!   packed codec byte buffers and channel planes
//! - [`normalize`] - semi-positive classification and 8-bit quantization for
//!   single-buffer float images
//! - [`Error`] / [`Result`] - shared error type
//!
//! ## Crate Structure
//!
//! `luma-core` has no internal dependencies; the other workspace crates build
//! on it:
//!
//! ```text
//! luma-core (this crate)
//!    ^
//!    |
//!    +-- luma-compute (device buffers are filled from / drained into planes)
//!    +-- luma-io      (codec adapter produces/consumes packed byte buffers)
//!    +-- luma-cli
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod image;
pub mod normalize;

pub use error::{Error, Result};
pub use image::{interleave_bgr, row_stride, PlanarImage, BGRA_BPP, BGR_BPP};
pub use normalize::{classify, max_abs, quantize, to_bgr_gray, Classification};

//! Embedded OpenCL kernel source.

/// Embedded OpenCL kernel source for the colour pipeline: `rgb_to_xyy`,
/// `xyy_to_xyz`, `xyz_to_rgb_out`, and `xyz_to_luma`. The CPU backend in
/// [`crate::cpu`] registers host implementations of the same kernels under
/// the same names.
pub const COLORSPACE_KERNEL_SOURCE: &str = include_str!("kernels/colorspace.cl");

//! Scalar colour-space conversions shared by the CPU kernels.
//!
//! The OpenCL kernel source in `kernels/colorspace.cl` implements the same
//! math; the two must stay in sync. Matrices are linear sRGB <-> CIE XYZ
//! under D65.

/// Linear sRGB to CIE XYZ (D65).
#[inline]
pub fn rgb_to_xyz(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    (
        0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b,
        0.212_672_9 * r + 0.715_152_2 * g + 0.072_175_0 * b,
        0.019_333_9 * r + 0.119_192_0 * g + 0.950_304_1 * b,
    )
}

/// CIE XYZ (D65) to linear sRGB.
#[inline]
pub fn xyz_to_rgb(x: f32, y: f32, z: f32) -> (f32, f32, f32) {
    (
        3.240_454_2 * x - 1.537_138_5 * y - 0.498_531_4 * z,
        -0.969_266_0 * x + 1.876_010_8 * y + 0.041_556_0 * z,
        0.055_643_4 * x - 0.204_025_9 * y + 1.057_225_2 * z,
    )
}

/// CIE XYZ to chromaticity + luminance (x, y, Y).
///
/// A black sample (X+Y+Z == 0) maps to (0, 0, 0) rather than dividing by
/// zero; `xyy_to_xyz` treats y == 0 the same way, so the pair round-trips.
#[inline]
pub fn xyz_to_xyy(x: f32, y: f32, z: f32) -> (f32, f32, f32) {
    let sum = x + y + z;
    if sum == 0.0 {
        (0.0, 0.0, 0.0)
    } else {
        (x / sum, y / sum, y)
    }
}

/// Chromaticity + luminance (x, y, Y) back to CIE XYZ.
#[inline]
pub fn xyy_to_xyz(x: f32, y: f32, big_y: f32) -> (f32, f32, f32) {
    if y == 0.0 {
        (0.0, 0.0, 0.0)
    } else {
        (x * big_y / y, big_y, (1.0 - x - y) * big_y / y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rgb_xyz_round_trip() {
        for &(r, g, b) in &[(0.2f32, 0.4f32, 0.8f32), (1.0, 1.0, 1.0), (0.0, 0.5, 0.0)] {
            let (x, y, z) = rgb_to_xyz(r, g, b);
            let (r2, g2, b2) = xyz_to_rgb(x, y, z);
            assert_relative_eq!(r, r2, epsilon = 1e-5);
            assert_relative_eq!(g, g2, epsilon = 1e-5);
            assert_relative_eq!(b, b2, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_xyy_round_trip() {
        let (x, y, z) = rgb_to_xyz(0.3, 0.6, 0.1);
        let (cx, cy, by) = xyz_to_xyy(x, y, z);
        let (x2, y2, z2) = xyy_to_xyz(cx, cy, by);
        assert_relative_eq!(x, x2, epsilon = 1e-6);
        assert_relative_eq!(y, y2, epsilon = 1e-6);
        assert_relative_eq!(z, z2, epsilon = 1e-6);
    }

    #[test]
    fn test_black_is_stable() {
        let (cx, cy, by) = xyz_to_xyy(0.0, 0.0, 0.0);
        assert_eq!((cx, cy, by), (0.0, 0.0, 0.0));
        assert_eq!(xyy_to_xyz(cx, cy, by), (0.0, 0.0, 0.0));
    }
}

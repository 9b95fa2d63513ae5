//! Planar float image model and packed-buffer conversion.
//!
//! A [`PlanarImage`] stores each colour channel as an independent contiguous
//! `Vec<f32>` of normalized samples in `[0, 1]`, rather than interleaved
//! per-pixel. This is the host-side representation fed to (and read back
//! from) the compute pipeline, which operates on one plane per device buffer.
//!
//! Packed byte buffers use the codec byte order: BGRA at 4 bytes/pixel on the
//! decode side, BGR at 3 bytes/pixel on the encode side, row-major with a
//! byte-aligned row stride.

use rayon::prelude::*;

use crate::error::{Error, Result};

/// Bytes per pixel for packed BGRA input buffers.
pub const BGRA_BPP: usize = 4;

/// Bytes per pixel for packed BGR output buffers.
pub const BGR_BPP: usize = 3;

/// Row stride in bytes for a packed format, rounded up to a byte boundary.
///
/// `(width * bpp * 8 + 7) / 8` — for whole-byte pixel formats this equals
/// `width * bpp`, but write paths must derive stride through this helper
/// rather than assume no padding, so sub-byte or padded formats keep working.
#[inline]
pub fn row_stride(width: u32, bytes_per_pixel: usize) -> usize {
    (width as usize * bytes_per_pixel * 8 + 7) / 8
}

/// Image stored as four independently-owned channel planes of `f32`.
///
/// Invariant: either all four planes have length `width * height`, or the
/// image is the uninitialized empty state (`width == height == 0`, all planes
/// empty). Construction enforces this; accessors may rely on it.
#[derive(Debug, Clone, Default)]
pub struct PlanarImage {
    width: u32,
    height: u32,
    r: Vec<f32>,
    g: Vec<f32>,
    b: Vec<f32>,
    a: Vec<f32>,
}

/// Allocate one channel plane, reporting failure instead of aborting.
///
/// Planes already allocated by the caller are released by drop when this
/// returns an error, so a partial allocation never leaks out of a
/// constructor.
fn alloc_plane(len: usize) -> Result<Vec<f32>> {
    let mut plane = Vec::new();
    plane.try_reserve_exact(len).map_err(|e| {
        // The byte size itself can overflow for the lengths that fail here.
        let bytes = len.saturating_mul(std::mem::size_of::<f32>());
        Error::allocation(bytes, e.to_string())
    })?;
    plane.resize(len, 0.0);
    Ok(plane)
}

impl PlanarImage {
    /// Creates the uninitialized empty image (0x0, no samples).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a zero-filled image of the given dimensions.
    ///
    /// Fails with [`Error::Allocation`] if any of the four planes cannot be
    /// allocated; in that case no plane is retained.
    pub fn with_dimensions(width: u32, height: u32) -> Result<Self> {
        let len = pixel_count(width, height)?;
        let r = alloc_plane(len)?;
        let g = alloc_plane(len)?;
        let b = alloc_plane(len)?;
        let a = alloc_plane(len)?;
        Ok(Self {
            width,
            height,
            r,
            g,
            b,
            a,
        })
    }

    /// Builds an image from four existing planes.
    ///
    /// All planes must have length `width * height`.
    pub fn from_planes(
        width: u32,
        height: u32,
        r: Vec<f32>,
        g: Vec<f32>,
        b: Vec<f32>,
        a: Vec<f32>,
    ) -> Result<Self> {
        let len = pixel_count(width, height)?;
        for (what, plane) in [("red", &r), ("green", &g), ("blue", &b), ("alpha", &a)] {
            if plane.len() != len {
                return Err(Error::DimensionMismatch {
                    what,
                    expected: len,
                    got: plane.len(),
                });
            }
        }
        Ok(Self {
            width,
            height,
            r,
            g,
            b,
            a,
        })
    }

    /// Unpacks a BGRA byte buffer (4 bytes/pixel, no row padding) into
    /// channel planes, dividing each byte by 255.
    ///
    /// The buffer length must be exactly `width * height * 4`. On a plane
    /// allocation failure nothing is retained and [`Error::Allocation`] is
    /// returned.
    pub fn from_bgra_bytes(packed: &[u8], width: u32, height: u32) -> Result<Self> {
        let len = pixel_count(width, height)?;
        let expected = len * BGRA_BPP;
        if packed.len() != expected {
            return Err(Error::dimension_mismatch(
                "packed BGRA buffer",
                expected,
                packed.len(),
            ));
        }

        let mut image = Self::with_dimensions(width, height)?;

        let unpack = |plane: &mut [f32], offset: usize| {
            plane
                .par_iter_mut()
                .zip(packed.par_chunks_exact(BGRA_BPP))
                .for_each(|(dst, px)| *dst = px[offset] as f32 / 255.0);
        };
        unpack(&mut image.b, 0);
        unpack(&mut image.g, 1);
        unpack(&mut image.r, 2);
        unpack(&mut image.a, 3);

        Ok(image)
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Samples per plane (`width * height`).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.r.len()
    }

    /// `true` for the uninitialized empty state.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 && self.height == 0
    }

    /// Red channel plane.
    #[inline]
    pub fn red(&self) -> &[f32] {
        &self.r
    }

    /// Green channel plane.
    #[inline]
    pub fn green(&self) -> &[f32] {
        &self.g
    }

    /// Blue channel plane.
    #[inline]
    pub fn blue(&self) -> &[f32] {
        &self.b
    }

    /// Alpha channel plane.
    #[inline]
    pub fn alpha(&self) -> &[f32] {
        &self.a
    }
}

/// Interleaves three `[0, 1]` float planes into a packed BGR byte buffer
/// (3 bytes/pixel, byte-aligned rows).
///
/// Each sample is multiplied by 255 and truncated toward zero. Samples
/// outside `[0, 1]` are the caller's responsibility: they are not clamped
/// here and the final cast saturates at the `u8` range.
pub fn interleave_bgr(r: &[f32], g: &[f32], b: &[f32], width: u32, height: u32) -> Result<Vec<u8>> {
    let len = pixel_count(width, height)?;
    for (what, plane) in [("red", r), ("green", g), ("blue", b)] {
        if plane.len() != len {
            return Err(Error::DimensionMismatch {
                what,
                expected: len,
                got: plane.len(),
            });
        }
    }

    let stride = row_stride(width, BGR_BPP);
    let total = stride * height as usize;
    let mut packed = Vec::new();
    packed
        .try_reserve_exact(total)
        .map_err(|e| Error::allocation(total, e.to_string()))?;
    packed.resize(total, 0);
    if len == 0 {
        return Ok(packed);
    }

    // Row-by-row so a stride wider than width * bpp keeps its padding bytes
    // at the end of each row instead of shearing pixels across rows.
    let width = width as usize;
    packed
        .par_chunks_exact_mut(stride)
        .zip(
            r.par_chunks_exact(width)
                .zip(g.par_chunks_exact(width))
                .zip(b.par_chunks_exact(width)),
        )
        .for_each(|(row, ((r_row, g_row), b_row))| {
            row.chunks_exact_mut(BGR_BPP)
                .zip(r_row.iter().zip(g_row.iter()).zip(b_row.iter()))
                .for_each(|(px, ((rv, gv), bv))| {
                    px[0] = (bv * 255.0) as u8;
                    px[1] = (gv * 255.0) as u8;
                    px[2] = (rv * 255.0) as u8;
                });
        });

    Ok(packed)
}

#[inline]
fn pixel_count(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| Error::invalid_dimensions(width, height, "pixel count overflows"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_image() {
        let img = PlanarImage::empty();
        assert!(img.is_empty());
        assert_eq!(img.pixel_count(), 0);
        assert!(img.red().is_empty());
    }

    #[test]
    fn test_row_stride_byte_aligned() {
        assert_eq!(row_stride(4, BGR_BPP), 12);
        assert_eq!(row_stride(1, BGR_BPP), 3);
        assert_eq!(row_stride(640, BGRA_BPP), 2560);
    }

    #[test]
    fn test_from_bgra_bytes_order() {
        // One pixel: B=255, G=0, R=127, A=255
        let packed = [255u8, 0, 127, 255];
        let img = PlanarImage::from_bgra_bytes(&packed, 1, 1).unwrap();
        assert_eq!(img.blue()[0], 1.0);
        assert_eq!(img.green()[0], 0.0);
        assert_relative_eq!(img.red()[0], 127.0 / 255.0, epsilon = 1e-6);
        assert_eq!(img.alpha()[0], 1.0);
    }

    #[test]
    fn test_from_bgra_bytes_length_check() {
        let packed = [0u8; 7];
        let err = PlanarImage::from_bgra_bytes(&packed, 1, 2).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn test_interleave_bgr_truncates() {
        // 0.999 * 255 = 254.745 -> truncates to 254, not rounds to 255
        let packed = interleave_bgr(&[0.999], &[0.5], &[0.0], 1, 1).unwrap();
        assert_eq!(packed, vec![0, 127, 254]);
    }

    #[test]
    fn test_interleave_bgr_row_major() {
        // 3x2: every sample distinct, so any row shear would show up. The
        // half-step keeps truncation away from the representation boundary.
        let r: Vec<f32> = (0..6).map(|i| (i as f32 + 0.5) / 255.0).collect();
        let g: Vec<f32> = (0..6).map(|i| (10 + i) as f32 + 0.5).map(|v| v / 255.0).collect();
        let b: Vec<f32> = (0..6).map(|i| (20 + i) as f32 + 0.5).map(|v| v / 255.0).collect();
        let packed = interleave_bgr(&r, &g, &b, 3, 2).unwrap();

        let stride = row_stride(3, BGR_BPP);
        for y in 0..2usize {
            for x in 0..3usize {
                let i = y * 3 + x;
                let off = y * stride + x * BGR_BPP;
                assert_eq!(packed[off], 20 + i as u8);
                assert_eq!(packed[off + 1], 10 + i as u8);
                assert_eq!(packed[off + 2], i as u8);
            }
        }
    }

    #[test]
    fn test_round_trip_within_quantization() {
        let packed: Vec<u8> = (0..4 * 4)
            .flat_map(|i| [i as u8 * 16, 255 - i as u8 * 16, i as u8 * 7, 0])
            .collect();
        let img = PlanarImage::from_bgra_bytes(&packed, 4, 4).unwrap();
        let out = interleave_bgr(img.red(), img.green(), img.blue(), 4, 4).unwrap();
        for (i, px) in out.chunks_exact(BGR_BPP).enumerate() {
            let src = &packed[i * BGRA_BPP..i * BGRA_BPP + 3];
            for c in 0..3 {
                let diff = (px[c] as i16 - src[c] as i16).abs();
                assert!(diff <= 1, "pixel {i} channel {c}: {} vs {}", px[c], src[c]);
            }
        }
    }

    #[test]
    fn test_allocation_failure_leaves_nothing() {
        // width*height fits in usize but the byte size of one f32 plane
        // overflows isize, so try_reserve_exact reports capacity overflow.
        // Building the error must not overflow either; the reported byte
        // count saturates.
        let err = PlanarImage::with_dimensions(u32::MAX, u32::MAX).unwrap_err();
        assert!(err.is_allocation_error());
        assert!(err.to_string().contains(&usize::MAX.to_string()));
    }

    #[test]
    fn test_from_planes_rejects_short_plane() {
        let err = PlanarImage::from_planes(2, 2, vec![0.0; 4], vec![0.0; 3], vec![0.0; 4], vec![0.0; 4])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch { what: "green", .. }
        ));
    }
}

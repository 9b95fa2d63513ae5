//! Intensity normalization for single-buffer float images.
//!
//! Used when a raw interleaved float buffer (one sample per pixel, not yet
//! split into independently-scaled channels) is written out as an 8-bit
//! greyscale BGR image. The buffer is classified as semi-positive or signed,
//! scaled by its maximum absolute magnitude, and quantized with truncation
//! toward zero.

use rayon::prelude::*;

use crate::error::Result;
use crate::image::{row_stride, BGR_BPP};

/// Sign classification of a float image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Every sample is `>= 0`; samples map directly onto `[0, 255]`.
    SemiPositive,
    /// At least one sample is negative; `[-max_abs, max_abs]` maps onto
    /// `[0, 255]` with zero at the midpoint.
    Signed,
}

/// Classifies an image as semi-positive or signed.
///
/// An empty image classifies as semi-positive.
pub fn classify(samples: &[f32]) -> Classification {
    if samples.iter().all(|&s| s >= 0.0) {
        Classification::SemiPositive
    } else {
        Classification::Signed
    }
}

/// Maximum absolute magnitude over all samples; `0.0` for an empty image.
pub fn max_abs(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, &s| m.max(s.abs()))
}

/// Quantizes one sample to `u8` with truncation toward zero.
///
/// `max_abs == 0.0` (an all-zero image) is a valid degenerate case and maps
/// every sample to 0 rather than propagating NaN/Inf into the cast. A sample
/// equal to `max_abs` maps to exactly 255 under either classification.
#[inline]
pub fn quantize(sample: f32, max_abs: f32, class: Classification) -> u8 {
    if max_abs == 0.0 {
        return 0;
    }
    match class {
        Classification::SemiPositive => ((sample / max_abs) * 255.0) as u8,
        Classification::Signed => (((sample / max_abs + 1.0) / 2.0) * 255.0) as u8,
    }
}

/// Converts a single-channel float buffer into a replicated-grey packed BGR
/// buffer (`b = g = r`, 3 bytes/pixel, byte-aligned rows).
pub fn to_bgr_gray(samples: &[f32], width: u32, height: u32) -> Result<Vec<u8>> {
    let expected = width as usize * height as usize;
    if samples.len() != expected {
        return Err(crate::error::Error::dimension_mismatch(
            "grey float buffer",
            expected,
            samples.len(),
        ));
    }

    let class = classify(samples);
    let max = max_abs(samples);

    let stride = row_stride(width, BGR_BPP);
    let total = stride * height as usize;
    let mut packed = Vec::new();
    packed
        .try_reserve_exact(total)
        .map_err(|e| crate::error::Error::allocation(total, e.to_string()))?;
    packed.resize(total, 0);
    if expected == 0 {
        return Ok(packed);
    }

    packed
        .par_chunks_exact_mut(stride)
        .zip(samples.par_chunks_exact(width as usize))
        .for_each(|(row, sample_row)| {
            row.chunks_exact_mut(BGR_BPP)
                .zip(sample_row.iter())
                .for_each(|(px, &s)| {
                    let v = quantize(s, max, class);
                    px[0] = v;
                    px[1] = v;
                    px[2] = v;
                });
        });
    Ok(packed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_all_zero_is_semi_positive() {
        assert_eq!(classify(&[0.0, 0.0, 0.0]), Classification::SemiPositive);
        assert_eq!(classify(&[]), Classification::SemiPositive);
    }

    #[test]
    fn test_classify_negative_is_signed() {
        assert_eq!(classify(&[0.5, -0.001, 1.0]), Classification::Signed);
    }

    #[test]
    fn test_max_abs() {
        assert_eq!(max_abs(&[]), 0.0);
        assert_eq!(max_abs(&[0.25, -0.75, 0.5]), 0.75);
    }

    #[test]
    fn test_quantize_degenerate_all_zero() {
        // No NaN/Inf leaks into the cast
        assert_eq!(quantize(0.0, 0.0, Classification::SemiPositive), 0);
        assert_eq!(quantize(0.0, 0.0, Classification::Signed), 0);
    }

    #[test]
    fn test_quantize_semi_positive_endpoint() {
        // sample == max_abs maps to exactly 255 (1.0 * 255.0 truncates to 255)
        assert_eq!(quantize(2.0, 2.0, Classification::SemiPositive), 255);
        assert_eq!(quantize(0.0, 2.0, Classification::SemiPositive), 0);
    }

    #[test]
    fn test_quantize_signed_endpoints() {
        assert_eq!(quantize(-1.0, 1.0, Classification::Signed), 0);
        assert_eq!(quantize(1.0, 1.0, Classification::Signed), 255);
        // zero sits at the midpoint, truncated
        assert_eq!(quantize(0.0, 1.0, Classification::Signed), 127);
    }

    #[test]
    fn test_to_bgr_gray_all_zero() {
        let packed = to_bgr_gray(&[0.0; 6], 3, 2).unwrap();
        assert_eq!(packed.len(), 18);
        assert!(packed.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_to_bgr_gray_replicates_channels() {
        let packed = to_bgr_gray(&[1.0, 0.5], 2, 1).unwrap();
        assert_eq!(&packed[0..3], &[255, 255, 255]);
        assert_eq!(&packed[3..6], &[127, 127, 127]);
    }
}

//! Error types for luma-core operations.
//!
//! This module provides the shared error type for the host-side image model:
//! plane allocation, packed-buffer conversion, and normalization.
//!
//! # Overview
//!
//! The [`Error`] enum covers failure modes that can occur during:
//! - Channel plane allocation (fallible, via `try_reserve_exact`)
//! - Packed byte buffer (de)interleaving
//! - Stride/length validation on write paths
//!
//! Device-side and codec errors live in their own crates (`luma-compute`,
//! `luma-io`) and reference these variants only where they cross the
//! host-image boundary.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the planar image model.
#[derive(Debug, Error)]
pub enum Error {
    /// Memory allocation for a channel plane failed.
    ///
    /// Returned when a channel buffer cannot be reserved. When any of the
    /// four planes of an image fails to allocate, planes allocated earlier
    /// in the same call are dropped before the error is returned, so the
    /// caller never observes a partially-built image.
    #[error("failed to allocate {requested} bytes: {reason}")]
    Allocation {
        /// Bytes requested
        requested: usize,
        /// Failure reason
        reason: String,
    },

    /// Buffer length does not match the expected dimensions.
    ///
    /// Returned when a packed pixel buffer or a channel plane has a length
    /// inconsistent with `width * height` (times bytes-per-pixel for packed
    /// buffers).
    #[error("{what}: expected length {expected}, got {got}")]
    DimensionMismatch {
        /// Which buffer failed validation
        what: &'static str,
        /// Expected element count
        expected: usize,
        /// Actual element count
        got: usize,
    },

    /// Invalid image dimensions.
    ///
    /// Returned when `width * height` overflows or a zero dimension is
    /// paired with non-empty data.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates an [`Error::Allocation`] error.
    #[inline]
    pub fn allocation(requested: usize, reason: impl Into<String>) -> Self {
        Self::Allocation {
            requested,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::DimensionMismatch`] error.
    #[inline]
    pub fn dimension_mismatch(what: &'static str, expected: usize, got: usize) -> Self {
        Self::DimensionMismatch {
            what,
            expected,
            got,
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is an allocation error.
    #[inline]
    pub fn is_allocation_error(&self) -> bool {
        matches!(self, Self::Allocation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_error() {
        let err = Error::allocation(1024 * 1024 * 1024, "capacity overflow");
        assert!(err.to_string().contains("capacity overflow"));
        assert!(err.is_allocation_error());
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = Error::dimension_mismatch("packed buffer", 400, 399);
        let msg = err.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("399"));
        assert!(!err.is_allocation_error());
    }
}

//! File codec: raster decode to packed BGRA, packed BGR encode to TIFF.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use luma_core::{image as core_image, normalize, Error as CoreError, PlanarImage};
use tracing::debug;

use crate::{CodecError, CodecResult};

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Container {
    /// Tagged Image File Format.
    #[default]
    Tiff,
}

/// Output compression scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// ZIP/Deflate compression (lossless).
    #[default]
    Deflate,
}

/// Container and compression selection for encoded output.
///
/// Only TIFF with Deflate exists today; the config still travels through
/// [`Codec`] so the choice is owned by the caller rather than pinned in the
/// encode path.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecConfig {
    /// Output container.
    pub container: Container,
    /// Output compression.
    pub compression: Compression,
}

/// A decoded raster image as packed bytes.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Packed pixel bytes in B, G, R, A channel order.
    pub bytes: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Always 4 (BGRA).
    pub bytes_per_pixel: usize,
}

/// Caller-owned codec handle.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    /// Creates a codec with the given output configuration.
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// The output configuration this codec encodes with.
    pub fn config(&self) -> CodecConfig {
        self.config
    }

    /// Decodes a raster file into packed BGRA bytes.
    ///
    /// Accepts any input format the `image` crate is compiled for; only the
    /// first frame of multi-frame files is read. Pixels are converted to
    /// 8-bit RGBA and repacked in BGRA channel order.
    pub fn decode_file(&self, path: impl AsRef<Path>) -> CodecResult<DecodedImage> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|e| match e {
            image::ImageError::IoError(io) => CodecError::Io(io),
            other => CodecError::Decode {
                path: path.to_path_buf(),
                reason: other.to_string(),
            },
        })?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut bytes = rgba.into_raw();
        for px in bytes.chunks_exact_mut(core_image::BGRA_BPP) {
            px.swap(0, 2);
        }

        debug!(path = %path.display(), width, height, "decoded raster file");
        Ok(DecodedImage {
            bytes,
            width,
            height,
            bytes_per_pixel: core_image::BGRA_BPP,
        })
    }

    /// Encodes packed BGR bytes (3 bytes per pixel) to a compressed TIFF.
    ///
    /// The buffer length must equal `row_stride(width, 3) * height`.
    pub fn encode_file(
        &self,
        path: impl AsRef<Path>,
        bgr: &[u8],
        width: u32,
        height: u32,
    ) -> CodecResult<()> {
        use tiff::encoder::{colortype, Compression as TiffCompression, DeflateLevel, TiffEncoder};

        let path = path.as_ref();
        let expected = core_image::row_stride(width, core_image::BGR_BPP) * height as usize;
        if bgr.len() != expected {
            return Err(CodecError::Core(CoreError::dimension_mismatch(
                "packed BGR buffer",
                expected,
                bgr.len(),
            )));
        }

        let mut rgb = bgr.to_vec();
        for px in rgb.chunks_exact_mut(core_image::BGR_BPP) {
            px.swap(0, 2);
        }

        let encode_err = |reason: String| CodecError::Encode {
            path: path.to_path_buf(),
            reason,
        };

        // Container::Tiff / Compression::Deflate are the only variants; the
        // match keeps the config honest if another is ever added.
        let compression = match (self.config.container, self.config.compression) {
            (Container::Tiff, Compression::Deflate) => {
                TiffCompression::Deflate(DeflateLevel::default())
            }
        };

        let file = File::create(path)?;
        let mut encoder = TiffEncoder::new(BufWriter::new(file))
            .map_err(|e| encode_err(e.to_string()))?
            .with_compression(compression);
        encoder
            .write_image::<colortype::RGB8>(width, height, &rgb)
            .map_err(|e| encode_err(e.to_string()))?;

        debug!(path = %path.display(), width, height, "encoded TIFF");
        Ok(())
    }

    /// Decodes a raster file straight into the planar float representation.
    pub fn load_planar(&self, path: impl AsRef<Path>) -> CodecResult<PlanarImage> {
        let decoded = self.decode_file(path)?;
        let image =
            PlanarImage::from_bgra_bytes(&decoded.bytes, decoded.width, decoded.height)?;
        Ok(image)
    }

    /// Interleaves three colour planes and encodes them.
    pub fn save_planar(
        &self,
        path: impl AsRef<Path>,
        r: &[f32],
        g: &[f32],
        b: &[f32],
        width: u32,
        height: u32,
    ) -> CodecResult<()> {
        let bgr = core_image::interleave_bgr(r, g, b, width, height)?;
        self.encode_file(path, &bgr, width, height)
    }

    /// Normalizes a single float plane to greyscale BGR and encodes it.
    pub fn save_gray(
        &self,
        path: impl AsRef<Path>,
        samples: &[f32],
        width: u32,
        height: u32,
    ) -> CodecResult<()> {
        let bgr = normalize::to_bgr_gray(samples, width, height)?;
        self.encode_file(path, &bgr, width, height)
    }
}

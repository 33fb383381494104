//! # pngopt
//!
//! A minimal PNG codec with a popularity-based palette quantizer. Images are
//! decoded to RGBA, reduced to at most 256 colors and written back as 8-bit
//! indexed PNGs.
//!
//! ## Features
//!
//! - **Decoder**: 8-bit RGB and RGBA, plus paletted images at 1/2/4/8 bits
//! - **Quantizer**: exact color histogram, top-N palette with white preservation
//! - **Encoder**: indexed PNG with `PLTE`, `tRNS` and a single `IDAT`
//!
//! ## Quick Start
//!
//! ```ignore
//! use pngopt::{optimize_png, OptimizeOptions};
//!
//! let data = std::fs::read("icon.png")?;
//! let optimized = optimize_png(&data, &OptimizeOptions::default())?;
//! std::fs::write("icon_opt.png", &optimized.png)?;
//! ```
//!
//! ### Quantizing a decoded image
//!
//! ```ignore
//! use pngopt::{encode_indexed, quantize, Histogram, Palette};
//!
//! let hist = Histogram::from_rgba(&image.pixels);
//! let palette = Palette::build(&hist, 16)?;
//! let indices = quantize(&image.pixels, &palette);
//! let png = encode_indexed(image.width, image.height, &palette, &indices)?;
//! ```

use std::path::PathBuf;

use thiserror::Error;

pub mod batch;
pub mod chunk;
pub mod color;
pub mod crc;
pub mod decoder;
pub mod encoder;
pub mod filter;
pub mod histogram;
pub mod optimize;
pub mod palette;
pub mod quantize;
pub mod zlib;

pub use batch::{process_target, BatchReport, Failure, FailureKind, Fallback, Outcome};
pub use color::ColorType;
pub use decoder::{decode_png, DecodeOptions, Header, Image};
pub use encoder::encode_indexed;
pub use histogram::{ColorKey, Histogram};
pub use optimize::{optimize_file, optimize_png, output_path_for, Optimized, OptimizeOptions, OutputMode};
pub use palette::{Palette, PaletteEntry};
pub use quantize::{nearest_index, quantize};

/// Errors that can occur while decoding, quantizing or writing a PNG.
#[derive(Debug, Error)]
pub enum PngOptError {
    /// The first eight bytes are not the PNG signature
    #[error("invalid PNG signature")]
    InvalidSignature,

    /// A chunk header, payload or CRC runs past the end of the data
    #[error("truncated chunk at offset {offset}")]
    TruncatedChunk { offset: usize },

    /// A chunk required to decode the image was never seen
    #[error("missing {0} chunk")]
    MissingChunk(&'static str),

    /// A chunk is present but its payload is malformed
    #[error("invalid {chunk} chunk: {reason}")]
    InvalidChunk { chunk: String, reason: String },

    /// Stored CRC differs from the computed one (only with CRC verification on)
    #[error("CRC mismatch in {chunk} chunk: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        chunk: String,
        stored: u32,
        computed: u32,
    },

    /// Color type, bit depth or interlace method outside the supported set
    #[error("unsupported PNG: {0}")]
    Unsupported(String),

    /// Width or height is zero or too large
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// The zlib stream is corrupt or does not terminate
    #[error("decompression failed: {0}")]
    Decompression(String),

    /// The zlib stream inflated to a different size than the header implies
    #[error("decompressed size mismatch: expected {expected} bytes, got {actual}")]
    DecompressedSizeMismatch { expected: usize, actual: usize },

    /// A scanline starts with a filter byte outside 0..=4
    #[error("unknown filter type {0}")]
    UnknownFilterType(u8),

    /// No pixels to build a palette from
    #[error("image has no pixels")]
    EmptyImage,

    /// Deflate failed on the write path
    #[error("compression failed: {0}")]
    Compression(String),

    /// Output path exceeds the supported length
    #[error("path too long: {}", .0.display())]
    PathTooLong(PathBuf),

    /// Reading the input or writing the output failed
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PngOptError {
    /// Returns true for errors caused by the input bytes rather than the
    /// environment. These are the cases where the external helper may still
    /// be able to handle the file.
    pub fn is_format_error(&self) -> bool {
        !matches!(
            self,
            PngOptError::Io { .. } | PngOptError::PathTooLong(_) | PngOptError::Compression(_)
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PngOptError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for pngopt operations.
pub type Result<T> = core::result::Result<T, PngOptError>;

/// Default number of palette entries.
pub const DEFAULT_COLOR_LIMIT: u16 = 64;

/// Largest palette an indexed PNG can carry.
pub const MAX_PALETTE_SIZE: usize = 256;

// Longest output path accepted, in bytes
pub(crate) const MAX_PATH_LEN: usize = 2048;

/// Clamps a requested color limit into `1..=256`.
#[inline]
pub fn clamp_color_limit(limit: u16) -> usize {
    (limit as usize).clamp(1, MAX_PALETTE_SIZE)
}

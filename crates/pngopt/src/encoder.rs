//! Indexed PNG writer.
//!
//! The output layout is fixed: `IHDR` (8-bit, color type 3, no interlace),
//! `PLTE`, `tRNS` (always present, one byte per entry), one `IDAT` holding
//! every row with filter type None, then `IEND`.

use crate::chunk::{write_chunk, IDAT, IEND, IHDR, PLTE, SIGNATURE, TRNS};
use crate::filter::filter_none_scanlines;
use crate::palette::Palette;
use crate::zlib::deflate_best;
use crate::{PngOptError, Result};

/// Encode palette indices as an 8-bit indexed PNG.
///
/// `indices` holds one palette index per pixel in row-major order.
///
/// # Errors
///
/// Returns an error if the dimensions are zero, `indices` does not hold
/// `width * height` entries, an index is outside the palette, or compression
/// fails.
pub fn encode_indexed(width: u32, height: u32, palette: &Palette, indices: &[u8]) -> Result<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(PngOptError::InvalidDimensions { width, height });
    }
    let expected = width as usize * height as usize;
    if indices.len() != expected {
        return Err(PngOptError::DecompressedSizeMismatch {
            expected,
            actual: indices.len(),
        });
    }
    if palette.is_empty() {
        return Err(PngOptError::EmptyImage);
    }
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= palette.len()) {
        return Err(PngOptError::InvalidChunk {
            chunk: "IDAT".into(),
            reason: format!("index {bad} outside palette of {}", palette.len()),
        });
    }

    let scanlines = filter_none_scanlines(indices, width as usize);
    let compressed = deflate_best(&scanlines)?;
    drop(scanlines);

    let mut out = Vec::with_capacity(8 + 25 + 12 + palette.len() * 4 + 12 + compressed.len() + 12 + 12);
    out.extend_from_slice(&SIGNATURE);

    let mut ihdr = [0u8; 13];
    ihdr[0..4].copy_from_slice(&width.to_be_bytes());
    ihdr[4..8].copy_from_slice(&height.to_be_bytes());
    ihdr[8] = 8; // bit depth
    ihdr[9] = 3; // indexed color
    // compression, filter and interlace methods stay 0
    write_chunk(&mut out, &IHDR, &ihdr);

    write_chunk(&mut out, &PLTE, &palette.plte_bytes());
    write_chunk(&mut out, &TRNS, &palette.trns_bytes());
    write_chunk(&mut out, &IDAT, &compressed);
    write_chunk(&mut out, &IEND, &[]);

    Ok(out)
}

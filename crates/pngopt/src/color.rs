//! Source color models and their conversion to 8-bit RGBA.

use crate::{PngOptError, Result, MAX_PALETTE_SIZE};

/// Color types accepted on the read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ColorType {
    /// Truecolor, 3 bytes per pixel
    Rgb = 2,
    /// Palette indices, 1/2/4/8 bits per pixel
    Indexed = 3,
    /// Truecolor with alpha, 4 bytes per pixel
    Rgba = 6,
}

impl ColorType {
    /// Validate an IHDR color type / bit depth pair.
    pub fn from_header(color_type: u8, bit_depth: u8) -> Result<Self> {
        let ct = match color_type {
            2 => ColorType::Rgb,
            3 => ColorType::Indexed,
            6 => ColorType::Rgba,
            0 | 4 => {
                return Err(PngOptError::Unsupported(format!(
                    "grayscale color type {color_type}"
                )))
            }
            other => return Err(PngOptError::Unsupported(format!("color type {other}"))),
        };

        let depth_ok = match ct {
            ColorType::Indexed => matches!(bit_depth, 1 | 2 | 4 | 8),
            ColorType::Rgb | ColorType::Rgba => bit_depth == 8,
        };
        if !depth_ok {
            return Err(PngOptError::Unsupported(format!(
                "bit depth {bit_depth} for color type {color_type}"
            )));
        }
        Ok(ct)
    }

    /// Samples per pixel.
    pub fn channels(self) -> usize {
        match self {
            ColorType::Rgb => 3,
            ColorType::Indexed => 1,
            ColorType::Rgba => 4,
        }
    }

    /// Bytes per scanline, excluding the filter byte.
    pub fn stride(self, width: usize, bit_depth: u8) -> usize {
        (width * self.channels() * bit_depth as usize).div_ceil(8)
    }

    /// Filter distance: bytes per complete pixel, at least 1.
    pub fn filter_bpp(self, bit_depth: u8) -> usize {
        (self.channels() * bit_depth as usize / 8).max(1)
    }
}

/// Palette of a paletted source image: `PLTE` colors plus `tRNS` alpha.
#[derive(Debug, Clone)]
pub struct SourcePalette {
    colors: [[u8; 4]; MAX_PALETTE_SIZE],
    len: usize,
}

impl SourcePalette {
    /// Build from a `PLTE` payload. Alpha starts fully opaque.
    pub fn from_plte(data: &[u8]) -> Result<Self> {
        if data.len() % 3 != 0 {
            return Err(PngOptError::InvalidChunk {
                chunk: "PLTE".into(),
                reason: format!("length {} is not a multiple of 3", data.len()),
            });
        }
        let len = data.len() / 3;
        if len > MAX_PALETTE_SIZE {
            return Err(PngOptError::InvalidChunk {
                chunk: "PLTE".into(),
                reason: format!("{len} entries exceeds {MAX_PALETTE_SIZE}"),
            });
        }

        let mut colors = [[0, 0, 0, 255]; MAX_PALETTE_SIZE];
        for (slot, rgb) in colors.iter_mut().zip(data.chunks_exact(3)) {
            slot[..3].copy_from_slice(rgb);
        }
        Ok(Self { colors, len })
    }

    /// Apply a `tRNS` payload: one alpha byte per entry, extra bytes ignored.
    pub fn apply_trns(&mut self, alphas: &[u8]) {
        for (slot, &a) in self.colors.iter_mut().zip(alphas) {
            slot[3] = a;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// RGBA for `index`; indices past the declared size are transparent black.
    #[inline]
    pub fn lookup(&self, index: u8) -> [u8; 4] {
        if (index as usize) < self.len {
            self.colors[index as usize]
        } else {
            [0, 0, 0, 0]
        }
    }
}

/// Convert unfiltered scanlines into a flat RGBA buffer.
///
/// `raw` holds `height` rows of `color_type.stride(width, bit_depth)` bytes.
/// `palette` is required for [`ColorType::Indexed`].
pub fn to_rgba(
    raw: &[u8],
    width: usize,
    height: usize,
    color_type: ColorType,
    bit_depth: u8,
    palette: Option<&SourcePalette>,
) -> Result<Vec<u8>> {
    let stride = color_type.stride(width, bit_depth);
    let expected = stride * height;
    if raw.len() != expected {
        return Err(PngOptError::DecompressedSizeMismatch {
            expected,
            actual: raw.len(),
        });
    }

    let mut rgba = Vec::with_capacity(width * height * 4);
    match color_type {
        ColorType::Rgba => rgba.extend_from_slice(raw),
        ColorType::Rgb => {
            for px in raw.chunks_exact(3) {
                rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
            }
        }
        ColorType::Indexed => {
            let palette = palette.ok_or(PngOptError::MissingChunk("PLTE"))?;
            let mut indices = Vec::with_capacity(width);
            for row in raw.chunks_exact(stride) {
                indices.clear();
                unpack_row(row, width, bit_depth, &mut indices);
                for &idx in &indices {
                    rgba.extend_from_slice(&palette.lookup(idx));
                }
            }
        }
    }
    Ok(rgba)
}

/// Unpack `width` indices of `bit_depth` bits from one packed row, MSB first.
pub fn unpack_row(packed: &[u8], width: usize, bit_depth: u8, out: &mut Vec<u8>) {
    if bit_depth == 8 {
        out.extend_from_slice(&packed[..width]);
        return;
    }

    let bits = bit_depth as usize;
    let mask = ((1u16 << bits) - 1) as u8;
    for i in 0..width {
        let bit_pos = i * bits;
        let shift = 8 - bits - (bit_pos % 8);
        out.push((packed[bit_pos / 8] >> shift) & mask);
    }
}

//! Scanline filters.
//!
//! Every scanline is one filter-type byte followed by `stride` filtered bytes.
//! Decoding reconstructs the original bytes from the left, above and
//! above-left neighbours (zero outside the image). Encoding always uses
//! [`FilterType::None`].

use crate::{PngOptError, Result};

/// The five PNG filter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FilterType {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

impl TryFrom<u8> for FilterType {
    type Error = PngOptError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(FilterType::None),
            1 => Ok(FilterType::Sub),
            2 => Ok(FilterType::Up),
            3 => Ok(FilterType::Average),
            4 => Ok(FilterType::Paeth),
            other => Err(PngOptError::UnknownFilterType(other)),
        }
    }
}

/// Reverse the filters of `rows` scanlines of `1 + stride` bytes each.
///
/// `bpp` is the distance in bytes to the corresponding byte of the previous
/// pixel (at least 1 for sub-byte pixel formats). Returns `rows * stride`
/// reconstructed bytes.
pub fn unfilter_scanlines(filtered: &[u8], rows: usize, stride: usize, bpp: usize) -> Result<Vec<u8>> {
    let expected = rows * (stride + 1);
    if filtered.len() != expected {
        return Err(PngOptError::DecompressedSizeMismatch {
            expected,
            actual: filtered.len(),
        });
    }

    let mut out = vec![0u8; rows * stride];
    let zero_row = vec![0u8; stride];

    for (y, line) in filtered.chunks_exact(stride + 1).enumerate() {
        let filter = FilterType::try_from(line[0])?;
        let (done, rest) = out.split_at_mut(y * stride);
        let row = &mut rest[..stride];
        row.copy_from_slice(&line[1..]);

        let prev = if y == 0 {
            &zero_row[..]
        } else {
            &done[(y - 1) * stride..]
        };
        unfilter_row(filter, row, prev, bpp);
    }

    Ok(out)
}

/// Reconstruct one row in place. `prev` is the already reconstructed row above.
pub fn unfilter_row(filter: FilterType, row: &mut [u8], prev: &[u8], bpp: usize) {
    let len = row.len();
    match filter {
        FilterType::None => {}
        FilterType::Sub => {
            for i in bpp..len {
                row[i] = row[i].wrapping_add(row[i - bpp]);
            }
        }
        FilterType::Up => {
            for i in 0..len {
                row[i] = row[i].wrapping_add(prev[i]);
            }
        }
        FilterType::Average => {
            for i in 0..len {
                let left = if i >= bpp { row[i - bpp] as u16 } else { 0 };
                let up = prev[i] as u16;
                row[i] = row[i].wrapping_add(((left + up) >> 1) as u8);
            }
        }
        FilterType::Paeth => {
            for i in 0..len {
                let (left, up_left) = if i >= bpp {
                    (row[i - bpp], prev[i - bpp])
                } else {
                    (0, 0)
                };
                row[i] = row[i].wrapping_add(paeth_predictor(left, prev[i], up_left));
            }
        }
    }
}

/// Paeth predictor: whichever of left, up, up-left is closest to `left + up - up_left`.
/// Ties prefer left, then up.
#[inline]
pub fn paeth_predictor(left: u8, up: u8, up_left: u8) -> u8 {
    let p = left as i16 + up as i16 - up_left as i16;
    let pa = (p - left as i16).abs();
    let pb = (p - up as i16).abs();
    let pc = (p - up_left as i16).abs();

    if pa <= pb && pa <= pc {
        left
    } else if pb <= pc {
        up
    } else {
        up_left
    }
}

/// Prefix every `stride`-byte row of `raw` with filter type None.
pub fn filter_none_scanlines(raw: &[u8], stride: usize) -> Vec<u8> {
    if stride == 0 {
        return Vec::new();
    }
    let rows = raw.len() / stride;
    let mut out = Vec::with_capacity(rows * (stride + 1));
    for row in raw.chunks_exact(stride) {
        out.push(FilterType::None as u8);
        out.extend_from_slice(row);
    }
    out
}

use tracing::debug;

use crate::chunk::{read_be32, ChunkReader, IDAT, IEND, IHDR, PLTE, TRNS};
use crate::color::{to_rgba, ColorType, SourcePalette};
use crate::filter::unfilter_scanlines;
use crate::zlib::inflate_exact;
use crate::{PngOptError, Result};

// PNG limits width and height to 2^31 - 1
const MAX_DIMENSION: u32 = 0x7FFF_FFFF;

/// Options for the PNG decoder.
#[derive(Clone, Debug, Default)]
pub struct DecodeOptions {
    /// Check each chunk's stored CRC and fail on mismatch.
    /// Off by default: the payload is trusted once it parses.
    pub verify_crc: bool,
}

/// A decoded image as 8-bit RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data (4 bytes per pixel: R, G, B, A), row-major
    pub pixels: Vec<u8>,
}

impl Image {
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Parsed `IHDR` contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
}

impl Header {
    /// Parse and validate an `IHDR` payload against the supported subset.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() != 13 {
            return Err(PngOptError::InvalidChunk {
                chunk: "IHDR".into(),
                reason: format!("length {} (expected 13)", data.len()),
            });
        }

        let width = read_be32(&data[0..4]);
        let height = read_be32(&data[4..8]);
        let bit_depth = data[8];
        let color_type = ColorType::from_header(data[9], bit_depth)?;

        if data[10] != 0 {
            return Err(PngOptError::Unsupported(format!(
                "compression method {}",
                data[10]
            )));
        }
        if data[11] != 0 {
            return Err(PngOptError::Unsupported(format!("filter method {}", data[11])));
        }
        if data[12] != 0 {
            return Err(PngOptError::Unsupported("interlaced image".into()));
        }
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(PngOptError::InvalidDimensions { width, height });
        }

        Ok(Self {
            width,
            height,
            bit_depth,
            color_type,
        })
    }

    /// Bytes per scanline, excluding the filter byte.
    pub fn stride(&self) -> usize {
        self.color_type.stride(self.width as usize, self.bit_depth)
    }

    /// Size of the inflated `IDAT` stream: every row plus its filter byte.
    pub fn scanline_bytes(&self) -> Result<usize> {
        (self.stride() + 1)
            .checked_mul(self.height as usize)
            .ok_or(PngOptError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })
    }
}

/// Decode a PNG from memory into RGBA.
///
/// Accepts 8-bit RGB and RGBA and paletted images at 1, 2, 4 or 8 bits, all
/// non-interlaced. `IDAT` payloads are joined in file order and inflated as
/// one stream. Chunks other than `IHDR`, `PLTE`, `tRNS`, `IDAT` and `IEND`
/// are skipped.
///
/// # Errors
///
/// Returns a format error for a bad signature, truncated or malformed chunk,
/// unsupported header, missing `IHDR`/`PLTE`/`IDAT`, a zlib stream that does
/// not inflate to exactly the expected size, or an unknown filter type.
pub fn decode_png(data: &[u8], opts: &DecodeOptions) -> Result<Image> {
    let mut header: Option<Header> = None;
    let mut palette: Option<SourcePalette> = None;
    let mut trns: Option<&[u8]> = None;
    let mut idat = Vec::new();
    let mut saw_idat = false;

    for chunk in ChunkReader::new(data)? {
        let chunk = chunk?;
        if opts.verify_crc {
            let computed = chunk.computed_crc();
            if computed != chunk.crc {
                return Err(PngOptError::ChecksumMismatch {
                    chunk: chunk.name(),
                    stored: chunk.crc,
                    computed,
                });
            }
        }

        match chunk.kind {
            IHDR => header = Some(Header::parse(chunk.data)?),
            PLTE => palette = Some(SourcePalette::from_plte(chunk.data)?),
            TRNS => trns = Some(chunk.data),
            IDAT => {
                idat.extend_from_slice(chunk.data);
                saw_idat = true;
            }
            IEND => break,
            _ => debug!(chunk = %chunk.name(), len = chunk.data.len(), "skipping chunk"),
        }
    }

    let header = header.ok_or(PngOptError::MissingChunk("IHDR"))?;
    if !saw_idat {
        return Err(PngOptError::MissingChunk("IDAT"));
    }

    let palette = match header.color_type {
        ColorType::Indexed => {
            let mut palette = palette
                .filter(|p| !p.is_empty())
                .ok_or(PngOptError::MissingChunk("PLTE"))?;
            if let Some(alphas) = trns {
                palette.apply_trns(alphas);
            }
            Some(palette)
        }
        _ => None,
    };

    let scanlines = inflate_exact(&idat, header.scanline_bytes()?)?;
    drop(idat);

    let raw = unfilter_scanlines(
        &scanlines,
        header.height as usize,
        header.stride(),
        header.color_type.filter_bpp(header.bit_depth),
    )?;
    drop(scanlines);

    let pixels = to_rgba(
        &raw,
        header.width as usize,
        header.height as usize,
        header.color_type,
        header.bit_depth,
        palette.as_ref(),
    )?;

    debug!(
        width = header.width,
        height = header.height,
        color_type = ?header.color_type,
        bit_depth = header.bit_depth,
        "decoded PNG"
    );

    Ok(Image {
        width: header.width,
        height: header.height,
        pixels,
    })
}

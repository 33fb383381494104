//! zlib adapter for `IDAT` payloads, backed by flate2.

use std::io::{Read, Write};

use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};

use crate::{PngOptError, Result};

// Cap on the up-front allocation; a lying header cannot force more than this
// before the stream actually produces data.
const INITIAL_CAPACITY: usize = 1 << 20;

/// Inflate a complete zlib stream into a buffer of exactly `expected` bytes.
///
/// The stream must end cleanly and produce exactly `expected` bytes; anything
/// else is a format error.
pub fn inflate_exact(compressed: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected.min(INITIAL_CAPACITY));
    // one byte past the expected size is enough to detect overlong streams
    let limit = (expected as u64).saturating_add(1);
    ZlibDecoder::new(compressed)
        .take(limit)
        .read_to_end(&mut out)
        .map_err(|e| PngOptError::Decompression(e.to_string()))?;

    if out.len() > expected {
        return Err(PngOptError::Decompression(format!(
            "stream continues past {expected} bytes"
        )));
    }
    if out.len() < expected {
        return Err(PngOptError::DecompressedSizeMismatch {
            expected,
            actual: out.len(),
        });
    }
    Ok(out)
}

/// Deflate `raw` into a zlib stream at maximum compression.
pub fn deflate_best(raw: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(raw.len() / 2 + 64), Compression::best());
    encoder
        .write_all(raw)
        .map_err(|e| PngOptError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| PngOptError::Compression(e.to_string()))
}

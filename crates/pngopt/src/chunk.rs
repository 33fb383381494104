//! PNG container framing: signature check, chunk iteration and chunk writing.

use crate::crc::Crc32;
use crate::{PngOptError, Result};

/// The 8-byte PNG file signature.
pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

pub const IHDR: [u8; 4] = *b"IHDR";
pub const PLTE: [u8; 4] = *b"PLTE";
pub const TRNS: [u8; 4] = *b"tRNS";
pub const IDAT: [u8; 4] = *b"IDAT";
pub const IEND: [u8; 4] = *b"IEND";

/// One `(length, type, data, crc)` record borrowed from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub kind: [u8; 4],
    pub data: &'a [u8],
    pub crc: u32,
}

impl Chunk<'_> {
    /// Chunk type as text, for diagnostics.
    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.kind).into_owned()
    }

    /// CRC over `type || data`.
    pub fn computed_crc(&self) -> u32 {
        let mut crc = Crc32::new();
        crc.update(&self.kind);
        crc.update(self.data);
        crc.finalize()
    }
}

/// Iterates over the chunks of a PNG stream.
///
/// Iteration ends after `IEND` or when the data ends exactly on a chunk
/// boundary. A chunk cut short anywhere (length, type, payload or CRC) yields
/// [`PngOptError::TruncatedChunk`] and ends iteration.
#[derive(Debug)]
pub struct ChunkReader<'a> {
    data: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> ChunkReader<'a> {
    /// Verifies the signature and positions the reader on the first chunk.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if data.len() < SIGNATURE.len() || data[..SIGNATURE.len()] != SIGNATURE {
            return Err(PngOptError::InvalidSignature);
        }
        Ok(Self {
            data,
            pos: SIGNATURE.len(),
            done: false,
        })
    }

    fn read_chunk(&mut self) -> Result<Chunk<'a>> {
        let start = self.pos;
        let truncated = PngOptError::TruncatedChunk { offset: start };

        let header = self.data.get(start..start + 8).ok_or(truncated)?;
        let length = read_be32(&header[0..4]) as usize;
        let kind = [header[4], header[5], header[6], header[7]];

        let data_start = start + 8;
        let data_end = data_start
            .checked_add(length)
            .ok_or(PngOptError::TruncatedChunk { offset: start })?;
        let data = self
            .data
            .get(data_start..data_end)
            .ok_or(PngOptError::TruncatedChunk { offset: start })?;
        let crc_bytes = self
            .data
            .get(data_end..data_end + 4)
            .ok_or(PngOptError::TruncatedChunk { offset: start })?;

        self.pos = data_end + 4;
        Ok(Chunk {
            kind,
            data,
            crc: read_be32(crc_bytes),
        })
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = Result<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos == self.data.len() {
            return None;
        }
        match self.read_chunk() {
            Ok(chunk) => {
                if chunk.kind == IEND {
                    self.done = true;
                }
                Some(Ok(chunk))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Append a chunk (length, type, data, CRC) to `output`.
pub fn write_chunk(output: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    output.reserve(12 + data.len());

    let mut crc = Crc32::new();
    crc.update(kind);
    crc.update(data);

    output.extend_from_slice(&(data.len() as u32).to_be_bytes());
    output.extend_from_slice(kind);
    output.extend_from_slice(data);
    output.extend_from_slice(&crc.finalize().to_be_bytes());
}

#[inline]
pub(crate) fn read_be32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

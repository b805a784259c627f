//! PNG chunk framing: `length (u32 BE) | type (4 ASCII) | data | crc (u32 BE)`.

use std::fmt;

use super::crc::Crc32;
use crate::error::ChunkError;

/// Chunk lengths above 2^31 - 1 are invalid.
const MAX_CHUNK_LEN: u32 = 0x7FFF_FFFF;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);

impl ChunkType {
    pub const IHDR: Self = Self(*b"IHDR");
    pub const PLTE: Self = Self(*b"PLTE");
    pub const IDAT: Self = Self(*b"IDAT");
    pub const IEND: Self = Self(*b"IEND");
    pub const TRNS: Self = Self(*b"tRNS");

    /// Critical chunks have an uppercase first letter.
    pub fn is_critical(self) -> bool {
        self.0[0] & 0x20 == 0
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkType({self})")
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Chunk<'a> {
    pub kind: ChunkType,
    pub data: &'a [u8],
}

/// Iterates the chunks after the signature. Stops after the first error.
pub struct ChunkReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    verify_crc: bool,
    failed: bool,
}

impl<'a> ChunkReader<'a> {
    pub fn new(bytes: &'a [u8], verify_crc: bool) -> Self {
        Self {
            bytes,
            pos: 0,
            verify_crc,
            failed: false,
        }
    }

    fn read_u32(&self, at: usize) -> Result<u32, ChunkError> {
        let bytes = self.bytes.get(at..at + 4).ok_or(ChunkError::Truncated)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn next_chunk(&mut self) -> Result<Chunk<'a>, ChunkError> {
        let length = self.read_u32(self.pos)?;
        if length > MAX_CHUNK_LEN {
            return Err(ChunkError::LengthTooLarge(length));
        }
        let length = length as usize;

        let type_start = self.pos + 4;
        let data_start = type_start + 4;
        let crc_start = data_start + length;

        let type_bytes = self
            .bytes
            .get(type_start..data_start)
            .ok_or(ChunkError::Truncated)?;
        let kind = ChunkType([type_bytes[0], type_bytes[1], type_bytes[2], type_bytes[3]]);
        let data = self
            .bytes
            .get(data_start..crc_start)
            .ok_or(ChunkError::Truncated)?;
        let expected = self.read_u32(crc_start)?;

        if self.verify_crc {
            let mut crc = Crc32::new();
            crc.update(&kind.0);
            crc.update(data);
            let actual = crc.finish();
            if actual != expected {
                log::error!("incorrect {kind} checksum: expected {expected:08x}, found {actual:08x}");
                return Err(ChunkError::CrcMismatch {
                    chunk: kind.to_string(),
                    expected,
                    actual,
                });
            }
        }

        self.pos = crc_start + 4;
        Ok(Chunk { kind, data })
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = Result<Chunk<'a>, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.bytes.len() {
            return None;
        }
        let result = self.next_chunk();
        self.failed = result.is_err();
        Some(result)
    }
}

/// Frame `data` as a chunk, computing its CRC.
pub fn write_chunk(out: &mut Vec<u8>, kind: ChunkType, data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(&kind.0);
    out.extend_from_slice(data);
    let mut crc = Crc32::new();
    crc.update(&kind.0);
    crc.update(data);
    out.extend_from_slice(&crc.finish().to_be_bytes());
}

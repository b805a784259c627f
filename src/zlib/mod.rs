//! [zlib](https://www.rfc-editor.org/rfc/rfc1950) decompression.
//!
//! zlib is a thin wrapper around DEFLATE: a two-byte header, the compressed
//! blocks, then an Adler-32 checksum of the uncompressed data.

mod bit_reader;
mod deflate;
mod huffman;

pub use deflate::inflate;

use crate::error::InflateError;

const FLAG_DICT_BIT: u8 = 1 << 5;
const METHOD_DEFLATE: u8 = 8;
const ADLER_MODULUS: u32 = 65_521;
/// Largest block for which the Adler sums cannot overflow a `u32`.
const ADLER_NMAX: usize = 5_552;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InflateOptions {
    pub verify_checksum: bool,
    pub output_limit: usize,
}

impl Default for InflateOptions {
    fn default() -> Self {
        Self {
            verify_checksum: true,
            output_limit: usize::MAX,
        }
    }
}

/// Decompress a zlib stream with default options.
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>, InflateError> {
    decompress_with(bytes, InflateOptions::default())
}

pub fn decompress_with(bytes: &[u8], options: InflateOptions) -> Result<Vec<u8>, InflateError> {
    let [cmf, flg, ..] = *bytes else {
        return Err(InflateError::UnexpectedEof);
    };

    let method = cmf & 0x0F;
    if method != METHOD_DEFLATE {
        log::warn!("unknown zlib compression method {method}");
        return Err(InflateError::UnknownCompressionMethod(method));
    }
    let window_bits = cmf >> 4;
    if window_bits > 7 {
        return Err(InflateError::WindowTooLarge(window_bits));
    }
    let header = u16::from_be_bytes([cmf, flg]);
    if header % 31 != 0 {
        log::warn!("invalid zlib header checksum {header} (must be a multiple of 31)");
        return Err(InflateError::InvalidHeaderChecksum(header));
    }
    if flg & FLAG_DICT_BIT != 0 {
        return Err(InflateError::PresetDictionary);
    }

    let (decompressed, consumed) = inflate(&bytes[2..], options.output_limit)?;

    let trailer = bytes.get(2 + consumed..2 + consumed + 4);
    match (trailer, options.verify_checksum) {
        (Some(trailer), true) => {
            let expected = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
            let actual = adler32(&decompressed);
            if expected != actual {
                log::warn!("zlib checksum mismatch: expected {expected:08x}, found {actual:08x}");
                return Err(InflateError::ChecksumMismatch { expected, actual });
            }
        }
        (None, true) => return Err(InflateError::UnexpectedEof),
        (_, false) => {}
    }

    Ok(decompressed)
}

/// Adler-32 checksum (RFC 1950 §9).
pub fn adler32(data: &[u8]) -> u32 {
    let (mut a, mut b) = (1u32, 0u32);
    for block in data.chunks(ADLER_NMAX) {
        for &byte in block {
            a += byte as u32;
            b += a;
        }
        a %= ADLER_MODULUS;
        b %= ADLER_MODULUS;
    }
    (b << 16) | a
}

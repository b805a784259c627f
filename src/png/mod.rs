//! PNG decoding into 8-bit interleaved pixels.
//!
//! The decoder walks the chunk stream, concatenates the IDAT payload, inflates
//! it, reverses the scanline filters and finally converts every pixel to
//! 8-bit samples with the requested channel count:
//!
//! ```no_run
//! use softraster::png::PngDecoder;
//!
//! let bytes = std::fs::read("texture.png")?;
//! let image = PngDecoder::new().channels(4).decode(&bytes)?;
//! assert_eq!(image.data.len(), image.width() as usize * image.height() as usize * 4);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Palette images are expanded to RGB (RGBA with tRNS), sub-byte depths are
//! unpacked and 16-bit samples keep their high byte. Adam7 interlacing is
//! reported as not implemented.

mod chunk;
mod crc;
mod filter;
mod header;

pub use chunk::{write_chunk, Chunk, ChunkReader, ChunkType};
pub use crc::{crc32, Crc32};
pub use filter::{paeth, unfilter, FilterType};
pub use header::{ColorType, Metadata};

use std::path::Path;

use crate::error::{ChunkError, DecodeError, LoadError};
use crate::zlib::{self, InflateOptions};

pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

pub const DEFAULT_MEMORY_LIMIT: u64 = 256 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ParserStage {
    BeforeIdat,
    DuringIdat,
    AfterIdat,
}

/// A decoded image: `height` rows of `width * metadata.out_channels` bytes,
/// top row first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PngImage {
    pub metadata: Metadata,
    pub data: Vec<u8>,
}

impl PngImage {
    pub fn width(&self) -> u32 {
        self.metadata.width
    }

    pub fn height(&self) -> u32 {
        self.metadata.height
    }

    pub fn channels(&self) -> usize {
        self.metadata.out_channels
    }
}

/// Decoder settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PngDecoder {
    channels: Option<usize>,
    verify_checksums: bool,
    memory_limit: u64,
}

impl Default for PngDecoder {
    fn default() -> Self {
        Self {
            channels: None,
            verify_checksums: true,
            memory_limit: DEFAULT_MEMORY_LIMIT,
        }
    }
}

impl PngDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request 1, 3 or 4 output channels. Without this the decoder keeps the
    /// image's own channel count.
    pub fn channels(mut self, channels: usize) -> Self {
        self.channels = Some(channels);
        self
    }

    /// Toggle chunk CRC and zlib Adler-32 verification.
    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    pub fn memory_limit(mut self, bytes: u64) -> Self {
        self.memory_limit = bytes;
        self
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<PngImage, DecodeError> {
        if bytes.get(..SIGNATURE.len()) != Some(&SIGNATURE[..]) {
            return Err(DecodeError::Header);
        }

        let mut metadata: Option<Metadata> = None;
        let mut palette: Vec<[u8; 4]> = Vec::new();
        let mut transparency: Option<&[u8]> = None;
        let mut compressed: Vec<u8> = Vec::new();
        let mut stage = ParserStage::BeforeIdat;
        let mut seen_iend = false;

        for chunk in ChunkReader::new(&bytes[SIGNATURE.len()..], self.verify_checksums) {
            let chunk = chunk?;
            log::debug!("{} chunk, {} bytes", chunk.kind, chunk.data.len());

            if metadata.is_none() && chunk.kind != ChunkType::IHDR {
                return Err(ChunkError::IhdrNotFirst(chunk.kind.to_string()).into());
            }

            match chunk.kind {
                ChunkType::IHDR => {
                    if metadata.is_some() {
                        return Err(ChunkError::Duplicate(chunk.kind.to_string()).into());
                    }
                    let meta = Metadata::parse(chunk.data)?;
                    if meta.interlaced {
                        return Err(DecodeError::NotImplemented("Adam7 interlacing"));
                    }
                    metadata = Some(meta);
                }
                ChunkType::PLTE => {
                    if !palette.is_empty() {
                        return Err(ChunkError::Duplicate(chunk.kind.to_string()).into());
                    }
                    let len = chunk.data.len();
                    if len == 0 || len % 3 != 0 || len / 3 > 256 {
                        return Err(ChunkError::InvalidPalette(len).into());
                    }
                    palette = chunk
                        .data
                        .chunks_exact(3)
                        .map(|rgb| [rgb[0], rgb[1], rgb[2], u8::MAX])
                        .collect();
                }
                ChunkType::TRNS => transparency = Some(chunk.data),
                ChunkType::IDAT => {
                    match stage {
                        ParserStage::BeforeIdat => stage = ParserStage::DuringIdat,
                        ParserStage::DuringIdat => {}
                        ParserStage::AfterIdat => return Err(ChunkError::NonConsecutiveIdat.into()),
                    }
                    compressed.extend_from_slice(chunk.data);
                    continue;
                }
                ChunkType::IEND => {
                    if !chunk.data.is_empty() {
                        log::warn!("IEND chunk is not empty ({} bytes)", chunk.data.len());
                    }
                    seen_iend = true;
                    break;
                }
                other if other.is_critical() => {
                    return Err(ChunkError::UnknownCritical(other.to_string()).into());
                }
                other => log::debug!("skipping ancillary {other} chunk"),
            }

            if stage == ParserStage::DuringIdat {
                stage = ParserStage::AfterIdat;
            }
        }

        let Some(mut metadata) = metadata else {
            return Err(ChunkError::MissingIend.into());
        };
        if !seen_iend {
            return Err(ChunkError::MissingIend.into());
        }
        if stage == ParserStage::BeforeIdat {
            return Err(ChunkError::MissingIdat.into());
        }

        if metadata.color_type == ColorType::Palette {
            if palette.is_empty() {
                return Err(ChunkError::MissingPalette.into());
            }
            if let Some(alpha) = transparency {
                for (entry, &a) in palette.iter_mut().zip(alpha) {
                    entry[3] = a;
                }
                metadata.in_channels = 4;
            }
        }
        metadata.out_channels = self.channels.unwrap_or(metadata.in_channels);
        check_expansion(metadata.in_channels, metadata.out_channels)?;

        let filtered_len = self.reserve(metadata.filtered_len())?;
        let output_len = self.reserve(metadata.output_len())?;

        let options = InflateOptions {
            verify_checksum: self.verify_checksums,
            output_limit: usize::try_from(self.memory_limit).unwrap_or(usize::MAX),
        };
        let inflated = zlib::decompress_with(&compressed, options)?;
        if inflated.len() < filtered_len {
            return Err(DecodeError::Data {
                expected: filtered_len,
                actual: inflated.len(),
            });
        }
        if inflated.len() > filtered_len {
            log::warn!(
                "ignoring {} bytes of trailing image data",
                inflated.len() - filtered_len
            );
        }

        let row_bytes = metadata.row_bytes();
        let raw = unfilter(
            &inflated,
            metadata.height as usize,
            row_bytes,
            metadata.filter_stride(),
        )?;

        let width = metadata.width as usize;
        let mut data = Vec::with_capacity(output_len);
        let mut unpacked = vec![0u8; width * metadata.in_channels];
        for row in raw.chunks_exact(row_bytes) {
            unpack_row(&metadata, &palette, row, &mut unpacked);
            expand_row(&unpacked, metadata.in_channels, metadata.out_channels, &mut data);
        }

        log::debug!(
            "decoded {}x{} PNG ({:?}, {}-bit) to {} channels",
            metadata.width,
            metadata.height,
            metadata.color_type,
            metadata.bit_depth,
            metadata.out_channels
        );

        Ok(PngImage { metadata, data })
    }

    /// Admit an allocation of `requested` bytes; `None` means the size
    /// overflowed while it was being computed.
    fn reserve(&self, requested: Option<u64>) -> Result<usize, DecodeError> {
        let limit = self.memory_limit;
        requested
            .filter(|&bytes| bytes <= limit)
            .and_then(|bytes| usize::try_from(bytes).ok())
            .ok_or(DecodeError::Memory {
                requested: requested.unwrap_or(u64::MAX),
                limit,
            })
    }
}

/// Decode a PNG held in memory with default settings.
pub fn decode(bytes: &[u8], channels: usize) -> Result<PngImage, DecodeError> {
    PngDecoder::new().channels(channels).decode(bytes)
}

pub fn decode_file(path: impl AsRef<Path>, channels: usize) -> Result<PngImage, LoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|err| LoadError::from_io(path, err))?;
    Ok(decode(&bytes, channels)?)
}

fn check_expansion(from: usize, to: usize) -> Result<(), DecodeError> {
    match (from, to) {
        (a, b) if a == b => Ok(()),
        (3, 4) | (1, 4) | (2, 4) => Ok(()),
        _ => Err(DecodeError::Channel { from, to }),
    }
}

/// Convert one reconstructed scanline into 8-bit samples, resolving palette
/// indices. `out` holds `width * in_channels` bytes.
fn unpack_row(meta: &Metadata, palette: &[[u8; 4]], row: &[u8], out: &mut [u8]) {
    let width = meta.width as usize;
    let depth = meta.bit_depth as usize;

    if meta.color_type == ColorType::Palette {
        let channels = meta.in_channels;
        for x in 0..width {
            let index = sample_at(row, x, depth) as usize;
            let entry = palette.get(index).copied().unwrap_or_else(|| {
                log::warn!("palette index {index} out of range");
                [0, 0, 0, u8::MAX]
            });
            out[x * channels..(x + 1) * channels].copy_from_slice(&entry[..channels]);
        }
        return;
    }

    match depth {
        8 => out.copy_from_slice(&row[..out.len()]),
        16 => {
            for (dst, pair) in out.iter_mut().zip(row.chunks_exact(2)) {
                *dst = pair[0];
            }
        }
        _ => {
            // Sub-byte greyscale: scale 1/2/4-bit values onto 0..=255.
            let scale = (u8::MAX / ((1u16 << depth) - 1) as u8) as u16;
            for (x, dst) in out.iter_mut().enumerate() {
                *dst = (sample_at(row, x, depth) as u16 * scale) as u8;
            }
        }
    }
}

/// The `index`th `depth`-bit sample of a packed row, MSB first.
#[inline]
fn sample_at(row: &[u8], index: usize, depth: usize) -> u8 {
    if depth == 8 {
        return row[index];
    }
    let bit = index * depth;
    let shift = 8 - depth - (bit % 8);
    let mask = ((1u16 << depth) - 1) as u8;
    (row[bit / 8] >> shift) & mask
}

fn expand_row(src: &[u8], from: usize, to: usize, out: &mut Vec<u8>) {
    if from == to {
        out.extend_from_slice(src);
        return;
    }
    for pixel in src.chunks_exact(from) {
        match from {
            1 => out.extend_from_slice(&[pixel[0], pixel[0], pixel[0], u8::MAX]),
            2 => out.extend_from_slice(&[pixel[0], pixel[0], pixel[0], pixel[1]]),
            _ => out.extend_from_slice(&[pixel[0], pixel[1], pixel[2], u8::MAX]),
        }
    }
}

//! [DEFLATE](https://www.rfc-editor.org/rfc/rfc1951) decompression.

use super::bit_reader::BitReader;
use super::huffman::Huffman;
use crate::error::InflateError;

const END_OF_BLOCK: u16 = 256;

const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];
const LENGTH_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];
const DISTANCE_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];
const DISTANCE_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Order in which code-length code lengths are stored in a dynamic block header.
const CODE_LENGTH_ALPHABET: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BlockType {
    Stored,
    FixedHuffman,
    DynamicHuffman,
}

impl TryFrom<u32> for BlockType {
    type Error = InflateError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Stored),
            1 => Ok(Self::FixedHuffman),
            2 => Ok(Self::DynamicHuffman),
            _ => Err(InflateError::ReservedBlockType),
        }
    }
}

fn fixed_trees() -> Result<(Huffman, Huffman), InflateError> {
    let mut lengths = [0u8; 288];
    lengths[..144].fill(8);
    lengths[144..256].fill(9);
    lengths[256..280].fill(7);
    lengths[280..].fill(8);
    Ok((Huffman::new(&lengths)?, Huffman::new(&[5; 30])?))
}

/// Inflate a raw DEFLATE stream.
///
/// Returns `(decompressed, bytes_consumed)`. Fails with `OutputLimit` once the
/// output would grow past `output_limit` bytes.
pub fn inflate(source: &[u8], output_limit: usize) -> Result<(Vec<u8>, usize), InflateError> {
    let mut reader = BitReader::new(source);
    let mut out = Vec::new();
    let mut fixed: Option<(Huffman, Huffman)> = None;

    loop {
        let is_final = reader.read_bit()?;
        let block_type = BlockType::try_from(reader.read_bits(2)?)?;
        log::trace!("deflate block {block_type:?} (final: {is_final})");

        match block_type {
            BlockType::Stored => {
                reader.align_to_byte();
                let len = reader.read_bits(16)? as u16;
                let nlen = reader.read_bits(16)? as u16;
                if len != !nlen {
                    return Err(InflateError::StoredLengthMismatch { len, nlen });
                }
                check_limit(out.len() + len as usize, output_limit)?;
                out.extend_from_slice(reader.read_aligned_bytes(len as usize)?);
            }
            BlockType::FixedHuffman => {
                if fixed.is_none() {
                    fixed = Some(fixed_trees()?);
                }
                if let Some((literals, distances)) = &fixed {
                    inflate_block(&mut reader, literals, distances, &mut out, output_limit)?;
                }
            }
            BlockType::DynamicHuffman => {
                let (literals, distances) = read_dynamic_trees(&mut reader)?;
                inflate_block(&mut reader, &literals, &distances, &mut out, output_limit)?;
            }
        }

        if is_final {
            break;
        }
    }

    Ok((out, reader.bytes_consumed()))
}

#[inline]
fn check_limit(len: usize, limit: usize) -> Result<(), InflateError> {
    if len > limit {
        Err(InflateError::OutputLimit(limit))
    } else {
        Ok(())
    }
}

fn inflate_block(
    reader: &mut BitReader<'_>,
    literals: &Huffman,
    distances: &Huffman,
    out: &mut Vec<u8>,
    output_limit: usize,
) -> Result<(), InflateError> {
    loop {
        let symbol = literals.decode(reader)?;
        match symbol {
            0..=255 => {
                check_limit(out.len() + 1, output_limit)?;
                out.push(symbol as u8);
            }
            END_OF_BLOCK => return Ok(()),
            _ => {
                let index = (symbol - 257) as usize;
                if index >= LENGTH_BASE.len() {
                    return Err(InflateError::InvalidSymbol);
                }
                let length =
                    LENGTH_BASE[index] as usize + reader.read_bits(LENGTH_EXTRA[index] as u32)? as usize;

                let code = distances.decode(reader)? as usize;
                if code >= DISTANCE_BASE.len() {
                    return Err(InflateError::InvalidSymbol);
                }
                let distance =
                    DISTANCE_BASE[code] as usize + reader.read_bits(DISTANCE_EXTRA[code] as u32)? as usize;

                if distance > out.len() {
                    return Err(InflateError::DistanceTooFar {
                        distance,
                        available: out.len(),
                    });
                }
                check_limit(out.len() + length, output_limit)?;

                // Byte by byte: the source range may overlap what we append.
                let start = out.len() - distance;
                for i in 0..length {
                    let byte = out[start + i];
                    out.push(byte);
                }
            }
        }
    }
}

fn read_dynamic_trees(reader: &mut BitReader<'_>) -> Result<(Huffman, Huffman), InflateError> {
    let hlit = reader.read_bits(5)? as usize + 257;
    let hdist = reader.read_bits(5)? as usize + 1;
    let hclen = reader.read_bits(4)? as usize + 4;

    let mut code_length_lengths = [0u8; 19];
    for &index in &CODE_LENGTH_ALPHABET[..hclen] {
        code_length_lengths[index] = reader.read_bits(3)? as u8;
    }
    let code_length_tree = Huffman::new(&code_length_lengths)?;

    let total = hlit + hdist;
    let mut lengths: Vec<u8> = Vec::with_capacity(total);
    while lengths.len() < total {
        let symbol = code_length_tree.decode(reader)?;
        let (value, repeat) = match symbol {
            0..=15 => (symbol as u8, 1),
            16 => {
                let previous = *lengths.last().ok_or(InflateError::RepeatWithoutPrevious)?;
                (previous, reader.read_bits(2)? as usize + 3)
            }
            17 => (0, reader.read_bits(3)? as usize + 3),
            18 => (0, reader.read_bits(7)? as usize + 11),
            _ => return Err(InflateError::InvalidSymbol),
        };
        if lengths.len() + repeat > total {
            return Err(InflateError::CodeLengthOverflow);
        }
        lengths.resize(lengths.len() + repeat, value);
    }

    if lengths[END_OF_BLOCK as usize] == 0 {
        return Err(InflateError::InvalidCodeLengths);
    }

    let literals = Huffman::new(&lengths[..hlit])?;
    let distances = Huffman::new(&lengths[hlit..])?;
    Ok((literals, distances))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_block_abc() {
        let bytes = [0x4b, 0x4c, 0x4a, 0x06, 0x00];
        let (out, consumed) = inflate(&bytes, usize::MAX).unwrap();
        assert_eq!(out, b"abc");
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn stored_block() {
        let bytes = [0x01, 0x03, 0x00, 0xFC, 0xFF, b'x', b'y', b'z'];
        let (out, consumed) = inflate(&bytes, usize::MAX).unwrap();
        assert_eq!(out, b"xyz");
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn stored_length_mismatch() {
        let bytes = [0x01, 0x03, 0x00, 0x00, 0x00];
        assert_eq!(
            inflate(&bytes, usize::MAX),
            Err(InflateError::StoredLengthMismatch { len: 3, nlen: 0 })
        );
    }

    #[test]
    fn reserved_block_type() {
        assert_eq!(inflate(&[0x07], usize::MAX), Err(InflateError::ReservedBlockType));
    }

    #[test]
    fn output_limit_is_enforced() {
        let bytes = [0x01, 0x03, 0x00, 0xFC, 0xFF, b'x', b'y', b'z'];
        assert_eq!(inflate(&bytes, 2), Err(InflateError::OutputLimit(2)));
    }

    #[test]
    fn truncated_stream() {
        assert_eq!(inflate(&[0x4b, 0x4c], usize::MAX), Err(InflateError::UnexpectedEof));
    }
}

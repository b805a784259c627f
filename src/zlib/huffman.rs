use super::bit_reader::BitReader;
use crate::error::InflateError;

pub const MAX_CODE_BITS: usize = 15;

/// Canonical Huffman decoder stored as per-length counts plus symbols in
/// code order; codes are walked one bit at a time.
#[derive(Clone, Debug)]
pub struct Huffman {
    counts: [u16; MAX_CODE_BITS + 1],
    symbols: Vec<u16>,
}

impl Huffman {
    /// Build from per-symbol code lengths (0 = unused).
    ///
    /// Over-subscribed length sets are rejected; incomplete ones are allowed
    /// and fail only if an unassigned code shows up in the stream.
    pub fn new(lengths: &[u8]) -> Result<Self, InflateError> {
        let mut counts = [0u16; MAX_CODE_BITS + 1];
        for &len in lengths {
            if len as usize > MAX_CODE_BITS {
                return Err(InflateError::InvalidCodeLengths);
            }
            counts[len as usize] += 1;
        }
        counts[0] = 0;

        let mut left: i32 = 1;
        for &count in &counts[1..] {
            left = (left << 1) - count as i32;
            if left < 0 {
                return Err(InflateError::InvalidCodeLengths);
            }
        }

        let mut offsets = [0u16; MAX_CODE_BITS + 2];
        for len in 1..=MAX_CODE_BITS {
            offsets[len + 1] = offsets[len] + counts[len];
        }

        let mut symbols = vec![0u16; offsets[MAX_CODE_BITS + 1] as usize];
        for (symbol, &len) in lengths.iter().enumerate() {
            if len != 0 {
                let slot = &mut offsets[len as usize];
                symbols[*slot as usize] = symbol as u16;
                *slot += 1;
            }
        }

        Ok(Self { counts, symbols })
    }

    pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<u16, InflateError> {
        let mut code: i32 = 0;
        let mut first: i32 = 0;
        let mut index: i32 = 0;
        for len in 1..=MAX_CODE_BITS {
            code |= reader.read_bit()? as i32;
            let count = self.counts[len] as i32;
            if code - first < count {
                return Ok(self.symbols[(index + code - first) as usize]);
            }
            index += count;
            first += count;
            first <<= 1;
            code <<= 1;
        }
        Err(InflateError::InvalidSymbol)
    }
}

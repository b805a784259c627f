use crate::error::InflateError;

/// LSB-first bit reader over a byte slice, as DEFLATE packs its bits.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    #[inline]
    pub fn read_bit(&mut self) -> Result<bool, InflateError> {
        let byte = *self
            .data
            .get(self.bit_pos >> 3)
            .ok_or(InflateError::UnexpectedEof)?;
        let bit = (byte >> (self.bit_pos & 7)) & 1;
        self.bit_pos += 1;
        Ok(bit == 1)
    }

    /// Read `n <= 32` bits, first bit in the least significant position.
    #[inline]
    pub fn read_bits(&mut self, n: u32) -> Result<u32, InflateError> {
        debug_assert!(n <= 32);
        if self.bit_pos + n as usize > self.data.len() * 8 {
            return Err(InflateError::UnexpectedEof);
        }
        let mut value = 0u32;
        for i in 0..n {
            let byte = self.data[self.bit_pos >> 3];
            value |= (((byte >> (self.bit_pos & 7)) & 1) as u32) << i;
            self.bit_pos += 1;
        }
        Ok(value)
    }

    /// Skip to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        self.bit_pos = (self.bit_pos + 7) & !7;
    }

    /// Take `len` whole bytes. The reader must be byte aligned.
    pub fn read_aligned_bytes(&mut self, len: usize) -> Result<&'a [u8], InflateError> {
        debug_assert_eq!(self.bit_pos & 7, 0);
        let start = self.bit_pos >> 3;
        let bytes = self
            .data
            .get(start..start + len)
            .ok_or(InflateError::UnexpectedEof)?;
        self.bit_pos += len * 8;
        Ok(bytes)
    }

    /// Bytes touched so far, counting a partially read byte as consumed.
    pub fn bytes_consumed(&self) -> usize {
        (self.bit_pos + 7) >> 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_lsb_first() {
        let mut reader = BitReader::new(&[0b1010_1101, 0xFF]);
        assert!(reader.read_bit().unwrap());
        assert_eq!(reader.read_bits(3).unwrap(), 0b110);
        assert_eq!(reader.read_bits(8).unwrap(), 0b1111_1010);
        assert_eq!(reader.bytes_consumed(), 2);
    }

    #[test]
    fn align_then_read_bytes() {
        let mut reader = BitReader::new(&[0x01, 0xAA, 0xBB]);
        reader.read_bits(3).unwrap();
        reader.align_to_byte();
        assert_eq!(reader.read_aligned_bytes(2).unwrap(), &[0xAA, 0xBB]);
        assert_eq!(reader.read_bit(), Err(InflateError::UnexpectedEof));
    }
}

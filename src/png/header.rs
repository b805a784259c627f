use crate::error::ChunkError;

const IHDR_LEN: usize = 13;
/// Dimensions are limited to 2^31 - 1.
const MAX_DIMENSION: u32 = 0x7FFF_FFFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorType {
    Grey = 0,
    Rgb = 2,
    Palette = 3,
    GreyAlpha = 4,
    Rgba = 6,
}

impl ColorType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Grey),
            2 => Some(Self::Rgb),
            3 => Some(Self::Palette),
            4 => Some(Self::GreyAlpha),
            6 => Some(Self::Rgba),
            _ => None,
        }
    }

    /// Channels after palette expansion (tRNS not counted).
    pub fn channels(self) -> usize {
        let bits = self as u8;
        let colour = if bits & 2 != 0 { 3 } else { 1 };
        let alpha = if bits & 4 != 0 { 1 } else { 0 };
        colour + alpha
    }

    /// Samples stored per pixel in the filtered stream.
    pub fn samples_per_pixel(self) -> usize {
        match self {
            Self::Palette => 1,
            other => other.channels(),
        }
    }

    pub fn allows_bit_depth(self, depth: u8) -> bool {
        match self {
            Self::Grey => matches!(depth, 1 | 2 | 4 | 8 | 16),
            Self::Palette => matches!(depth, 1 | 2 | 4 | 8),
            Self::Rgb | Self::GreyAlpha | Self::Rgba => matches!(depth, 8 | 16),
        }
    }
}

/// Decoded IHDR plus the channel counts the decoder settled on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Metadata {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub compression_method: u8,
    pub filter_method: u8,
    pub interlaced: bool,
    /// 8-bit channels per pixel after unpacking (palette expanded).
    pub in_channels: usize,
    pub out_channels: usize,
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

impl Metadata {
    pub fn parse(data: &[u8]) -> Result<Self, ChunkError> {
        if data.len() != IHDR_LEN {
            return Err(ChunkError::IhdrLength(data.len()));
        }

        let width = be_u32(&data[0..4]);
        let height = be_u32(&data[4..8]);
        for (field, value) in [("width", width), ("height", height)] {
            if value == 0 || value > MAX_DIMENSION {
                return Err(ChunkError::InvalidHeaderField { field, value });
            }
        }

        let bit_depth = data[8];
        let color_type = ColorType::from_u8(data[9]).ok_or(ChunkError::InvalidHeaderField {
            field: "color type",
            value: data[9] as u32,
        })?;
        if !color_type.allows_bit_depth(bit_depth) {
            return Err(ChunkError::DisallowedBitDepth {
                bit_depth,
                color_type: color_type as u8,
            });
        }

        let compression_method = data[10];
        if compression_method != 0 {
            return Err(ChunkError::InvalidHeaderField {
                field: "compression method",
                value: compression_method as u32,
            });
        }
        let filter_method = data[11];
        if filter_method != 0 {
            return Err(ChunkError::InvalidHeaderField {
                field: "filter method",
                value: filter_method as u32,
            });
        }
        let interlaced = match data[12] {
            0 => false,
            1 => true,
            other => {
                return Err(ChunkError::InvalidHeaderField {
                    field: "interlace method",
                    value: other as u32,
                })
            }
        };

        let in_channels = color_type.channels();
        Ok(Self {
            width,
            height,
            bit_depth,
            color_type,
            compression_method,
            filter_method,
            interlaced,
            in_channels,
            out_channels: in_channels,
        })
    }

    /// Bytes per scanline, excluding the filter-type byte. At most 2^34, so
    /// it never overflows `u64`.
    fn row_bytes_u64(&self) -> u64 {
        let bits = self.width as u64 * self.bit_depth as u64 * self.color_type.samples_per_pixel() as u64;
        bits.div_ceil(8)
    }

    /// Bytes per scanline as a buffer length. Only meaningful once
    /// [`filtered_len`](Self::filtered_len) has been checked against a limit.
    pub fn row_bytes(&self) -> usize {
        self.row_bytes_u64() as usize
    }

    /// Distance to the "left" byte used by the Sub, Average and Paeth filters.
    pub fn filter_stride(&self) -> usize {
        (self.bit_depth as usize / 8).max(1) * self.color_type.samples_per_pixel()
    }

    /// Size of the inflated IDAT stream: one filter byte plus the scanline per
    /// row. `None` when it does not fit in a `u64`.
    pub fn filtered_len(&self) -> Option<u64> {
        (self.row_bytes_u64() + 1).checked_mul(self.height as u64)
    }

    /// Size of the decoded pixels at `out_channels` bytes per pixel.
    pub fn output_len(&self) -> Option<u64> {
        (self.width as u64)
            .checked_mul(self.height as u64)?
            .checked_mul(self.out_channels as u64)
    }
}

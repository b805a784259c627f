//! Scanline filter reversal (PNG §9).

use crate::error::DecodeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterType {
    None,
    Sub,
    Up,
    Average,
    Paeth,
}

impl FilterType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Sub),
            2 => Some(Self::Up),
            3 => Some(Self::Average),
            4 => Some(Self::Paeth),
            _ => None,
        }
    }
}

#[inline]
pub fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let (ia, ib, ic) = (a as i16, b as i16, c as i16);
    let p = ia + ib - ic;
    let pa = (p - ia).abs();
    let pb = (p - ib).abs();
    let pc = (p - ic).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Reverse one scanline in place. `prev` is the reconstructed row above, all
/// zeros for the first row, where Up degenerates to None, Average to a halved
/// left neighbour and Paeth to Sub.
fn unfilter_row(filter: FilterType, row: &mut [u8], prev: &[u8], stride: usize) {
    match filter {
        FilterType::None => {}
        FilterType::Sub => {
            for i in stride..row.len() {
                row[i] = row[i].wrapping_add(row[i - stride]);
            }
        }
        FilterType::Up => {
            for (byte, &above) in row.iter_mut().zip(prev) {
                *byte = byte.wrapping_add(above);
            }
        }
        FilterType::Average => {
            for i in 0..row.len() {
                let left = if i >= stride { row[i - stride] as u16 } else { 0 };
                let above = prev[i] as u16;
                row[i] = row[i].wrapping_add(((left + above) / 2) as u8);
            }
        }
        FilterType::Paeth => {
            for i in 0..row.len() {
                let (left, upper_left) = if i >= stride {
                    (row[i - stride], prev[i - stride])
                } else {
                    (0, 0)
                };
                row[i] = row[i].wrapping_add(paeth(left, prev[i], upper_left));
            }
        }
    }
}

/// Strip filter bytes from `filtered` and return `height * row_bytes`
/// reconstructed bytes.
pub fn unfilter(
    filtered: &[u8],
    height: usize,
    row_bytes: usize,
    stride: usize,
) -> Result<Vec<u8>, DecodeError> {
    let expected = height * (row_bytes + 1);
    if filtered.len() < expected {
        return Err(DecodeError::Data {
            expected,
            actual: filtered.len(),
        });
    }

    let mut out = vec![0u8; height * row_bytes];
    let zero_row = vec![0u8; row_bytes];

    for (y, line) in filtered.chunks_exact(row_bytes + 1).take(height).enumerate() {
        let filter = FilterType::from_u8(line[0]).ok_or(DecodeError::Filter {
            filter: line[0],
            row: y,
        })?;

        let (done, rest) = out.split_at_mut(y * row_bytes);
        let row = &mut rest[..row_bytes];
        row.copy_from_slice(&line[1..]);
        let prev = if y == 0 {
            &zero_row[..]
        } else {
            &done[(y - 1) * row_bytes..]
        };
        unfilter_row(filter, row, prev, stride);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paeth_predictor() {
        assert_eq!(paeth(10, 20, 10), 20);
        assert_eq!(paeth(20, 10, 10), 20);
        assert_eq!(paeth(10, 10, 10), 10);
        assert_eq!(paeth(0, 0, 0), 0);
        assert_eq!(paeth(255, 0, 255), 0);
    }

    #[test]
    fn sub_and_up() {
        // 2 rows of 3 one-byte pixels.
        let filtered = [1, 10, 5, 5, 2, 1, 1, 1];
        let out = unfilter(&filtered, 2, 3, 1).unwrap();
        assert_eq!(out, [10, 15, 20, 11, 16, 21]);
    }

    #[test]
    fn first_row_average_and_paeth() {
        let avg = unfilter(&[3, 10, 10, 10], 1, 3, 1).unwrap();
        assert_eq!(avg, [10, 15, 17]);

        let paeth_row = unfilter(&[4, 10, 5, 5], 1, 3, 1).unwrap();
        let sub_row = unfilter(&[1, 10, 5, 5], 1, 3, 1).unwrap();
        assert_eq!(paeth_row, sub_row);
    }

    #[test]
    fn paeth_rgba_row_round_trips() {
        let raw: [u8; 12] = [200, 10, 30, 255, 190, 40, 35, 255, 5, 250, 128, 0];
        let mut filtered = vec![FilterType::Paeth as u8];
        for i in 0..raw.len() {
            let left = if i >= 4 { raw[i - 4] } else { 0 };
            filtered.push(raw[i].wrapping_sub(paeth(left, 0, 0)));
        }
        assert_eq!(unfilter(&filtered, 1, 12, 4).unwrap(), raw);
    }

    #[test]
    fn average_uses_both_neighbours() {
        let filtered = [0, 100, 200, 3, 0, 0];
        let out = unfilter(&filtered, 2, 2, 1).unwrap();
        // (0 + 100) / 2 = 50; (50 + 200) / 2 = 125.
        assert_eq!(out, [100, 200, 50, 125]);
    }

    #[test]
    fn bad_filter_byte() {
        assert_eq!(
            unfilter(&[0, 1, 7, 1], 2, 1, 1),
            Err(DecodeError::Filter { filter: 7, row: 1 })
        );
    }

    #[test]
    fn short_input() {
        assert_eq!(
            unfilter(&[0, 1, 0], 2, 1, 1),
            Err(DecodeError::Data {
                expected: 4,
                actual: 3
            })
        );
    }
}

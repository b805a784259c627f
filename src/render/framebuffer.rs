//! Owned 2D pixel buffers for colour and depth.
//!
//! Both buffers share one generic type so pixel addressing, resizing and
//! clearing are written once. Row 0 is the bottom scanline; the host flips
//! when it blits.

use crate::colors::Color;

/// Channel order of the bytes handed to the host blitter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    #[default]
    Rgba,
    Bgra,
}

/// A `width × height` grid of `T`, stored row-major.
#[derive(Clone, Debug)]
pub struct FrameBuffer<T: Copy> {
    data: Vec<T>,
    width: u32,
    height: u32,
    byte_order: ByteOrder,
}

pub type ColorBuffer = FrameBuffer<Color>;

/// Depth per pixel; smaller is closer. Cleared to `+∞`.
pub type DepthBuffer = FrameBuffer<f32>;

impl<T: Copy> FrameBuffer<T> {
    pub fn new(width: u32, height: u32, fill: T) -> Self {
        Self {
            data: vec![fill; width as usize * height as usize],
            width,
            height,
            byte_order: ByteOrder::Rgba,
        }
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Reallocate for a new size. Existing contents are discarded.
    pub fn resize(&mut self, width: u32, height: u32, fill: T) {
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize(width as usize * height as usize, fill);
    }

    #[inline]
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && (x as u32) < self.width && y >= 0 && (y as u32) < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Value at `(x, y)`, or `None` when out of bounds.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<T> {
        self.index(x, y).map(|i| self.data[i])
    }

    /// Write `(x, y)`. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, value: T) {
        if let Some(i) = self.index(x, y) {
            self.data[i] = value;
        }
    }

    /// Bytes per pixel.
    pub fn channels(&self) -> usize {
        std::mem::size_of::<T>()
    }

    /// `width · height · channels`.
    pub fn size_in_bytes(&self) -> usize {
        self.data.len() * self.channels()
    }

    pub fn pixels(&self) -> &[T] {
        &self.data
    }

    /// One scanline, bottom row first.
    pub fn row(&self, y: u32) -> &[T] {
        let start = y as usize * self.width as usize;
        &self.data[start..start + self.width as usize]
    }
}

impl ColorBuffer {
    /// Raw RGBA bytes in memory order, ignoring `byte_order`.
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: `Color` is `#[repr(C)]` with four `u8` fields and no padding.
        unsafe {
            std::slice::from_raw_parts(self.data.as_ptr() as *const u8, self.size_in_bytes())
        }
    }

    /// Copy the pixels into `out` in this buffer's byte order.
    ///
    /// `out` is resized to `size_in_bytes()`.
    pub fn write_bytes(&self, out: &mut Vec<u8>) {
        out.clear();
        match self.byte_order {
            ByteOrder::Rgba => out.extend_from_slice(self.as_bytes()),
            ByteOrder::Bgra => {
                out.reserve(self.size_in_bytes());
                for c in &self.data {
                    out.extend_from_slice(&c.swap_red_blue().to_array());
                }
            }
        }
    }
}

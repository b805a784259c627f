//! Decoded textures and the arena that owns them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::info;

use crate::colors::Color;
use crate::error::LoadError;
use crate::png::{PngDecoder, PngImage};
use crate::render::framebuffer::ByteOrder;

/// Stable handle into a [`TextureRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// A 2D texture for texture mapping. Rows are stored top-down.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    channels: usize,
    byte_order: ByteOrder,
    data: Vec<u8>,
}

impl Texture {
    /// Wrap raw interleaved 8-bit samples. Returns `None` when `data` does
    /// not hold `width * height * channels` bytes or the texture is empty.
    pub fn from_raw(width: u32, height: u32, channels: usize, data: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * channels;
        if expected == 0 || !(1..=4).contains(&channels) || data.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            channels,
            byte_order: ByteOrder::Rgba,
            data,
        })
    }

    pub fn from_png(image: PngImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            channels: image.channels(),
            byte_order: ByteOrder::Rgba,
            data: image.data,
        }
    }

    pub fn from_image(image: &image::DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            channels: 4,
            byte_order: ByteOrder::Rgba,
            data: rgba.into_raw(),
        }
    }

    /// A 1×1 texture of a single colour.
    pub fn solid(color: Color) -> Self {
        Self {
            width: 1,
            height: 1,
            channels: 4,
            byte_order: ByteOrder::Rgba,
            data: color.to_array().to_vec(),
        }
    }

    /// Reorder the stored samples, swapping red and blue if the order changes.
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        if byte_order != self.byte_order && self.channels >= 3 {
            for pixel in self.data.chunks_exact_mut(self.channels) {
                pixel.swap(0, 2);
            }
        }
        self.byte_order = byte_order;
        self
    }

    /// Sample the texture at UV coordinates using nearest-neighbour filtering.
    ///
    /// UVs wrap (`rem_euclid`), and V is flipped because OBJ texture
    /// coordinates have a bottom-left origin while rows are stored top-down.
    #[inline]
    pub fn sample(&self, u: f32, v: f32) -> Color {
        let u = u.rem_euclid(1.0);
        let v = (1.0 - v).rem_euclid(1.0);

        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);
        self.texel(x, y)
    }

    /// Texel at `(x, y)`, top-left origin. Coordinates must be in range.
    #[inline]
    pub fn texel(&self, x: u32, y: u32) -> Color {
        let start = (y as usize * self.width as usize + x as usize) * self.channels;
        let p = &self.data[start..start + self.channels];
        let color = match *p {
            [grey] => Color::rgb(grey, grey, grey),
            [grey, alpha] => Color::new(grey, grey, grey, alpha),
            [r, g, b] => Color::rgb(r, g, b),
            [r, g, b, a, ..] => Color::new(r, g, b, a),
            [] => Color::default(),
        };
        match self.byte_order {
            ByteOrder::Rgba => color,
            ByteOrder::Bgra => color.swap_red_blue(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Owns every loaded texture. Loading the same path twice returns the
/// existing id.
#[derive(Debug, Default)]
pub struct TextureRegistry {
    textures: Vec<Texture>,
    by_path: HashMap<PathBuf, TextureId>,
    decoder: PngDecoder,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `decoder` (limits, checksum policy) for PNG files. The channel
    /// count is always forced to 4.
    pub fn with_decoder(decoder: PngDecoder) -> Self {
        Self {
            decoder,
            ..Self::default()
        }
    }

    /// Decode `path` and store the result. PNG files use this crate's decoder;
    /// other formats go through `image`.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<TextureId, LoadError> {
        let path = path.as_ref();
        if let Some(&id) = self.by_path.get(path) {
            return Ok(id);
        }

        let bytes = std::fs::read(path).map_err(|err| LoadError::from_io(path, err))?;
        let is_png = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        let texture = if is_png {
            Texture::from_png(self.decoder.channels(4).decode(&bytes)?)
        } else {
            Texture::from_image(&image::load_from_memory(&bytes)?)
        };

        info!(
            "loaded texture {} ({}x{}, {} channels)",
            path.display(),
            texture.width(),
            texture.height(),
            texture.channels()
        );
        let id = self.insert(texture);
        self.by_path.insert(path.to_path_buf(), id);
        Ok(id)
    }

    pub fn insert(&mut self, texture: Texture) -> TextureId {
        let id = TextureId(self.textures.len());
        self.textures.push(texture);
        id
    }

    pub fn get(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

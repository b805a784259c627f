//! 8-bit RGBA colours and the renderer's palette.

/// One framebuffer / texel colour, stored R, G, B, A in memory.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

pub const BLACK: Color = Color::rgb(0, 0, 0);
pub const WHITE: Color = Color::rgb(255, 255, 255);
pub const RED: Color = Color::rgb(255, 0, 0);
pub const GREEN: Color = Color::rgb(0, 255, 0);
pub const BLUE: Color = Color::rgb(0, 0, 255);

pub const BACKGROUND: Color = Color::rgb(24, 24, 28);
pub const GRID: Color = Color::rgb(70, 70, 78);
pub const WIREFRAME: Color = Color::rgb(230, 230, 230);
pub const NORMAL: Color = Color::rgb(255, 210, 0);
pub const VERTEX_NORMAL: Color = Color::rgb(0, 200, 255);
/// Surface colour used when a mesh has no usable texture.
pub const FILL: Color = Color::rgb(200, 200, 200);

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Build from `[0, 1]` floats, clamping out-of-range channels.
    pub fn from_f32(r: f32, g: f32, b: f32, a: f32) -> Self {
        #[inline]
        fn channel(v: f32) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        Self::new(channel(r), channel(g), channel(b), channel(a))
    }

    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }

    /// Scale RGB by `intensity`, keeping alpha.
    #[inline]
    pub fn modulate(self, intensity: f32) -> Self {
        let [r, g, b, a] = self.to_f32();
        Self::from_f32(r * intensity, g * intensity, b * intensity, a)
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        let [r0, g0, b0, a0] = self.to_f32();
        let [r1, g1, b1, a1] = other.to_f32();
        Self::from_f32(
            r0 + (r1 - r0) * t,
            g0 + (g1 - g0) * t,
            b0 + (b1 - b0) * t,
            a0 + (a1 - a0) * t,
        )
    }

    /// Exchange the red and blue channels.
    #[inline]
    pub fn swap_red_blue(self) -> Self {
        Self::new(self.b, self.g, self.r, self.a)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Color {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

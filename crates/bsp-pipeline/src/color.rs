//! 8-bit RGB colors used for base and lit face colors.

/// An RGB triple with one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// A gray with all three channels set to `v`.
    #[inline]
    pub const fn gray(v: u8) -> Self {
        Self::new(v, v, v)
    }

    /// Channels widened for integer accumulation.
    #[inline]
    pub fn channels(self) -> [u32; 3] {
        [self.r as u32, self.g as u32, self.b as u32]
    }

    /// Builds a color from accumulated channel sums, clamping each to 255.
    pub fn from_sums(sums: [u32; 3]) -> Self {
        let [r, g, b] = sums.map(|c| c.min(255) as u8);
        Self { r, g, b }
    }

    /// Linear blend from `self` (t = 0) to `other` (t = 1), rounded.
    pub fn lerp(self, other: Rgb, t: f32) -> Self {
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8;
        Self::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    /// Packs the color as `0xAARRGGBB` with full alpha.
    #[inline]
    pub fn to_argb(self) -> u32 {
        0xFF00_0000 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

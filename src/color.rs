//! 16-bit VRAM pixel: 5-5-5 color plus a semi-transparency flag.
//!
//! Layout (LSB first): R in bits 0-4, G in bits 5-9, B in bits 10-14,
//! semi-transparency in bit 15. The same word is used for direct-color texels,
//! palette (CLUT) entries, and the packed index words of 4/8-bit textures.

/// Maximum value of a 5-bit channel
pub const CHANNEL_MAX: u16 = 0b11111;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VramPixel {
    r: u8,
    g: u8,
    b: u8,
    semi_transparent: bool,
}

impl VramPixel {
    /// Build from 5-bit channels; values above 31 are masked.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, semi_transparent: bool) -> Self {
        Self {
            r: r & CHANNEL_MAX as u8,
            g: g & CHANNEL_MAX as u8,
            b: b & CHANNEL_MAX as u8,
            semi_transparent,
        }
    }

    /// Convert a normalized float color (0.0-1.0 per channel).
    /// Out-of-range values are clamped before rounding to 5 bits.
    #[inline]
    pub fn from_rgb_f32(rgb: [f32; 3]) -> Self {
        Self::new(to_5bit(rgb[0]), to_5bit(rgb[1]), to_5bit(rgb[2]), false)
    }

    #[inline]
    pub fn r(&self) -> u8 {
        self.r
    }

    #[inline]
    pub fn g(&self) -> u8 {
        self.g
    }

    #[inline]
    pub fn b(&self) -> u8 {
        self.b
    }

    #[inline]
    pub fn semi_transparent(&self) -> bool {
        self.semi_transparent
    }

    #[inline]
    pub fn pack(&self) -> u16 {
        ((self.semi_transparent as u16) << 15)
            | ((self.b as u16) << 10)
            | ((self.g as u16) << 5)
            | self.r as u16
    }

    #[inline]
    pub fn unpack(word: u16) -> Self {
        Self {
            r: (word & CHANNEL_MAX) as u8,
            g: ((word >> 5) & CHANNEL_MAX) as u8,
            b: ((word >> 10) & CHANNEL_MAX) as u8,
            semi_transparent: word & (1 << 15) != 0,
        }
    }

    /// 8-bit RGB for previews (5-bit values bit-replicated).
    #[inline]
    pub fn to_rgb8(&self) -> [u8; 3] {
        [expand_5bit(self.r), expand_5bit(self.g), expand_5bit(self.b)]
    }
}

#[inline]
fn to_5bit(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * CHANNEL_MAX as f32).round() as u8
}

/// Extend a 5-bit value to 8 bits by repeating the bit pattern.
#[inline]
fn expand_5bit(v: u8) -> u8 {
    (v << 3) | (v >> 2)
}
